use serde::{Deserialize, Serialize};

/// First-time pass rate figures for one repository.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepoResult {
    pub repo_name: String,
    pub platform: String,
    pub total_merged: usize,
    pub first_time_passes: usize,
    pub first_time_failures: usize,
    /// Percentage in `[0, 100]`, rounded to two decimals
    pub ftpr: f64,
}

impl RepoResult {
    pub fn from_tally(repo_name: &str, platform: &str, tally: &Tally) -> Self {
        Self {
            repo_name: repo_name.to_string(),
            platform: platform.to_string(),
            total_merged: tally.total,
            first_time_passes: tally.passes,
            first_time_failures: tally.failures,
            ftpr: calculate_ftpr(tally.passes, tally.total),
        }
    }
}

/// Running pass/fail counters while a repository is scanned.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub total: usize,
    pub passes: usize,
    pub failures: usize,
}

impl Tally {
    pub fn record(&mut self, outcome: RequestOutcome) {
        self.total += 1;
        match outcome {
            RequestOutcome::Pass => self.passes += 1,
            RequestOutcome::Fail => self.failures += 1,
            RequestOutcome::Skipped => {}
        }
    }
}

/// How a single merged request contributes to the tally.
///
/// `Skipped` still counts toward the merged total but neither passes nor fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestOutcome {
    Pass,
    Fail,
    Skipped,
}

/// `round(100 * passes / total, 2)` with ties to even, or 0 when nothing was merged.
#[allow(clippy::cast_precision_loss)]
pub fn calculate_ftpr(passes: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    let rate = passes as f64 / total as f64 * 100.0;
    (rate * 100.0).round_ties_even() / 100.0
}
