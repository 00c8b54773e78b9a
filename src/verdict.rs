use serde::{Deserialize, Serialize};

/// Marker stored in [`Verdict::error`] when a commit had no CI results at all.
pub const NO_CHECKS_FOUND: &str = "No checks found";

/// Status string that counts as a passing check on both platforms.
const SUCCESS: &str = "success";

/// A single CI execution unit (GitHub check-run or GitLab job) for one commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckOutcome {
    pub name: String,
    /// Platform-native conclusion (GitHub) or status (GitLab)
    pub status: String,
}

impl CheckOutcome {
    pub fn new(name: impl Into<String>, status: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status: status.into(),
        }
    }

    pub fn passed(&self) -> bool {
        self.status == SUCCESS
    }
}

/// Overall CI verdict for the initial commit of a merge request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verdict {
    pub all_passed: bool,
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub checks: Vec<CheckOutcome>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Verdict {
    /// Verdict for a commit without any CI results.
    pub fn no_checks() -> Self {
        reduce(Vec::new())
    }

    /// Failing verdict for a commit whose CI run could not be located at all.
    pub fn unresolved(reason: impl Into<String>) -> Self {
        Self {
            error: Some(reason.into()),
            ..Self::no_checks()
        }
    }

    /// Whether the verdict failed because nothing ran, as opposed to a failing check.
    pub fn is_missing_checks(&self) -> bool {
        self.error.as_deref() == Some(NO_CHECKS_FOUND)
    }

    pub fn check_names(&self) -> Vec<&str> {
        self.checks.iter().map(|c| c.name.as_str()).collect()
    }
}

/// Reduces per-check outcomes to a single verdict.
///
/// Every check must report `success`; anything else (failure, canceled,
/// skipped, neutral...) counts as failed. An empty set never passes.
pub fn reduce(checks: Vec<CheckOutcome>) -> Verdict {
    let total = checks.len();
    let passed = checks.iter().filter(|c| c.passed()).count();
    let failed = total - passed;

    Verdict {
        all_passed: total > 0 && failed == 0,
        total,
        passed,
        failed,
        error: (total == 0).then(|| NO_CHECKS_FOUND.to_string()),
        checks,
    }
}
