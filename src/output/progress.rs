use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};

use crate::events::{EventSink, LogSink, ScanEvent};

use super::styling::{bright_green, bright_red, bright_yellow};

/// Shows one stderr progress line per repository while forwarding every
/// event to [`LogSink`].
pub struct ProgressSink {
    current: Mutex<Option<ProgressBar>>,
    hidden: bool,
    log: LogSink,
}

impl ProgressSink {
    pub fn new() -> Self {
        Self {
            current: Mutex::new(None),
            hidden: false,
            log: LogSink,
        }
    }

    /// Tracks progress without drawing anything.
    pub fn hidden() -> Self {
        Self {
            hidden: true,
            ..Self::new()
        }
    }

    fn draw_target(&self) -> ProgressDrawTarget {
        if self.hidden {
            ProgressDrawTarget::hidden()
        } else {
            ProgressDrawTarget::stderr()
        }
    }

    fn with_current(&self, f: impl FnOnce(&ProgressBar)) {
        if let Ok(current) = self.current.lock() {
            if let Some(pb) = current.as_ref() {
                f(pb);
            }
        }
    }

    fn take_current(&self) -> Option<ProgressBar> {
        self.current.lock().ok().and_then(|mut current| current.take())
    }

    #[cfg(test)]
    fn position(&self) -> Option<(u64, Option<u64>)> {
        let current = self.current.lock().ok()?;
        current.as_ref().map(|pb| (pb.position(), pb.length()))
    }
}

impl Default for ProgressSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for ProgressSink {
    fn record(&self, event: &ScanEvent<'_>) {
        self.log.record(event);

        match event {
            ScanEvent::RepositoryStarted { platform, repo } => {
                let pb = create_spinner(
                    self.draw_target(),
                    bright_yellow(format!("{platform} {repo}")).to_string(),
                );
                if let Some(previous) = self
                    .current
                    .lock()
                    .ok()
                    .and_then(|mut current| current.replace(pb))
                {
                    previous.finish_and_clear();
                }
            }
            ScanEvent::RequestsListed { count, .. } => self.with_current(|pb| {
                pb.set_length(*count as u64);
                pb.set_style(progress_style("  {msg} [{pos}/{len}] {spinner}"));
            }),
            ScanEvent::RequestSkipped { .. } | ScanEvent::RequestEvaluated { .. } => {
                self.with_current(|pb| pb.inc(1));
            }
            ScanEvent::RepositoryFinished { result } => {
                if let Some(pb) = self.take_current() {
                    pb.finish_with_message(
                        bright_green(format!(
                            "{} {}: FTPR {:.2}% ✓",
                            result.platform, result.repo_name, result.ftpr
                        ))
                        .to_string(),
                    );
                }
            }
            ScanEvent::RepositoryFailed { repo, .. } => {
                if let Some(pb) = self.take_current() {
                    pb.abandon_with_message(bright_red(format!("{repo}: failed ✗")).to_string());
                }
            }
        }
    }
}

fn progress_style(template: &str) -> ProgressStyle {
    ProgressStyle::with_template(template).unwrap_or_else(|_| ProgressStyle::default_spinner())
}

fn create_spinner(target: ProgressDrawTarget, message: String) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    pb.set_draw_target(target);
    pb.set_style(progress_style("  {msg} {spinner}"));
    pb.set_message(message);
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}
