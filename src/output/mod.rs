mod exports;
mod progress;
mod styling;
mod summary;
mod tables;

pub use exports::export_results;
pub use progress::ProgressSink;
pub use styling::{dim, magenta_bold};
pub use summary::render_summary;

/// Prints the `ftpr` banner to stderr.
pub fn print_banner() {
    eprintln!(
        r"
{} {}
  {}
",
        magenta_bold("✅ ftpr"),
        dim(env!("CARGO_PKG_VERSION")),
        dim("First-Time Pass Rate for merged pull/merge requests")
    );
}
