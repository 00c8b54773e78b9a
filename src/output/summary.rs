use std::fmt::Write;

use comfy_table::Cell;

use crate::insights::RepoResult;

use super::styling::{bright, bright_yellow, cyan, dim};
use super::tables::{color_coded_ftpr_cell, count_cell, create_table, cyan_header};

/// Renders the first-time pass rate table.
///
/// One row per scanned repository, in scan order. The FTPR column is
/// color-coded: green above 80%, yellow from 50%, red below.
pub fn render_summary(results: &[RepoResult]) -> String {
    let mut output = String::new();

    let _ = writeln!(
        output,
        "{} {}",
        bright("📊"),
        bright("First-Time Pass Rate").underlined()
    );

    if results.is_empty() {
        let _ = writeln!(output, "{}", bright_yellow("No results to display."));
        return output;
    }

    let mut table = create_table();
    table.set_header(cyan_header(&[
        "Repo Name",
        "Platform",
        "Merged",
        "FT Pass",
        "FT Fail",
        "FTPR %",
    ]));

    for result in results {
        table.add_row(vec![
            Cell::new(&result.repo_name),
            Cell::new(&result.platform),
            count_cell(result.total_merged),
            count_cell(result.first_time_passes),
            count_cell(result.first_time_failures),
            color_coded_ftpr_cell(result.ftpr),
        ]);
    }

    let _ = writeln!(output, "{table}\n");

    let _ = writeln!(
        output,
        "  {} {}\n  {} {}\n  {} {}",
        cyan("FTPR"),
        dim("= first-time passes / merged requests × 100"),
        cyan("FT Pass"),
        dim("= merged requests whose initial commit passed every CI check"),
        cyan("FT Fail"),
        dim("= merged requests whose initial commit failed a check or had none"),
    );

    output
}
