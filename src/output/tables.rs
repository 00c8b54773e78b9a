use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{Cell, CellAlignment, Color as TableColor, ContentArrangement, Table};

/// Table and cell creation helpers
pub fn create_table() -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn cyan_header(labels: &[&str]) -> Vec<Cell> {
    labels
        .iter()
        .map(|label| Cell::new(*label).fg(TableColor::Cyan))
        .collect()
}

pub fn count_cell(count: usize) -> Cell {
    Cell::new(count).set_alignment(CellAlignment::Right)
}

/// Green above 80%, yellow from 50%, red below.
pub fn color_coded_ftpr_cell(rate: f64) -> Cell {
    let cell = Cell::new(format!("{rate:.2}%")).set_alignment(CellAlignment::Right);
    if rate > 80.0 {
        cell.fg(TableColor::Green)
    } else if rate >= 50.0 {
        cell.fg(TableColor::Yellow)
    } else {
        cell.fg(TableColor::Red)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ftpr_cell_thresholds() {
        assert_eq!(color_coded_ftpr_cell(80.01).content(), "80.01%");
        assert_eq!(color_coded_ftpr_cell(50.0).content(), "50.00%");
        assert_eq!(color_coded_ftpr_cell(0.0).content(), "0.00%");
    }
}
