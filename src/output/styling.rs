use console::{style, StyledObject};

/// Styling helpers for terminal output
pub fn bright(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright()
}

pub fn bright_green(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().green()
}

pub fn bright_red(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().red()
}

pub fn bright_yellow(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).bright().yellow()
}

pub fn cyan(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).cyan()
}

pub fn dim(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).dim()
}

pub fn magenta_bold(text: impl std::fmt::Display) -> StyledObject<String> {
    style(text.to_string()).magenta().bold()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_styles_keep_text() {
        let styled = [
            bright("ftpr"),
            bright_green("ftpr"),
            bright_red("ftpr"),
            bright_yellow("ftpr"),
            cyan("ftpr"),
            dim("ftpr"),
            magenta_bold("ftpr"),
        ];

        for text in styled {
            assert_eq!(console::strip_ansi_codes(&text.to_string()), "ftpr");
        }
    }
}
