use super::display::{DisplayConfig, OutputMode};
use colored::Colorize;

/// `insight[3]> `, with the output mode shown when it is not the table default.
/// Continuation lines of a multi-line query are indented to line up.
pub fn generate_prompt(in_multiline: bool, query_count: usize, config: &DisplayConfig) -> String {
    let mode = match config.output_mode {
        OutputMode::Table => String::new(),
        other => format!(":{}", other),
    };
    let plain = format!("insight{}[{}]> ", mode, query_count);

    if in_multiline {
        let cont = format!("{:>width$} ", "...", width = plain.len() - 1);
        return if config.use_colors {
            cont.bright_black().to_string()
        } else {
            cont
        };
    }

    if config.use_colors {
        format!(
            "{}{}{}> ",
            "insight".bright_cyan().bold(),
            mode.bright_magenta(),
            format!("[{}]", query_count).bright_black()
        )
    } else {
        plain
    }
}
