use super::display::{self, DisplayConfig, OutputMode};
use super::session::{Session, load_records};
use colored::Colorize;
use insight_core::DatasetKind;
use std::path::Path;
use std::time::Instant;

#[derive(Debug, PartialEq)]
pub enum CommandResult {
    Continue,
    Exit,
    Error(String),
    ClearScreen,
    ShowHistory,
    ExecuteFromHistory(usize),
}

pub struct CommandHandler;

impl CommandHandler {
    pub fn new() -> Self {
        CommandHandler
    }

    pub fn handle(
        &self,
        line: &str,
        display_config: &mut DisplayConfig,
        session: &Session,
    ) -> CommandResult {
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some(&command) = parts.first() else {
            return CommandResult::Continue;
        };

        match command {
            ".help" | ".h" | ".?" => {
                self.show_help();
                CommandResult::Continue
            }
            ".exit" | ".quit" | ".q" => CommandResult::Exit,
            ".clear" | ".cls" => CommandResult::ClearScreen,
            ".datasets" | ".ls" => match session.datasets() {
                Ok(datasets) => {
                    display::print_datasets(&datasets, display_config);
                    CommandResult::Continue
                }
                Err(e) => CommandResult::Error(format!("Failed to list datasets: {}", e)),
            },
            ".add" => match parts.as_slice() {
                [_, id, kind, path] => self.add(session, id, kind, path, display_config),
                _ => CommandResult::Error(
                    "Usage: .add <id> <sections|rooms> <records.json>".to_string(),
                ),
            },
            ".remove" | ".rm" => match parts.as_slice() {
                [_, id] => match session.remove(id) {
                    Ok(removed) => {
                        display::print_success(&format!("Removed dataset '{}'", removed));
                        CommandResult::Continue
                    }
                    Err(e) => CommandResult::Error(format!("[{}] {}", e.kind(), e)),
                },
                _ => CommandResult::Error("Usage: .remove <id>".to_string()),
            },
            ".timing" | ".time" => {
                display_config.show_timing = !display_config.show_timing;
                display::print_toggle("Query timing", display_config.show_timing);
                CommandResult::Continue
            }
            ".history" | ".hist" => match parts.get(1) {
                Some(n) => match n.parse::<usize>() {
                    Ok(n) => CommandResult::ExecuteFromHistory(n),
                    Err(_) => CommandResult::Error(format!("Invalid history number: {}", n)),
                },
                None => CommandResult::ShowHistory,
            },
            ".mode" => match parts.get(1) {
                Some(mode) => match mode.parse::<OutputMode>() {
                    Ok(mode) => {
                        display_config.output_mode = mode;
                        display::print_info(&format!("Output mode set to: {}", mode));
                        CommandResult::Continue
                    }
                    Err(e) => CommandResult::Error(e),
                },
                None => {
                    display::print_info(&format!(
                        "Current output mode: {}",
                        display_config.output_mode
                    ));
                    CommandResult::Continue
                }
            },
            _ => CommandResult::Error(format!(
                "Unknown command: {}. Type .help for help.",
                command
            )),
        }
    }

    fn add(
        &self,
        session: &Session,
        id: &str,
        kind: &str,
        path: &str,
        display_config: &DisplayConfig,
    ) -> CommandResult {
        let Some(kind) = DatasetKind::parse(kind) else {
            return CommandResult::Error(format!(
                "Unknown dataset kind: {} (expected sections or rooms)",
                kind
            ));
        };
        let records = match load_records(Path::new(path)) {
            Ok(records) => records,
            Err(e) => return CommandResult::Error(format!("{:#}", e)),
        };

        let start = Instant::now();
        match session.add(id, kind, records) {
            Ok(ids) => {
                display::print_success(&format!("Added dataset '{}'", id));
                display::print_info(&format!("Datasets: {}", ids.join(", ")));
                display::print_timing(start.elapsed(), display_config);
                CommandResult::Continue
            }
            Err(e) => CommandResult::Error(format!("[{}] {}", e.kind(), e)),
        }
    }

    fn show_help(&self) {
        println!("\n{}", "Insight Commands".bright_cyan().bold());
        println!("{}", "─".repeat(50).bright_black());

        let commands = vec![
            (".help, .h, .?", "Show this help message"),
            (".exit, .quit, .q", "Exit the shell"),
            (".clear, .cls", "Clear the screen"),
            ("", ""),
            ("Datasets:", ""),
            (".datasets, .ls", "List stored datasets"),
            (".add <id> <kind> <file>", "Add a sections or rooms dataset from a JSON array"),
            (".remove <id>", "Remove a dataset"),
            ("", ""),
            ("Display Options:", ""),
            (".timing, .time", "Toggle query timing"),
            (".mode <format>", "Set output format (table/json/csv)"),
            ("", ""),
            ("History:", ""),
            (".history, .hist", "Show history"),
            (".history <n>", "Run history entry n"),
        ];

        for (cmd, desc) in commands {
            if cmd.is_empty() {
                println!();
            } else if desc.is_empty() {
                println!("{}", cmd.bright_yellow());
            } else {
                println!("  {:26} {}", cmd.bright_green(), desc.bright_white());
            }
        }

        println!("\n{}", "Query Input:".bright_yellow());
        println!("  • Type a JSON query; it runs as soon as the JSON is complete");
        println!("  • An empty line submits whatever has been typed");
        println!("  • Ctrl+C cancels current input");
        println!("  • Ctrl+D exits the shell");
        println!();
        println!("{}", "Example:".bright_yellow());
        println!(
            "  {}",
            r#"{"WHERE": {"GT": {"ubc_avg": 97}}, "OPTIONS": {"COLUMNS": ["ubc_dept", "ubc_avg"], "ORDER": "ubc_avg"}}"#
                .dimmed()
        );
        println!();
    }
}
