use colored::Colorize;
use comfy_table::{ContentArrangement, Table, presets::UTF8_FULL};
use insight_core::{DatasetInfo, InsightError, OutputRow};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
	Table,
	Json,
	Csv,
}

impl FromStr for OutputMode {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_ascii_lowercase().as_str() {
			"table" => Ok(OutputMode::Table),
			"json" => Ok(OutputMode::Json),
			"csv" => Ok(OutputMode::Csv),
			_ => Err(format!("Unknown mode: {} (expected table, json or csv)", s)),
		}
	}
}

impl fmt::Display for OutputMode {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let name = match self {
			OutputMode::Table => "table",
			OutputMode::Json => "json",
			OutputMode::Csv => "csv",
		};
		f.write_str(name)
	}
}

#[derive(Debug, Clone)]
pub struct DisplayConfig {
	pub show_timing: bool,
	pub use_colors: bool,
	pub output_mode: OutputMode,
}

impl Default for DisplayConfig {
	fn default() -> Self {
		Self {
			show_timing: true,
			use_colors: true,
			output_mode: OutputMode::Table,
		}
	}
}

pub fn print_welcome(data_dir: &str) {
	println!("\n{}", "Insight query shell".bright_cyan().bold());
	println!("Data directory: {}", data_dir.bright_white());
	println!(
		"Type {} for help, {} to exit",
		".help".bright_green(),
		".exit".bright_green()
	);
	println!();
}

pub fn print_goodbye(query_count: usize, duration: Duration) {
	println!();
	println!("{}", "─".repeat(40).bright_black());
	println!("   Ran {} queries in {:.1?}", query_count, duration);
	println!();
}

pub fn clear_screen() {
	print!("\x1B[2J\x1B[1;1H");
}

pub fn print_error(msg: &str) {
	eprintln!("{} {}", "✗".bright_red().bold(), msg.bright_red());
}

pub fn print_warning(msg: &str) {
	println!("{} {}", "⚠".bright_yellow(), msg.bright_yellow());
}

pub fn print_info(msg: &str) {
	println!("{} {}", "ℹ".bright_blue(), msg.bright_white());
}

pub fn print_success(msg: &str) {
	println!("{} {}", "✓".bright_green().bold(), msg.bright_green());
}

pub fn print_hint(msg: &str) {
	println!("{} {}", "»".bright_white(), msg.bright_white().dimmed());
}

pub fn print_toggle(feature: &str, enabled: bool) {
	let status = if enabled {
		"ON".bright_green().bold()
	} else {
		"OFF".bright_red()
	};
	println!("{}: {}", feature, status);
}

pub fn print_rows(rows: &[OutputRow], duration: Duration, config: &DisplayConfig) {
	match config.output_mode {
		OutputMode::Table => println!("{}", render_table(rows)),
		OutputMode::Json => println!("{}", render_json(rows)),
		OutputMode::Csv => match render_csv(rows) {
			Ok(text) => print!("{}", text),
			Err(e) => print_error(&format!("Failed to write CSV: {:#}", e)),
		},
	}

	if config.output_mode == OutputMode::Table {
		println!("  {} row(s)", rows.len().to_string().bright_white());
	}
	print_timing(duration, config);
}

pub fn print_datasets(datasets: &[DatasetInfo], config: &DisplayConfig) {
	match config.output_mode {
		OutputMode::Json => {
			let text = serde_json::to_string_pretty(datasets).unwrap_or_default();
			println!("{}", text);
		}
		OutputMode::Csv => {
			let records = datasets.iter().map(|info| {
				vec![info.id.clone(), info.kind.to_string(), info.num_rows.to_string()]
			});
			match write_csv(&["id", "kind", "numRows"], records) {
				Ok(text) => print!("{}", text),
				Err(e) => print_error(&format!("Failed to write CSV: {:#}", e)),
			}
		}
		OutputMode::Table => {
			if datasets.is_empty() {
				print_info("No datasets found");
				return;
			}
			let mut table = new_table();
			table.set_header(vec!["id", "kind", "rows"]);
			for info in datasets {
				table.add_row(vec![
					info.id.clone(),
					info.kind.to_string(),
					info.num_rows.to_string(),
				]);
			}
			println!("{}", table);
		}
	}
}

pub fn print_timing(duration: Duration, config: &DisplayConfig) {
	if config.show_timing {
		println!(
			"  {} {:.3}ms",
			"Time:".bright_black(),
			duration.as_secs_f64() * 1000.0
		);
	}
}

pub fn print_query_error(error: &InsightError, query: &str) {
	print_error(&format!("[{}] {}", error.kind(), error));

	let lines: Vec<&str> = query.trim().lines().collect();
	if !lines.is_empty() && lines.len() <= 5 {
		eprintln!("{}", "Query:".bright_yellow());
		for (i, line) in lines.iter().enumerate() {
			eprintln!("{:3} │ {}", i + 1, line.dimmed());
		}
	}
}

fn new_table() -> Table {
	let mut table = Table::new();
	table
		.load_preset(UTF8_FULL)
		.set_content_arrangement(ContentArrangement::Dynamic);
	table
}

/// Column order of the first row; every row carries the same keys.
fn header(rows: &[OutputRow]) -> Vec<String> {
	rows.first()
		.map(|row| row.keys().cloned().collect())
		.unwrap_or_default()
}

fn cell_text(value: &Value) -> String {
	match value {
		Value::String(s) => s.clone(),
		Value::Null => String::new(),
		other => other.to_string(),
	}
}

pub fn render_table(rows: &[OutputRow]) -> String {
	let mut table = new_table();
	table.set_header(header(rows));
	for row in rows {
		table.add_row(row.values().map(cell_text).collect::<Vec<_>>());
	}
	table.to_string()
}

pub fn render_json(rows: &[OutputRow]) -> String {
	let array = Value::Array(rows.iter().cloned().map(Value::Object).collect());
	serde_json::to_string_pretty(&array).unwrap_or_default()
}

pub fn render_csv(rows: &[OutputRow]) -> anyhow::Result<String> {
	let columns = header(rows);
	if columns.is_empty() {
		return Ok(String::new());
	}
	let records = rows
		.iter()
		.map(|row| row.values().map(cell_text).collect::<Vec<_>>());
	write_csv(&columns, records)
}

/// Header plus records through a `csv::Writer`, which handles quoting.
fn write_csv<H, R>(header: &[H], records: impl Iterator<Item = R>) -> anyhow::Result<String>
where
	H: AsRef<[u8]>,
	R: IntoIterator,
	R::Item: AsRef<[u8]>,
{
	let mut writer = csv::Writer::from_writer(Vec::new());
	writer.write_record(header)?;
	for record in records {
		writer.write_record(record)?;
	}
	let bytes = writer.into_inner().map_err(|e| e.into_error())?;
	Ok(String::from_utf8(bytes)?)
}
