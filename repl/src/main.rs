//! `insight`: interactive and scripted shell over an Insight data directory.

mod commands;
pub mod display;
mod history;
mod prompt;
mod session;

use anyhow::Context;
use clap::Parser;
use insight_core::Config;
use rustyline::error::ReadlineError;
use rustyline::{Config as EditorConfig, DefaultEditor, EditMode};
use serde_json::Value;
use std::fs;
use std::io::{self, IsTerminal, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use self::commands::{CommandHandler, CommandResult};
use self::display::{DisplayConfig, OutputMode};
use self::session::Session;

const HISTORY_FILE: &str = ".insight_history";

#[derive(Parser, Debug)]
#[command(name = "insight", version)]
#[command(about = "Query sections and rooms datasets with JSON queries", long_about = None)]
struct Args {
	/// TOML config file (INSIGHT_CONFIG overrides)
	#[arg(long, value_name = "PATH", default_value = "insight.toml")]
	config: PathBuf,

	/// Data directory; wins over the config file and INSIGHT_DATA_DIR
	#[arg(long, value_name = "PATH")]
	data_dir: Option<PathBuf>,

	/// Run a command or query and exit (repeatable)
	#[arg(short = 'c', long = "command", value_name = "CMD")]
	commands: Vec<String>,

	/// Run commands and queries from a file
	#[arg(short, long, value_name = "PATH")]
	file: Option<PathBuf>,

	/// Suppress banners and timing
	#[arg(short, long)]
	quiet: bool,

	/// Output format: table, json or csv
	#[arg(long, value_name = "FORMAT")]
	format: Option<OutputMode>,

	/// Stop with exit status 1 at the first failing command
	#[arg(long)]
	exit_on_error: bool,

	/// Do not read or write the history file
	#[arg(long)]
	no_history: bool,
}

#[derive(Debug, Clone)]
pub enum InputSource {
	Interactive,
	File(PathBuf),
	Stdin,
	CommandLine(Vec<String>),
}

#[derive(Debug, Clone)]
pub struct ReplOptions {
	pub input_source: InputSource,
	pub quiet: bool,
	pub exit_on_error: bool,
	pub no_history: bool,
	pub output_format: Option<OutputMode>,
}

/// What the caller should do after a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
	Continue,
	Exit,
}

pub struct Repl {
	editor: DefaultEditor,
	command_handler: CommandHandler,
	display_config: DisplayConfig,
	session: Session,
	history: history::HistoryManager,
	options: ReplOptions,
	multiline_buffer: String,
	in_multiline: bool,
	query_count: usize,
	failures: usize,
	start_time: Instant,
}

impl Repl {
	pub fn new(session: Session, options: ReplOptions) -> anyhow::Result<Self> {
		let editor_config = EditorConfig::builder()
			.history_ignore_space(true)
			.auto_add_history(false)
			.edit_mode(EditMode::Emacs)
			.build();
		let mut editor = DefaultEditor::with_config(editor_config)?;

		let history = history::HistoryManager::new(
			(!options.no_history).then(|| PathBuf::from(HISTORY_FILE)),
		);
		history.load(&mut editor);

		let mut display_config = DisplayConfig::default();
		if options.quiet {
			display_config.show_timing = false;
		}
		if let Some(format) = options.output_format {
			display_config.output_mode = format;
		}
		if !io::stdout().is_terminal() {
			display_config.use_colors = false;
			colored::control::set_override(false);
		}

		Ok(Self {
			editor,
			command_handler: CommandHandler::new(),
			display_config,
			session,
			history,
			options,
			multiline_buffer: String::new(),
			in_multiline: false,
			query_count: 0,
			failures: 0,
			start_time: Instant::now(),
		})
	}

	/// Run to completion; the exit code reflects `--exit-on-error`.
	pub fn run(&mut self) -> anyhow::Result<ExitCode> {
		match self.options.input_source.clone() {
			InputSource::Interactive => self.run_interactive()?,
			InputSource::File(path) => {
				let content = fs::read_to_string(&path)
					.with_context(|| format!("Failed to read {}", path.display()))?;
				self.run_script(&content);
			}
			InputSource::Stdin => {
				let mut content = String::new();
				io::stdin().read_to_string(&mut content)?;
				self.run_script(&content);
			}
			InputSource::CommandLine(commands) => {
				for command in &commands {
					if self.execute_text(command) == Flow::Exit || self.should_stop() {
						break;
					}
				}
			}
		}

		if self.options.exit_on_error && self.failures > 0 {
			Ok(ExitCode::FAILURE)
		} else {
			Ok(ExitCode::SUCCESS)
		}
	}

	fn run_interactive(&mut self) -> anyhow::Result<()> {
		if !self.options.quiet {
			display::print_welcome(&self.session.data_dir().display().to_string());
		}

		loop {
			let prompt_str =
				prompt::generate_prompt(self.in_multiline, self.query_count, &self.display_config);

			match self.editor.readline(&prompt_str) {
				Ok(line) => {
					if self.handle_line(&line) == Flow::Exit {
						break;
					}
				}
				Err(ReadlineError::Interrupted) => self.handle_interrupt(),
				Err(ReadlineError::Eof) => {
					println!();
					display::print_goodbye(self.query_count, self.start_time.elapsed());
					break;
				}
				Err(err) => {
					display::print_error(&format!("Readline error: {:?}", err));
					break;
				}
			}
		}

		self.history.save(&mut self.editor)?;
		Ok(())
	}

	/// Feed a script line by line. `//` lines are comments.
	fn run_script(&mut self, content: &str) {
		for line in content.lines() {
			if line.trim_start().starts_with("//") {
				continue;
			}
			if self.handle_line(line) == Flow::Exit || self.should_stop() {
				return;
			}
		}
		// A trailing query without a closing blank line.
		if self.in_multiline {
			self.handle_line("");
		}
	}

	fn should_stop(&self) -> bool {
		self.options.exit_on_error && self.failures > 0
	}

	/// One input line: a dot-command, or part of a JSON query.
	fn handle_line(&mut self, line: &str) -> Flow {
		let trimmed = line.trim();

		if !self.in_multiline && trimmed.starts_with('.') {
			self.remember(trimmed);
			return self.handle_command(trimmed);
		}

		if trimmed.is_empty() {
			if self.in_multiline {
				// Blank line submits what has been typed so far.
				let text = self.take_buffer();
				self.remember(&text);
				self.run_query_text(&text);
			}
			return Flow::Continue;
		}

		if self.in_multiline {
			self.multiline_buffer.push('\n');
		}
		self.multiline_buffer.push_str(line);

		match serde_json::from_str::<Value>(&self.multiline_buffer) {
			Ok(query) => {
				let text = self.take_buffer();
				self.remember(&text);
				self.run_query(&query, &text);
			}
			Err(e) if e.is_eof() => self.in_multiline = true,
			Err(e) => {
				let text = self.take_buffer();
				self.remember(&text);
				self.fail(&format!("Invalid JSON: {}", e));
			}
		}
		Flow::Continue
	}

	/// A complete entry from `-c` or the history: command or query.
	fn execute_text(&mut self, text: &str) -> Flow {
		let trimmed = text.trim();
		if trimmed.starts_with('.') {
			self.handle_command(trimmed)
		} else if !trimmed.is_empty() {
			self.run_query_text(trimmed);
			Flow::Continue
		} else {
			Flow::Continue
		}
	}

	fn handle_command(&mut self, line: &str) -> Flow {
		match self
			.command_handler
			.handle(line, &mut self.display_config, &self.session)
		{
			CommandResult::Continue => Flow::Continue,
			CommandResult::Exit => {
				if !self.options.quiet {
					display::print_goodbye(self.query_count, self.start_time.elapsed());
				}
				Flow::Exit
			}
			CommandResult::Error(msg) => {
				self.fail(&msg);
				Flow::Continue
			}
			CommandResult::ClearScreen => {
				display::clear_screen();
				Flow::Continue
			}
			CommandResult::ShowHistory => {
				self.history.display(&self.editor);
				Flow::Continue
			}
			CommandResult::ExecuteFromHistory(n) => match self.history.get_entry(&self.editor, n) {
				Some(entry) if entry.trim_start().starts_with(".history") => {
					self.fail("Refusing to run a .history entry from history");
					Flow::Continue
				}
				Some(entry) => self.execute_text(&entry),
				None => {
					self.fail(&format!("History entry {} not found", n));
					Flow::Continue
				}
			},
		}
	}

	fn run_query_text(&mut self, text: &str) {
		match serde_json::from_str::<Value>(text) {
			Ok(query) => self.run_query(&query, text),
			Err(e) => self.fail(&format!("Invalid JSON: {}", e)),
		}
	}

	fn run_query(&mut self, query: &Value, text: &str) {
		self.query_count += 1;

		let start = Instant::now();
		let result = self.session.query(query);
		let duration = start.elapsed();

		match result {
			Ok(rows) => display::print_rows(&rows, duration, &self.display_config),
			Err(e) => {
				self.failures += 1;
				display::print_query_error(&e, text);
			}
		}
	}

	fn fail(&mut self, msg: &str) {
		self.failures += 1;
		display::print_error(msg);
	}

	fn take_buffer(&mut self) -> String {
		self.in_multiline = false;
		std::mem::take(&mut self.multiline_buffer)
	}

	fn remember(&mut self, entry: &str) {
		if matches!(self.options.input_source, InputSource::Interactive) && !entry.trim().is_empty()
		{
			let _ = self.editor.add_history_entry(entry);
		}
	}

	fn handle_interrupt(&mut self) {
		if self.in_multiline {
			display::print_warning("Cancelled multiline input");
			self.take_buffer();
		} else {
			display::print_hint("Use .exit or Ctrl+D to quit");
		}
	}
}

fn get_env_filter() -> EnvFilter {
	if std::env::var_os("RUST_LOG").is_some() {
		EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
	} else if cfg!(debug_assertions) {
		EnvFilter::new("insight_core=debug,insight=debug")
	} else {
		EnvFilter::new("insight_core=warn,insight=warn")
	}
}

fn init_tracing() {
	let stderr_layer = tracing_subscriber::fmt::layer()
		.with_writer(io::stderr)
		.with_target(false)
		.with_timer(tracing_subscriber::fmt::time::time())
		.compact();

	Registry::default()
		.with(get_env_filter())
		.with(stderr_layer)
		.init();
}

fn main() -> anyhow::Result<ExitCode> {
	let args = Args::parse();
	init_tracing();

	let mut config = Config::load_from_path(&args.config)
		.with_context(|| format!("Failed to load config {}", args.config.display()))?;
	if let Some(dir) = args.data_dir {
		config.data_dir = dir;
	}
	tracing::debug!(data_dir = %config.data_dir.display(), max_results = config.max_results, "Config loaded");

	let input_source = if let Some(path) = args.file {
		InputSource::File(path)
	} else if !args.commands.is_empty() {
		InputSource::CommandLine(args.commands)
	} else if !io::stdin().is_terminal() {
		InputSource::Stdin
	} else {
		InputSource::Interactive
	};

	let options = ReplOptions {
		input_source,
		quiet: args.quiet,
		exit_on_error: args.exit_on_error,
		no_history: args.no_history,
		output_format: args.format,
	};

	let session = Session::open(&config)?;
	let mut repl = Repl::new(session, options)?;
	repl.run()
}
