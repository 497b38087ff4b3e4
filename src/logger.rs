// Logger - Colored console output with timestamps

use chrono::Local;
use colored::*;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};

static VERBOSE: AtomicBool = AtomicBool::new(false);

#[derive(Clone, Copy)]
pub enum Level {
	Info,
	Success,
	Warning,
	Error,
	Debug,
}

pub fn set_verbose(verbose: bool) {
	VERBOSE.store(verbose, Ordering::Relaxed);
}

/// Prints a timestamped, colored log message to stdout.
pub fn log(level: Level, message: &str) {
	let time = Local::now().format("%H:%M:%S").to_string().dimmed();
	let icon = match level {
		Level::Info =>    "ℹ".blue().bold(),
		Level::Success => "✔".bright_green().bold(),
		Level::Warning => "⚠".yellow().bold(),
		Level::Error =>   "✘".red().bold(),
		Level::Debug =>   "⚙".bright_blue().bold(),
	};
	println!("[{}] {} {}", time, icon, message);
}

/// Logs only when --verbose is active.
pub fn debug(message: &str) {
	if VERBOSE.load(Ordering::Relaxed) {
		log(Level::Debug, message);
	}
}

/// Prints a section header with visual separation.
pub fn header(title: &str) {
	println!();
	println!("{}", format!("─── {} ───", title).bright_blue().bold());
}

/// OSC 8 terminal hyperlink for clickable file names.
pub fn hyperlink(text: &str, path: &Path) -> String {
	format!(
		"\x1b]8;;file://{}\x1b\\{}\x1b]8;;\x1b\\",
		path.display(),
		text
	)
}

/// Prints a processing summary with statistics.
pub fn summary(processed: usize, copied: usize, errors: usize, duration_secs: f32) {
	println!();
	header("Summary");

	if processed > 0 {
		println!("  {} {}", "Processed:".bright_blue(), processed);
	}
	if copied > 0 {
		println!("  {} {}", "Copied:".bright_green(), copied);
	}
	if errors > 0 {
		println!("  {} {}", "Errors:".red(), errors);
	}

	println!("  {} {:.2}s", "Duration:".bright_blue(), duration_secs);
	if processed > 0 {
		let avg_ms = (duration_secs * 1000.0) / processed as f32;
		println!("  {} {:.0}ms/image", "Average:".bright_blue(), avg_ms);
	}
	println!();
}
