use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;

use crate::config::{DEFAULT_STORE_FILE, DEFAULT_TOLERANCE};

fn parse_tolerance(s: &str) -> Result<f32, String> {
	let val: f32 = s.parse().map_err(|_| format!("'{}' is not a valid number", s))?;
	if val < 0.0 {
		Err(format!("tolerance must be non-negative, got {}", val))
	} else {
		Ok(val)
	}
}

fn styles() -> Styles {
	Styles::styled()
		.header(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Blue))))
		.usage(Style::new().bold().fg_color(Some(Color::Ansi(AnsiColor::Blue))))
		.literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))))
		.placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Yellow))))
		.valid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Blue))))
		.invalid(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Red))))
}

#[derive(Parser, Debug)]
#[command(
	name = "facesort",
	author,
	version,
	about = "Sort photos into per-person folders by face recognition",
	styles = styles(),
	disable_help_subcommand = true,
	after_help = format!(
		"{title}
  {bin} {encode}  {encode_args}        {encode_desc}
  {bin} {sort}    {sort_args}   {sort_desc}
  {bin} {help}    {help_args}                   {help_desc}",
		title = "Examples:".bright_blue().bold(),
		bin = "facesort".bright_blue(),
		encode = "encode".yellow(),
		encode_args = "-d ./photos/",
		encode_desc = "Build the reference store".dimmed(),
		sort = "sort".yellow(),
		sort_args = "-d ./inbox/ -t ./sorted/",
		sort_desc = "Sort photos by recognized faces".dimmed(),
		help = "help".yellow(),
		help_args = "sort",
		help_desc = "Show help for sort".dimmed(),
	),
)]
pub struct Cli {
	/// Enable verbose debug output
	#[arg(short = 'v', long = "verbose", global = true)]
	pub verbose: bool,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Build the reference store from labeled photos (photos/<name>/*)
	Encode {
		/// Directory of labeled reference photos
		#[arg(short = 'd', long = "dir", default_value = "photos")]
		directory: PathBuf,

		/// Reference store file to write
		#[arg(short = 's', long = "store", default_value = DEFAULT_STORE_FILE)]
		store: PathBuf,
	},

	/// Sort photos into per-person folders using the reference store
	Sort {
		/// Directory of photos to sort
		#[arg(short = 'd', long = "dir", default_value = ".")]
		directory: PathBuf,

		/// Target directory for the sorted copies
		#[arg(short = 't', long = "target")]
		target: PathBuf,

		/// Reference store file to match against
		#[arg(short = 's', long = "store", default_value = DEFAULT_STORE_FILE)]
		store: PathBuf,

		/// Maximum embedding distance for a positive match
		#[arg(long = "tolerance", default_value_t = DEFAULT_TOLERANCE, value_parser = parse_tolerance)]
		tolerance: f32,
	},

	/// Show help for a subcommand
	Help {
		/// Subcommand name
		subcommand: Option<String>,
	},
}
