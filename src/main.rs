//! Facesort - sort photos into per-person folders by face recognition
//!
//! `encode` builds a reference store of face embeddings from labeled photos;
//! `sort` matches new photos against that store and copies each one into a
//! folder per recognized person.

use anyhow::Result;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use std::path::Path;
use std::time::Instant;

use facesort::cli::{Cli, Command};
use facesort::face::FacePipeline;
use facesort::logger::{self, log, Level};
use facesort::{encoder, sorter, store};

fn main() -> Result<()> {
	let cli = Cli::parse();

	logger::set_verbose(cli.verbose);

	match cli.command {
		Command::Encode { directory, store } => run_encode(&directory, &store),
		Command::Sort { directory, target, store, tolerance } => {
			run_sort(&directory, &target, &store, tolerance)
		}
		Command::Help { subcommand } => {
			let mut cmd = Cli::command();
			if let Some(sub) = subcommand {
				if let Some(sub_cmd) = cmd.find_subcommand_mut(&sub) {
					sub_cmd.print_help().unwrap();
				} else {
					eprintln!("Unknown subcommand: {}", sub);
					cmd.print_help().unwrap();
				}
			} else {
				cmd.print_help().unwrap();
			}
			Ok(())
		}
	}
}

fn run_encode(directory: &Path, store_path: &Path) -> Result<()> {
	print_header();

	log(Level::Info, "Loading face models...");
	let load_start = Instant::now();
	let mut pipeline = FacePipeline::new()?;
	log(Level::Success, &format!("Models ready in {:.2}s", load_start.elapsed().as_secs_f32()));

	log(Level::Info, &format!("Encoding reference photos in {}...", directory.display()));
	let entries = encoder::build_store(directory, &mut pipeline)?;

	if entries.is_empty() {
		log(Level::Warning, "No faces found in any reference photo");
	}

	store::save_store(&entries, store_path)?;
	log(
		Level::Success,
		&format!("Saved {} reference entries to {}", entries.len(), store_path.display()),
	);

	Ok(())
}

fn run_sort(directory: &Path, target: &Path, store_path: &Path, tolerance: f32) -> Result<()> {
	print_header();

	let entries = store::load_store(store_path)?;
	log(
		Level::Success,
		&format!("Loaded {} reference entries from {}", entries.len(), store_path.display()),
	);
	if entries.is_empty() {
		log(Level::Warning, "Store is empty — everything will be sorted as Unknown");
	}

	log(Level::Info, "Loading face models...");
	let load_start = Instant::now();
	let mut pipeline = FacePipeline::new()?;
	log(Level::Success, &format!("Models ready in {:.2}s", load_start.elapsed().as_secs_f32()));

	println!();
	println!("{}", "─── Processing ───".bright_blue().bold());

	let start = Instant::now();
	let summary = sorter::process_batch(
		directory,
		target,
		&entries,
		&mut pipeline,
		tolerance,
		|processed, total| logger::debug(&format!("Progress {}/{}", processed, total)),
		|| log(Level::Success, "All files have been processed"),
	)?;

	logger::summary(
		summary.processed,
		summary.copied,
		summary.errors,
		start.elapsed().as_secs_f32(),
	);

	if summary.errors > 0 {
		log(Level::Warning, &format!("Completed with {} errors", summary.errors));
	}

	Ok(())
}

fn print_header() {
	println!();
	println!(
		"{}",
		format!("─── Facesort v{} ───", env!("CARGO_PKG_VERSION"))
			.bright_blue()
			.bold()
	);
}
