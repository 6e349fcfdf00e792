pub mod builder;

mod error;

pub use error::{Error, Result};

use std::{fs::File, io::BufReader, path::PathBuf};

use clap::Parser;
use color_eyre::eyre;

use vitrine_storage::snapshot::SnapshotWriter;

#[derive(Debug, Parser)]
#[command(
	version = vitrine_cli::VERSION,
	rename_all = "kebab",
	styles = vitrine_cli::styles(),
)]
pub struct Args {
	#[arg(long, short = 'c', value_name = "FILE")]
	pub config: PathBuf,
	/// JSON-lines export, one `{"id": ..., "source": {...}}` record per line.
	#[arg(long, short = 'i', value_name = "FILE")]
	pub input: PathBuf,
	/// Replace entries that already exist in the snapshot.
	#[arg(long)]
	pub force: bool,
}

pub fn run(args: Args) -> color_eyre::Result<()> {
	let config = vitrine_config::load(&args.config)?;

	vitrine_cli::init_tracing(&config.service.log_level);

	let Some(snapshot) = config.backend.snapshot.as_ref() else {
		return Err(eyre::eyre!("backend.snapshot must be set to build a snapshot."));
	};
	let writer = SnapshotWriter::create(&snapshot.path)?;
	let input = File::open(&args.input)?;
	let report = builder::import(BufReader::new(input), &writer, args.force)?;

	tracing::info!(
		path = %snapshot.path,
		written = report.written,
		skipped = report.skipped,
		"Snapshot written."
	);

	Ok(())
}
