use clap::Parser;

fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = vitrine_snapshot::Args::parse();

	vitrine_snapshot::run(args)
}
