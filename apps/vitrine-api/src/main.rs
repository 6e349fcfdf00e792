use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = vitrine_api::Args::parse();

	vitrine_api::run(args).await
}
