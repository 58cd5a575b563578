use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = gf_api::Args::parse();

	gf_api::run(args).await
}
