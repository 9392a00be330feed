use clap::Parser;
use color_eyre::eyre::Result;

use desktui::{
    app::App,
    cli::Cli,
    registry::{CardInfo, CardRegistry},
    utils::{initialize_logging, initialize_panic_handler},
};

async fn tokio_main() -> Result<()> {
    initialize_logging()?;

    initialize_panic_handler()?;

    let args = Cli::parse();

    // The host registers its cards exactly once, up front.
    let mut registry = CardRegistry::new();
    registry.register(CardInfo::megadesk());

    let mut app = App::new(args.tick_rate, args.frame_rate)?;
    app.run().await?;

    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = tokio_main().await {
        eprintln!("{} error: Something went wrong", env!("CARGO_PKG_NAME"));
        Err(e)
    } else {
        Ok(())
    }
}
