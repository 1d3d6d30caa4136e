use crate::cli::ValidateArgs;
use crate::config;
use crate::error::Result;
use tracing::info;

pub async fn run(args: ValidateArgs) -> Result<()> {
    let app = config::build_config(&args.config)?;
    info!("Configuration {:?} is valid.", app.source);

    let rendered = app.run.to_toml()?;
    println!("✓ {} is valid. Resolved configuration:\n", app.source.display());
    println!("{rendered}");
    Ok(())
}
