use crate::cli::RunArgs;
use crate::config;
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use pepforge::engine::progress::ProgressReporter;
use pepforge::workflows;
use tracing::{info, warn};

pub async fn run(args: RunArgs) -> Result<()> {
    info!("Merging configuration from {:?} and CLI arguments...", &args.config.config);
    let app = config::build_config(&args.config)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Starting {} run (seed {}) into {}",
        app.run.target().mode,
        app.run.global().seed,
        app.run.global().output_root.display()
    );
    let outcome =
        tokio::task::block_in_place(|| workflows::pipeline::run(&app.run, &reporter))?;

    let passing = outcome.passing_count();
    if passing == 0 {
        warn!("Run finished but no design passed the filters.");
        println!("Warning: no design passed the configured filters.");
    }
    println!(
        "Generated {} backbone(s) and {} design(s); {} passed filters.",
        outcome.backbones.len(),
        outcome.designs.len(),
        passing
    );
    if let Some(best) = outcome.ranked.first() {
        println!(
            "✓ Top design {} ({}) with composite score {:.3}",
            best.design_id(),
            best.scored.design.sequence,
            best.composite_score
        );
    }
    if !outcome.predictions.is_empty() {
        println!("  {} structure prediction(s) written.", outcome.predictions.len());
    }
    println!("  Report: {}", outcome.report_path.display());
    Ok(())
}
