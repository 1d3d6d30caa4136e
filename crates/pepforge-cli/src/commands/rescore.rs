use crate::cli::RescoreArgs;
use crate::config;
use crate::error::{CliError, Result};
use crate::utils::progress::CliProgressHandler;
use pepforge::engine::progress::ProgressReporter;
use pepforge::workflows;
use tracing::info;

pub async fn run(args: RescoreArgs) -> Result<()> {
    if !args.designs.is_file() {
        return Err(CliError::MissingDesigns(args.designs.clone()));
    }
    let app = config::build_config(&args.config)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    info!("Re-scoring designs from {:?}", &args.designs);
    let ranked = tokio::task::block_in_place(|| {
        workflows::rescore::run(&app.run, &args.designs, &reporter)
    })?;

    let passing = ranked.iter().filter(|r| r.passes_filters()).count();
    println!(
        "Ranked {} design(s); {} passed filters. Tables written to {}",
        ranked.len(),
        passing,
        app.run.global().output_root.display()
    );
    for design in ranked.iter().take(5) {
        println!(
            "  #{:<3} {:<24} {:<20} {:.3}",
            design.rank,
            design.design_id(),
            design.scored.design.sequence,
            design.composite_score
        );
    }
    Ok(())
}
