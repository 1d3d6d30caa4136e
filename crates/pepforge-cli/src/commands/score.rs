use crate::cli::ScoreArgs;
use crate::error::{CliError, Result};
use pepforge::core::chemistry::{properties::SequenceProperties, residues};

fn normalize(sequence: &str) -> Result<String> {
    let normalized = sequence.trim().to_ascii_uppercase();
    if normalized.is_empty() {
        return Err(CliError::InvalidSequence {
            sequence: sequence.to_string(),
            reason: "sequence is empty".to_string(),
        });
    }
    if let Some(bad) = normalized.chars().find(|c| !residues::is_standard(*c)) {
        return Err(CliError::InvalidSequence {
            sequence: sequence.to_string(),
            reason: format!("'{bad}' is not a standard amino acid"),
        });
    }
    Ok(normalized)
}

fn render(sequence: &str, props: &SequenceProperties) -> String {
    format!(
        "{sequence}\n  length               {}\n  net charge           {:+.3}\n  isoelectric point    {:.2}\n  hydrophobic fraction {:.3}\n  aromatic fraction    {:.3}\n  positive fraction    {:.3}\n  negative fraction    {:.3}\n  polar fraction       {:.3}\n  cysteines            {}\n  aggregation motif    {}",
        sequence.len(),
        props.net_charge,
        props.isoelectric_point,
        props.hydrophobic_fraction,
        props.aromatic_fraction,
        props.positive_fraction,
        props.negative_fraction,
        props.polar_fraction,
        props.cysteine_count,
        if props.aggregation_flag { "yes" } else { "no" },
    )
}

pub async fn run(args: ScoreArgs) -> Result<()> {
    if !(0.0..=14.0).contains(&args.ph) {
        return Err(CliError::PhOutOfRange(args.ph));
    }
    for raw in &args.sequences {
        let sequence = normalize(raw)?;
        let props = SequenceProperties::compute(&sequence, args.ph);
        println!("{}\n", render(&sequence, &props));
    }
    Ok(())
}
