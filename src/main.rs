use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use fugue_analyzer::{AnalyzerConfig, Composition, FugueAnalyzer, Transformation};
use tracing::level_filters::LevelFilter;
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Finds the subject of a fugue and every entry of it in each voice.
#[derive(Parser, Debug)]
#[command(name = "fugue_analyzer")]
#[command(version)]
struct Args {
    /// Score file: one voice per line of `pitch:duration` or `r:duration` tokens
    score: PathBuf,

    /// TOML file of matching parameters
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[arg(long)]
    debug: bool,

    #[arg(long)]
    reversal: bool,

    #[arg(long)]
    inversion: bool,

    #[arg(long)]
    reversal_inversion: bool,

    #[arg(long)]
    augmentation: bool,

    #[arg(long)]
    diminution: bool,
}

impl Args {
    fn transformations(&self) -> Vec<Transformation> {
        let requested = [
            (true, Transformation::Default),
            (self.reversal, Transformation::Reversal),
            (self.inversion, Transformation::Inversion),
            (self.reversal_inversion, Transformation::ReversalInversion),
            (self.augmentation, Transformation::Augmentation),
            (self.diminution, Transformation::Diminution),
        ];
        requested.iter().filter(|(on, _)| *on).map(|(_, t)| *t).collect()
    }
}

/// Used only when `RUST_LOG` is unset or unparsable.
fn fallback_filter(debug: bool) -> EnvFilter {
    let level = if debug {LevelFilter::DEBUG} else {LevelFilter::INFO};
    EnvFilter::new(level.to_string())
}

fn main() -> Result<()> {
    let args = Args::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| fallback_filter(args.debug)))
        .init();

    let config = match &args.config {
        Some(path) => AnalyzerConfig::load(path).with_context(|| format!("Failed to load {}", path.display()))?,
        None => AnalyzerConfig::default(),
    };
    let score = std::fs::read_to_string(&args.score).with_context(|| format!("Failed to read {}", args.score.display()))?;
    let composition: Composition = score.parse()?;
    info!("Read {} voices from {}", composition.voices.len(), args.score.display());

    let analyzer = FugueAnalyzer::new(composition, config)?;
    let analysis = analyzer.analyze(&args.transformations())?;

    println!("Subject: {}", analysis.subject.view_notes());
    for (voice, matches) in analysis.matches.iter() {
        println!("Voice {voice}: {} matches", matches.len());
        for (notes, transformation) in matches.iter() {
            println!("  {transformation:<18} {}", notes.view_notes());
        }
    }
    Ok(())
}
