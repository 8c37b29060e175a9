//! Globe Plot CLI
//!
//! Replays scripted pointer sessions against the headless host and
//! validates persisted shape records.

use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{Parser, Subcommand};
use globe_plot_core::{PlotConfig, ShapeRecord};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::script::{Replay, Script};

mod script;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run a replay script and print the resulting records
    Replay {
        script: PathBuf,

        /// Plot configuration (JSON)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Write records here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Check a JSON array of shape records
    Validate { records: PathBuf },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    match Cli::parse().command {
        Command::Replay {
            script,
            config,
            output,
        } => replay(&script, config.as_deref(), output.as_deref()),
        Command::Validate { records } => validate(&records),
    }
}

fn read(path: &Path) -> anyhow::Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

fn replay(script: &Path, config: Option<&Path>, output: Option<&Path>) -> anyhow::Result<()> {
    let config = match config {
        Some(path) => PlotConfig::from_json(&read(path)?)
            .with_context(|| format!("invalid config {}", path.display()))?,
        None => PlotConfig::default(),
    };
    let script: Script = serde_json::from_str(&read(script)?)
        .with_context(|| format!("invalid script {}", script.display()))?;

    let records = run(script, config)?;
    let json = serde_json::to_string_pretty(&records)?;
    match output {
        Some(path) => {
            std::fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
            tracing::info!("wrote {} records to {}", records.len(), path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}

fn run(script: Script, config: PlotConfig) -> anyhow::Result<Vec<ShapeRecord>> {
    let mut replay = Replay::new(script.projection, config);
    replay.load(&script.records)?;
    for (index, step) in script.steps.into_iter().enumerate() {
        replay.run(index, step)?;
    }
    tracing::info!("replayed with {} shapes", replay.registry().len());
    Ok(replay.finish())
}

fn validate(path: &Path) -> anyhow::Result<()> {
    let values: Vec<serde_json::Value> = serde_json::from_str(&read(path)?)
        .with_context(|| format!("{} is not a JSON array", path.display()))?;

    let mut failed = 0;
    for (index, value) in values.into_iter().enumerate() {
        match ShapeRecord::from_value(value) {
            Ok(record) => println!("{index}: ok ({}, {} positions)", record.shape, record.positions.len()),
            Err(e) => {
                failed += 1;
                println!("{index}: {e}");
            }
        }
    }
    if failed > 0 {
        anyhow::bail!("{failed} invalid records");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use globe_plot_core::ShapeKind;

    #[test]
    fn test_replay_script_draws_and_styles() {
        let script: Script = serde_json::from_str(
            r##"{
                "steps": [
                    { "op": "create", "shape": "polyline" },
                    { "op": "left_click", "x": 0, "y": 0 },
                    { "op": "mouse_move", "x": 80, "y": 10 },
                    { "op": "left_click", "x": 100, "y": 0 },
                    { "op": "left_click", "x": 100, "y": 100 },
                    { "op": "right_click" },
                    { "op": "set_color", "field": "lineColor", "color": "#00ff00" },
                    { "op": "save" },
                    { "op": "create", "shape": "label", "label": "Bridge" },
                    { "op": "left_click", "x": 300, "y": 300 },
                    { "op": "set_label", "text": "Ford" },
                    { "op": "create", "shape": "polygon" },
                    { "op": "left_click", "x": 0, "y": 500 },
                    { "op": "right_click" }
                ]
            }"##,
        )
        .unwrap();

        let records = run(script, PlotConfig::default()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].shape, ShapeKind::Polyline);
        assert_eq!(records[0].positions.len(), 3);
        assert_eq!(records[0].style.line_color.as_ref().map(|c| c.as_str()), Some("#00ff00"));
        assert_eq!(records[1].label.as_deref(), Some("Ford"));
    }

    #[test]
    fn test_replay_rejects_bad_steps() {
        let script: Script =
            serde_json::from_str(r#"{ "steps": [ { "op": "set_label", "text": "x" } ] }"#).unwrap();
        assert!(run(script, PlotConfig::default()).is_err());
        assert!(serde_json::from_str::<Script>(r#"{ "steps": [ { "op": "zoom" } ] }"#).is_err());
    }
}
