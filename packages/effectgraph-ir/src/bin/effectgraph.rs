//! Effectgraph CLI
//!
//! Effect inference and checking for front-end program dumps.
//!
//! # Usage
//!
//! ```bash
//! # Check one or more units, print diagnostics
//! effectgraph check app.json --config effects.yaml --published streams.effects.json
//!
//! # Machine-readable output
//! effectgraph check app.yaml --preset strict --json
//!
//! # Finalize a unit's table for importing units
//! effectgraph publish streams.json -o streams.effects.json
//! ```
//!
//! Exit code 0: no violations. Exit code 1: violations or errors.

use clap::{Parser, Subcommand};
use effectgraph_ir::config::{ConfigError, EffectConfig, Preset};
use effectgraph_ir::features::effect_inference::{PublishedEffects, PublishedRegistry};
use effectgraph_ir::pipeline::{analyze_units_with, load_program, UnitAnalyzer, UnitResult};
use effectgraph_ir::Result;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "effectgraph")]
#[command(about = "Effectgraph - raises/tags effect inference and checking", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Infer effects and report violations
    Check {
        /// Program files (.json, .yaml, .yml)
        #[arg(required = true)]
        programs: Vec<PathBuf>,

        /// YAML configuration (version 1)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Preset when no configuration file is given
        #[arg(short, long, conflicts_with = "config")]
        preset: Option<String>,

        /// Published effects of imported units (repeatable)
        #[arg(long)]
        published: Vec<PathBuf>,

        /// Print diagnostics as JSON
        #[arg(long)]
        json: bool,
    },

    /// Write the finalized effect table of a unit
    Publish {
        /// Program file
        program: PathBuf,

        /// Output path
        #[arg(short, long)]
        output: PathBuf,

        /// YAML configuration (version 1)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Published effects of imported units (repeatable)
        #[arg(long)]
        published: Vec<PathBuf>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let outcome = match cli.command {
        Commands::Check {
            programs,
            config,
            preset,
            published,
            json,
        } => run_check(&programs, config, preset, &published, json),
        Commands::Publish {
            program,
            output,
            config,
            published,
        } => run_publish(&program, &output, config, &published),
    };

    match outcome {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: Option<PathBuf>, preset: Option<String>) -> Result<EffectConfig> {
    if let Some(path) = path {
        return Ok(EffectConfig::from_yaml(path)?);
    }
    match preset {
        Some(name) => {
            let preset = Preset::from_str(&name).map_err(|_| ConfigError::UnknownPreset(name))?;
            Ok(EffectConfig::from_preset(preset))
        }
        None => Ok(EffectConfig::default()),
    }
}

fn load_published(paths: &[PathBuf]) -> Result<PublishedRegistry> {
    let mut registry = PublishedRegistry::new();
    for path in paths {
        registry.push(PublishedEffects::load(path)?);
    }
    Ok(registry)
}

/// `Ok(true)` when every unit is free of violations
fn run_check(
    programs: &[PathBuf],
    config: Option<PathBuf>,
    preset: Option<String>,
    published: &[PathBuf],
    json: bool,
) -> Result<bool> {
    let config = load_config(config, preset)?;
    let analyzer = UnitAnalyzer::new(config).with_published(load_published(published)?);

    let programs = programs
        .iter()
        .map(load_program)
        .collect::<Result<Vec<_>>>()?;

    let mut results = Vec::with_capacity(programs.len());
    for result in analyze_units_with(&analyzer, &programs) {
        results.push(result?);
    }

    if json {
        print_json(&results)?;
    } else {
        print_text(&results);
    }

    Ok(results.iter().all(|r| !r.has_errors()))
}

fn print_text(results: &[UnitResult]) {
    for result in results {
        for diagnostic in &result.diagnostics {
            println!("{}: {}", result.unit, diagnostic);
        }
        eprintln!(
            "{}: {} violation(s), {}",
            result.unit,
            result.violations.len(),
            result.metrics.summary()
        );
    }
}

fn print_json(results: &[UnitResult]) -> Result<()> {
    let output: Vec<_> = results
        .iter()
        .map(|result| {
            serde_json::json!({
                "unit": result.unit,
                "has_errors": result.has_errors(),
                "passes": result.metrics.passes,
                "converged": result.metrics.converged,
                "diagnostics": result.diagnostics,
                "violations": result.violations,
            })
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn run_publish(
    program: &Path,
    output: &Path,
    config: Option<PathBuf>,
    published: &[PathBuf],
) -> Result<bool> {
    let config = load_config(config, None)?;
    let analyzer = UnitAnalyzer::new(config).with_published(load_published(published)?);
    let program = load_program(program)?;
    let result = analyzer.analyze(&program)?;

    let table = result.published();
    table.save(output)?;
    tracing::info!(
        unit = %result.unit,
        routines = table.len(),
        path = %output.display(),
        "published effects written"
    );
    eprintln!(
        "{}: published {} routine(s) to {}",
        result.unit,
        table.len(),
        output.display()
    );
    Ok(true)
}
