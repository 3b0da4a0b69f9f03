use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use std::process::ExitCode;

use srcmodel::{Settings, read_snapshot};

#[derive(Parser)]
#[command(name = "srcmodel")]
#[command(about = "Inspect and validate source-model snapshots", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize a snapshot: file count, languages, metrics
    Info {
        /// Path to the snapshot file
        snapshot: PathBuf,

        /// Emit machine-readable JSON instead of text
        #[arg(long)]
        json: bool,
    },

    /// Load a snapshot and run the full integrity validator
    Validate {
        /// Path to the snapshot file
        snapshot: PathBuf,
    },

    /// Show the effective configuration as TOML
    Config,
}

fn main() -> ExitCode {
    let settings = match Settings::load() {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error: failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };
    srcmodel::logging::init_with_config(&settings.logging);

    let cli = Cli::parse();
    match run(cli, &settings) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, settings: &Settings) -> Result<(), Box<dyn std::error::Error>> {
    match cli.command {
        Commands::Info { snapshot, json } => {
            let project = load(&snapshot, settings)?;

            if json {
                let files: Vec<_> = project
                    .files()
                    .map(|(_, file)| {
                        serde_json::json!({
                            "path": project.pool().get(file.path),
                            "language": file.language.as_str(),
                            "metrics": file.metrics.iter().map(|m| {
                                serde_json::json!({
                                    "name": project.pool().get(m.name),
                                    "value": m.value,
                                })
                            }).collect::<Vec<_>>(),
                        })
                    })
                    .collect();
                let out = serde_json::json!({
                    "totals": project.totals(),
                    "files": files,
                });
                println!("{}", serde_json::to_string_pretty(&out)?);
            } else {
                let totals = project.totals();
                println!("Snapshot: {}", snapshot.display());
                println!("Files: {}", totals.files);
                for (_, file) in project.files() {
                    let path = project.pool().get(file.path).unwrap_or("<unresolved>");
                    print!("  {path} [{}]", file.language.as_str());
                    for metric in &file.metrics {
                        let name = project.pool().get(metric.name).unwrap_or("<unresolved>");
                        print!(" {name}={}", metric.value);
                    }
                    println!();
                }
            }
            Ok(())
        }
        Commands::Validate { snapshot } => {
            let project = load(&snapshot, settings)?;
            let report = project.validate();
            if report.is_ok() {
                println!(
                    "OK: {} files, {} functions, {} classes, {} variables",
                    report.totals.files,
                    report.totals.functions,
                    report.totals.classes,
                    report.totals.variables
                );
                Ok(())
            } else {
                for issue in &report.issues {
                    eprintln!("  {issue}");
                }
                Err(format!("validation failed with {} issue(s)", report.issues.len()).into())
            }
        }
        Commands::Config => {
            print!("{}", toml::to_string_pretty(settings)?);
            Ok(())
        }
    }
}

fn load(
    path: &PathBuf,
    settings: &Settings,
) -> Result<srcmodel::Project, Box<dyn std::error::Error>> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);
    Ok(read_snapshot(&mut reader, &settings.limits)?)
}
