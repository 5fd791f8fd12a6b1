//! Command-line front end: generate | check.

use std::path::{Path, PathBuf};

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use rayon::prelude::*;
use tracing::info;

use crate::assemble;
use crate::model::Interface;
use crate::validate::{self, Severity};

// ---------------------------------- Types ---------------------------------- //

/// Turn parsed RPC interface models into schema-construction source files.
#[derive(Parser, Debug)]
#[command(name = "rpc-schemagen", version)]
pub struct CommandLineInterface {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// generate declaration and schema artifacts for each input model
    Generate(GenerateArgs),
    /// validate input models and print every finding
    Check(CheckArgs),
}

#[derive(Args, Debug, Clone)]
struct InputSettings {
    /// One or more inputs. May be literal paths or quoted glob patterns
    #[arg(long, short, num_args = 1.., required = true)]
    input: Vec<String>,
}

#[derive(Args, Debug)]
struct GenerateArgs {
    #[command(flatten)]
    input_settings: InputSettings,

    /// `::`-separated namespace wrapping all generated declarations
    #[arg(long, default_value = "")]
    namespace: String,

    /// destination directory; must already exist
    #[arg(long, short)]
    out_dir: PathBuf,
}

#[derive(Args, Debug)]
struct CheckArgs {
    #[command(flatten)]
    input_settings: InputSettings,
}

// ------------------------------ Implementation ----------------------------- //

impl CommandLineInterface {
    pub fn load() -> Self {
        Self::parse()
    }

    pub fn run(&self) -> anyhow::Result<()> {
        match &self.cmd {
            Command::Generate(target) => {
                let inputs = resolve_file_path_patterns(&target.input_settings.input)?;
                // Each generation call is pure over its own model snapshot
                // with per-call state, so inputs run in parallel.
                inputs.par_iter().try_for_each(|path| {
                    let interface = load_model(path)?;
                    let filename = path
                        .file_name()
                        .and_then(|n| n.to_str())
                        .with_context(|| {
                            format!("input path {} has no file name", path.display())
                        })?;
                    assemble::generate(&interface, filename, &target.namespace, &target.out_dir)
                        .with_context(|| format!("generation failed for {}", path.display()))?;
                    info!(input = %path.display(), "artifacts written");
                    Ok(())
                })
            }
            Command::Check(target) => {
                let inputs = resolve_file_path_patterns(&target.input_settings.input)?;
                let mut failed = false;
                for path in &inputs {
                    let interface = load_model(path)?;
                    let findings = validate::validate(&interface);
                    if findings.is_empty() {
                        println!("{} {}", "ok".green().bold(), path.display());
                        continue;
                    }
                    for finding in &findings {
                        let tag = match finding.severity {
                            Severity::Error => "error".red().bold(),
                            Severity::Warning => "warning".yellow().bold(),
                        };
                        println!(
                            "{tag} {}: {}: {}",
                            path.display(),
                            finding.location,
                            finding.message
                        );
                        failed = failed || finding.severity == Severity::Error;
                    }
                }
                if failed {
                    bail!("one or more interface models have errors");
                }
                Ok(())
            }
        }
    }
}

fn load_model(path: &Path) -> anyhow::Result<Interface> {
    let source = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read interface model {}", path.display()))?;
    let mut deserializer = serde_json::Deserializer::from_str(&source);
    let interface = serde_path_to_error::deserialize(&mut deserializer)
        .with_context(|| format!("failed to parse interface model {}", path.display()))?;
    Ok(interface)
}

// ----------------------------- Internal helpers ---------------------------- //

fn resolve_file_path_patterns<I>(patterns: I) -> anyhow::Result<Vec<PathBuf>>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    fn has_glob_chars(s: &str) -> bool {
        // Minimal glob detection for the `glob` crate syntax.
        s.bytes().any(|b| matches!(b, b'*' | b'?' | b'[' | b'{'))
    }

    let mut out = Vec::<PathBuf>::new();

    for raw in patterns {
        let pattern = raw.as_ref();

        if has_glob_chars(pattern) {
            let mut matched_any = false;
            for entry in glob::glob(pattern)? {
                out.push(entry?);
                matched_any = true;
            }
            if !matched_any {
                // Pattern was explicitly a glob but matched nothing -> surface as an error
                bail!("glob pattern matched no files: {pattern}");
            }
        } else {
            // Treat as a literal path
            out.push(PathBuf::from(pattern));
        }
    }

    Ok(out)
}
