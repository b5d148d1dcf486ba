//! mfd CLI
//!
//! Checks, reformats, merges and renders mfd projects.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mfd_schemas::codegen::{self, CodegenContext, Renderer, SummaryPacker};
use mfd_schemas::document::{self, project_dir};
use mfd_schemas::{MfdConfig, Project};
use similar::TextDiff;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "mfd")]
#[command(about = "Check, merge and render mfd projects")]
struct Cli {
    /// Manifest document (overrides the configured one)
    #[arg(short, long, global = true)]
    manifest: Option<PathBuf>,

    /// Configuration file
    #[arg(short, long, global = true)]
    config: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load, link and check the project
    Check,

    /// Rewrite every document in canonical form
    Format {
        /// Only report documents that would change
        #[arg(long)]
        check: bool,
    },

    /// Fold a freshly scanned project into this one
    Merge {
        /// Manifest of the scanned project
        #[arg(long)]
        from: PathBuf,
    },

    /// List namespaces and their entities
    Namespaces,

    /// Show the effective configuration
    Config {
        /// Write it to this file instead of printing it
        #[arg(long)]
        write: Option<String>,
    },

    /// Sync translation documents with the view templates
    Translate {
        /// Languages to sync (default: configured, then the project's own)
        #[arg(long, value_delimiter = ',')]
        langs: Vec<String>,

        /// Restrict to these namespaces
        #[arg(long, value_delimiter = ',')]
        namespaces: Vec<String>,
    },

    /// Render a handlebars template against the project summary
    Render {
        /// Template file
        #[arg(short, long)]
        template: PathBuf,
        /// Output file
        #[arg(short, long)]
        output: PathBuf,
        /// Restrict to these namespaces
        #[arg(long, value_delimiter = ',')]
        namespaces: Vec<String>,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = MfdConfig::load_from(cli.config.as_deref()).context("loading configuration")?;
    let manifest = cli.manifest.unwrap_or_else(|| config.project.manifest.clone());

    match cli.command {
        Commands::Check => {
            let project = open(&manifest, &config)?;
            let entities = project.entities().count();
            let vt_entities = project.vt_entities().count();
            println!(
                "✓ {}: {} namespaces, {} entities, {} view templates",
                project.name,
                project.namespaces.len(),
                entities,
                vt_entities
            );
        }

        Commands::Format { check } => {
            let project = open(&manifest, &config)?;
            let documents = document::render_project(&project, &manifest, &config.write_options())?;

            let mut changed = 0;
            for (path, content) in &documents {
                let current = fs::read_to_string(path).unwrap_or_default();
                if current == *content {
                    continue;
                }
                changed += 1;

                if check {
                    let diff = TextDiff::from_lines(current.as_str(), content.as_str());
                    let before = format!("a/{}", path.display());
                    let after = format!("b/{}", path.display());
                    print!("{}", diff.unified_diff().header(&before, &after));
                } else {
                    fs::write(path, content).with_context(|| format!("writing {}", path.display()))?;
                    println!("formatted {}", path.display());
                }
            }

            for path in document::stale_documents(&project, &manifest) {
                changed += 1;
                if check {
                    println!("stale {}", path.display());
                } else {
                    fs::remove_file(&path).with_context(|| format!("removing {}", path.display()))?;
                    println!("removed {}", path.display());
                }
            }

            if check && changed > 0 {
                bail!("{} document(s) not in canonical form", changed);
            }
        }

        Commands::Merge { from } => {
            let mut project = open(&manifest, &config)?;
            let fresh = document::read_project(&from, &Default::default())
                .with_context(|| format!("reading scanned project {}", from.display()))?;

            let report = project.merge(fresh, config.merge_policy())?;
            if config.validation.reserved_names {
                project.validate_names()?;
            }
            project.save(&manifest, &config.write_options())?;
            info!(manifest = %manifest.display(), "saved merged project");
            println!("{}", serde_json::to_string_pretty(&report)?);
        }

        Commands::Namespaces => {
            let project = open(&manifest, &config)?;
            for ns in &project.namespaces {
                println!("{} ({} entities)", ns.name, ns.entities.len());
                for name in ns.entity_names() {
                    println!("  {}", name);
                }
            }
        }

        Commands::Config { write } => match write {
            Some(path) => {
                config.save(&path).with_context(|| format!("writing {}", path))?;
                println!("wrote {}", path);
            }
            None => print!("{}", toml::to_string_pretty(&config)?),
        },

        Commands::Translate { langs, namespaces } => {
            let project = open(&manifest, &config)?;
            let languages = if !langs.is_empty() {
                langs
            } else if !config.translation.languages.is_empty() {
                config.translation.languages.clone()
            } else {
                project.languages.clone()
            };
            let only = (!namespaces.is_empty()).then_some(namespaces.as_slice());

            let written = document::sync_translations(
                &project,
                &project_dir(&manifest),
                &languages,
                only,
                &config.write_options(),
            )?;
            for path in written {
                println!("synced {}", path.display());
            }
        }

        Commands::Render {
            template,
            output,
            namespaces,
        } => {
            let project = open(&manifest, &config)?;
            let ctx = CodegenContext::build(&project)?;

            let mut renderer = Renderer::new();
            renderer.register_template_file("main", &template)?;
            let only = (!namespaces.is_empty()).then_some(namespaces.as_slice());

            if codegen::generate(&ctx, &SummaryPacker, &renderer, "main", only, &output)? {
                println!("generated {}", output.display());
            } else {
                println!("unchanged {}", output.display());
            }
        }
    }

    Ok(())
}

fn open(manifest: &Path, config: &MfdConfig) -> Result<Project> {
    let project = Project::open(manifest, &config.load_options())
        .with_context(|| format!("opening project {}", manifest.display()))?;
    if config.validation.reserved_names {
        project.validate_names()?;
    }
    Ok(project)
}
