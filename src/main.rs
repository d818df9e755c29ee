//! # Releve CLI
//!
//! Command-line interface for KPI report generation.
//!
//! ## Usage
//!
//! ```bash
//! # Compose a PDF (default layout when no config or no pages)
//! releve compose --report report.json --config template.json --output rapport.pdf
//!
//! # Check a template configuration
//! releve validate --config template.json
//!
//! # Print the analysis text of every KPI
//! releve analysis --report report.json --config template.json
//!
//! # Run the HTTP API
//! releve serve --listen 0.0.0.0:8080
//! ```
//!
//! Logging goes through `RUST_LOG` (e.g. `RUST_LOG=releve=debug`).

use clap::{Parser, Subcommand};
use serde_json::Value;
use std::path::{Path, PathBuf};
use std::time::Duration;

use releve::{
    ReleveError, ReportData, TemplateConfig,
    analysis::generate_all_analysis_texts,
    compose::{ComposeOptions, HttpImageLoader, generate_document},
    config::{PageFormat, clean_template_config, validate_template_config},
    server::{self, ServerConfig},
};

/// Releve - template-driven KPI report generator
#[derive(Parser, Debug)]
#[command(name = "releve")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compose a report PDF
    Compose {
        /// Report data JSON
        #[arg(long, value_name = "FILE")]
        report: PathBuf,

        /// Template configuration JSON (omit for the default layout)
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,

        /// Output PDF path (defaults to rapport-<client>-<yyyy>-<mm>.pdf)
        #[arg(long, short, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Use A4 landscape pages regardless of the template
        #[arg(long)]
        landscape: bool,

        /// Per-image load timeout in seconds
        #[arg(long, default_value = "15")]
        timeout: u64,
    },

    /// Validate a template configuration
    Validate {
        /// Template configuration JSON
        #[arg(long, value_name = "FILE")]
        config: PathBuf,

        /// Print the cleaned configuration
        #[arg(long)]
        clean: bool,
    },

    /// Print the analysis text of every KPI
    Analysis {
        /// Report data JSON
        #[arg(long, value_name = "FILE")]
        report: PathBuf,

        /// Template configuration JSON providing trend templates
        #[arg(long, value_name = "FILE")]
        config: Option<PathBuf>,
    },

    /// Run the HTTP API server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,

        /// Per-image load timeout in seconds
        #[arg(long, default_value = "15")]
        timeout: u64,
    },
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn read_json(path: &Path) -> Result<Value, ReleveError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn read_report(path: &Path) -> Result<ReportData, ReleveError> {
    let text = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&text)?)
}

fn read_config(path: Option<&Path>) -> Result<TemplateConfig, ReleveError> {
    match path {
        Some(path) => Ok(clean_template_config(&read_json(path)?)),
        None => Ok(TemplateConfig::default_layout()),
    }
}

fn runtime() -> Result<tokio::runtime::Runtime, ReleveError> {
    Ok(tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?)
}

fn run() -> Result<(), ReleveError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Compose {
            report,
            config,
            output,
            landscape,
            timeout,
        } => {
            let data = read_report(&report)?;
            let config = read_config(config.as_deref())?;
            let options = ComposeOptions {
                page_format: landscape.then_some(PageFormat::A4_LANDSCAPE),
                load_timeout: Duration::from_secs(timeout),
            };
            let output =
                output.unwrap_or_else(|| PathBuf::from(format!("{}.pdf", data.file_stem())));

            let document = runtime()?.block_on(async {
                let loader = HttpImageLoader::new()?;
                generate_document(&data, &config, &loader, &options).await
            })?;
            std::fs::write(&output, &document.pdf)?;
            println!(
                "Wrote {} ({} page(s), {} bytes)",
                output.display(),
                document.page_count(),
                document.pdf.len()
            );
        }

        Commands::Validate { config, clean } => {
            let raw = read_json(&config)?;
            let report = validate_template_config(&raw);
            if clean {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&clean_template_config(&raw))?
                );
            }
            if report.valid {
                println!("Configuration is valid");
            } else {
                for error in &report.errors {
                    println!("  - {}", error);
                }
            }
            report.into_result()?;
        }

        Commands::Analysis { report, config } => {
            let data = read_report(&report)?;
            let templates = read_config(config.as_deref())?.non_empty_templates();
            for (category, text) in generate_all_analysis_texts(&data, Some(&templates)) {
                println!("{}:\n  {}\n", category.label(), text);
            }
        }

        Commands::Serve { listen, timeout } => {
            let config = ServerConfig {
                listen_addr: listen,
                load_timeout: Duration::from_secs(timeout),
            };
            runtime()?.block_on(server::serve(config))?;
        }
    }

    Ok(())
}
