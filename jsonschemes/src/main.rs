// ABOUTME: runs the json schema generator over a type manifest classpath.
// ABOUTME: writes one schema per concrete type under the base package and fails the step on any error.

mod assembler;
mod catalog;
mod config;
mod generator;
mod sink;

use std::path::PathBuf;
use std::str::FromStr;

use anyhow::Context;
use clap::{Parser, Subcommand};
use jsonschemes_common::policy::StandardPolicy;
use tracing::Level;
use tracing_subscriber::fmt::Subscriber;

use crate::catalog::{validate_file, Registry};
use crate::config::{GeneratorConfig, PathLayout, SchemaDialect, DEFAULT_OUTPUT_DIR};

#[derive(Debug, Parser)]
#[command(name = "jsonschemes", version, about = "Generate JSON Schema documents from a type manifest")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, clap::Args)]
struct CatalogArgs {
    #[arg(long, env = "JSON_SCHEMES_BASE_PACKAGE")]
    base_package: String,

    #[arg(
        long,
        env = "JSON_SCHEMES_CLASSPATH",
        required = true,
        num_args = 1..,
        value_delimiter = ':'
    )]
    classpath: Vec<PathBuf>,
}

#[derive(Debug, Subcommand)]
enum Command {
    Generate {
        #[command(flatten)]
        catalog: CatalogArgs,

        #[arg(long, env = "JSON_SCHEMES_OUTPUT_DIR", default_value = DEFAULT_OUTPUT_DIR)]
        output_dir: PathBuf,

        #[arg(long, value_enum, default_value_t = PathLayout::Flat)]
        layout: PathLayout,

        #[arg(long, value_enum, default_value_t = SchemaDialect::Draft2020_12)]
        dialect: SchemaDialect,

        #[arg(long, default_value_t = false)]
        fail_fast: bool,
    },
    Directives {
        #[command(flatten)]
        catalog: CatalogArgs,
    },
    Validate {
        #[arg(
            long,
            env = "JSON_SCHEMES_CLASSPATH",
            required = true,
            num_args = 1..,
            value_delimiter = ':'
        )]
        classpath: Vec<PathBuf>,
    },
}

fn init_tracing() {
    let log_level = std::env::var("LOG_LEVEL")
        .ok()
        .and_then(|l| Level::from_str(&l).ok())
        .unwrap_or(Level::INFO);

    let subscriber = Subscriber::builder()
        .with_max_level(log_level)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_tracing();

    match args.command {
        Command::Generate {
            catalog,
            output_dir,
            layout,
            dialect,
            fail_fast,
        } => {
            let config = GeneratorConfig {
                layout,
                dialect,
                fail_fast,
                ..GeneratorConfig::new(output_dir)
            };
            let registry = Registry::from_classpath(&catalog.classpath)
                .await
                .context("load type catalog")?;
            tracing::info!(types = registry.len(), "type catalog loaded");
            let summary =
                generator::run(&config, &registry, &StandardPolicy, &catalog.base_package).await?;
            tracing::info!(written = summary.written.len(), failed = summary.failures.len(), "generation finished");
            summary.into_result()?;
        }
        Command::Directives { catalog } => {
            let registry = Registry::from_classpath(&catalog.classpath)
                .await
                .context("load type catalog")?;
            let all = generator::directives(&registry, &StandardPolicy, &catalog.base_package)?;
            println!("{}", serde_json::to_string_pretty(&all)?);
        }
        Command::Validate { classpath } => {
            let mut verdicts = Vec::with_capacity(classpath.len());
            for path in &classpath {
                verdicts.push(validate_file(path).await);
            }
            println!("{}", serde_json::to_string_pretty(&verdicts)?);
            if verdicts.iter().any(|v| !v.ok) {
                anyhow::bail!("manifest validation failed");
            }
        }
    }

    Ok(())
}
