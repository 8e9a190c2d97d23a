// ABOUTME: drives one generation run: enumerate the catalog, assemble each type, persist each document.
// ABOUTME: catalog failures abort before any write; per-type failures are collected unless fail-fast is set.

use std::path::PathBuf;

use anyhow::Context;
use jsonschemes_common::policy::{ConstraintPolicy, TypeDirectives};

use crate::assembler::Assembler;
use crate::catalog::{CatalogError, TypeCatalog};
use crate::config::GeneratorConfig;
use crate::sink::{OutputSink, SinkError};

#[derive(Debug)]
pub struct TypeFailure {
    pub type_name: String,
    pub error: SinkError,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub written: Vec<PathBuf>,
    pub failures: Vec<TypeFailure>,
}

impl RunSummary {
    pub fn into_result(self) -> anyhow::Result<()> {
        if self.failures.is_empty() {
            return Ok(());
        }

        let details = self
            .failures
            .iter()
            .map(|f| format!("  {}: {}", f.type_name, f.error))
            .collect::<Vec<_>>()
            .join("\n");
        Err(anyhow::anyhow!(
            "{} of {} schema documents could not be written:\n{}",
            self.failures.len(),
            self.failures.len() + self.written.len(),
            details
        ))
    }
}

pub async fn run<C, P>(
    config: &GeneratorConfig,
    catalog: &C,
    policy: &P,
    base_package: &str,
) -> anyhow::Result<RunSummary>
where
    C: TypeCatalog + ?Sized,
    P: ConstraintPolicy,
{
    tracing::info!(base_package, output_dir = %config.output_dir.display(), "scanning base package");

    let types = catalog
        .enumerate(base_package)
        .with_context(|| format!("enumerate types under {base_package}"))?;
    tracing::info!(count = types.len(), "types found");

    let sink = OutputSink::new(config);
    sink.prepare().await.context("prepare output directory")?;

    let assembler = Assembler::new(catalog, policy, config.dialect);
    let mut summary = RunSummary::default();
    for ty in types {
        let document = assembler.assemble(ty);
        match sink.persist(&document).await {
            Ok(path) => {
                tracing::info!(type_name = %ty.name, path = %path.display(), "schema written");
                summary.written.push(path);
            }
            Err(err) => {
                tracing::error!(type_name = %ty.name, error = %err, "schema write failed");
                if config.fail_fast {
                    return Err(err).with_context(|| format!("persist schema for {}", ty.name));
                }
                summary.failures.push(TypeFailure {
                    type_name: ty.name.clone(),
                    error: err,
                });
            }
        }
    }

    Ok(summary)
}

pub fn directives<C, P>(
    catalog: &C,
    policy: &P,
    base_package: &str,
) -> Result<Vec<TypeDirectives>, CatalogError>
where
    C: TypeCatalog + ?Sized,
    P: ConstraintPolicy,
{
    Ok(catalog
        .enumerate(base_package)?
        .into_iter()
        .map(|ty| policy.decide_all(ty))
        .collect())
}
