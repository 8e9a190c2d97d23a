// ABOUTME: loads type manifests from the classpath and enumerates concrete types under a namespace.
// ABOUTME: replaces runtime class scanning with an explicit registry so enumeration is deterministic.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use jsonschemes_common::{
    is_valid_qualified_name, parse_manifest, validate_manifest, ErrorCode, RequestError,
    TypeDescriptor, TypeManifest,
};

#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    #[error("read manifest {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("parse manifest {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid manifest {}: {message}", .path.display())]
    Invalid { path: PathBuf, message: String },
    #[error("invalid root namespace {0:?}")]
    InvalidNamespace(String),
    #[error("classpath is empty")]
    EmptyClasspath,
}

pub trait TypeCatalog {
    /// Every concrete type under `root_namespace`, ordered by qualified name.
    fn enumerate(&self, root_namespace: &str) -> Result<Vec<&TypeDescriptor>, CatalogError>;

    fn resolve(&self, qualified_name: &str) -> Option<&TypeDescriptor>;
}

#[derive(Debug, Default)]
pub struct Registry {
    types: BTreeMap<String, TypeDescriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// First registration of a name wins, matching classpath shadowing.
    pub fn register(&mut self, ty: TypeDescriptor) -> bool {
        if self.types.contains_key(&ty.name) {
            tracing::debug!(type_name = %ty.name, "type already registered, ignoring shadowed definition");
            return false;
        }
        self.types.insert(ty.name.clone(), ty);
        true
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub async fn from_classpath(classpath: &[PathBuf]) -> Result<Self, CatalogError> {
        if classpath.is_empty() {
            return Err(CatalogError::EmptyClasspath);
        }

        let mut registry = Self::new();
        for path in classpath {
            let manifest = load_manifest(path).await?;
            tracing::debug!(path = %path.display(), types = manifest.types.len(), "loaded manifest");
            for ty in manifest.types {
                registry.register(ty);
            }
        }
        Ok(registry)
    }
}

impl TypeCatalog for Registry {
    fn enumerate(&self, root_namespace: &str) -> Result<Vec<&TypeDescriptor>, CatalogError> {
        if !is_valid_qualified_name(root_namespace) {
            return Err(CatalogError::InvalidNamespace(root_namespace.to_string()));
        }

        let prefix = format!("{root_namespace}.");
        let found: Vec<&TypeDescriptor> = self
            .types
            .range(prefix.clone()..)
            .take_while(|(name, _)| name.starts_with(&prefix))
            .map(|(_, ty)| ty)
            .filter(|ty| ty.is_concrete())
            .collect();

        if found.is_empty() {
            tracing::warn!(root_namespace, "no concrete types found under namespace");
        }
        Ok(found)
    }

    fn resolve(&self, qualified_name: &str) -> Option<&TypeDescriptor> {
        self.types.get(qualified_name)
    }
}

pub async fn load_manifest(path: &Path) -> Result<TypeManifest, CatalogError> {
    let input = tokio::fs::read_to_string(path)
        .await
        .map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;

    let manifest = parse_manifest(&input).map_err(|source| CatalogError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    validate_manifest(&manifest).map_err(|err| CatalogError::Invalid {
        path: path.to_path_buf(),
        message: err.message,
    })?;

    Ok(manifest)
}

#[derive(Debug, serde::Serialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct ValidateVerdict {
    pub path: String,
    pub ok: bool,
    pub error: Option<RequestError>,
}

pub fn validate_verdict(path: &str, input: &str) -> ValidateVerdict {
    let error = match parse_manifest(input) {
        Ok(manifest) => validate_manifest(&manifest).err().map(|err| RequestError {
            code: ErrorCode::ValidationFailed,
            message: err.message,
        }),
        Err(err) => Some(RequestError {
            code: ErrorCode::ParseFailed,
            message: err.to_string(),
        }),
    };

    ValidateVerdict {
        path: path.to_string(),
        ok: error.is_none(),
        error,
    }
}

/// Like `validate_verdict`, but an unreadable file yields a `read_failed` verdict instead of an error.
pub async fn validate_file(path: &Path) -> ValidateVerdict {
    match tokio::fs::read_to_string(path).await {
        Ok(input) => validate_verdict(&path.display().to_string(), &input),
        Err(err) => ValidateVerdict {
            path: path.display().to_string(),
            ok: false,
            error: Some(RequestError {
                code: ErrorCode::ReadFailed,
                message: err.to_string(),
            }),
        },
    }
}
