// ABOUTME: defines the type manifest model shared by the generator cli and its tooling.
// ABOUTME: provides parsing and validation helpers so every run sees a well-formed catalog.

use std::collections::BTreeSet;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub mod policy;

pub const MANIFEST_VERSION: &str = "1";

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TypeManifest {
    pub version: String,
    pub types: Vec<TypeDescriptor>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TypeKind {
    Class,
    Abstract,
    Interface,
    Enum,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TypeDescriptor {
    pub name: String,
    pub kind: TypeKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDescriptor>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub constants: Vec<EnumConstant>,
}

impl TypeDescriptor {
    pub fn class(name: &str, fields: Vec<FieldDescriptor>) -> Self {
        Self {
            name: name.to_string(),
            kind: TypeKind::Class,
            fields,
            constants: vec![],
        }
    }

    pub fn enumeration(name: &str, constants: Vec<EnumConstant>) -> Self {
        Self {
            name: name.to_string(),
            kind: TypeKind::Enum,
            fields: vec![],
            constants,
        }
    }

    pub fn simple_name(&self) -> &str {
        split_qualified_name(&self.name).1
    }

    pub fn namespace(&self) -> Option<&str> {
        split_qualified_name(&self.name).0
    }

    /// Abstract types and interfaces are never emitted on their own.
    pub fn is_concrete(&self) -> bool {
        matches!(self.kind, TypeKind::Class | TypeKind::Enum)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct FieldDescriptor {
    pub name: String,
    #[serde(rename = "type")]
    pub ty: TypeReference,
    #[serde(default)]
    pub required: bool,
}

impl FieldDescriptor {
    pub fn new(name: &str, ty: TypeReference) -> Self {
        Self {
            name: name.to_string(),
            ty,
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct EnumConstant {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl EnumConstant {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            display: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case", deny_unknown_fields)]
pub enum TypeReference {
    Int8,
    Int16,
    Int32,
    Int64,
    BigInteger,
    Float32,
    Float64,
    BigDecimal,
    Boolean,
    Text,
    Nullable {
        inner: Box<TypeReference>,
    },
    Array {
        items: Box<TypeReference>,
    },
    Map {
        values: Box<TypeReference>,
    },
    Named {
        name: String,
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        args: Vec<TypeReference>,
    },
}

impl TypeReference {
    pub fn nullable(inner: TypeReference) -> Self {
        TypeReference::Nullable {
            inner: Box::new(inner),
        }
    }

    pub fn array(items: TypeReference) -> Self {
        TypeReference::Array {
            items: Box::new(items),
        }
    }

    pub fn map(values: TypeReference) -> Self {
        TypeReference::Map {
            values: Box::new(values),
        }
    }

    pub fn named(name: &str) -> Self {
        TypeReference::Named {
            name: name.to_string(),
            args: vec![],
        }
    }

    /// Strips nullable wrappers and generic arguments, leaving the underlying representation.
    pub fn erased(&self) -> TypeReference {
        match self {
            TypeReference::Nullable { inner } => inner.erased(),
            TypeReference::Named { name, .. } => TypeReference::named(name),
            other => other.clone(),
        }
    }

    fn referenced_names<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            TypeReference::Nullable { inner } => inner.referenced_names(out),
            TypeReference::Array { items } => items.referenced_names(out),
            TypeReference::Map { values } => values.referenced_names(out),
            TypeReference::Named { name, args } => {
                out.push(name);
                for arg in args {
                    arg.referenced_names(out);
                }
            }
            _ => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct ValidationError {
    pub message: String,
}

impl ValidationError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    ReadFailed,
    ParseFailed,
    ValidationFailed,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct RequestError {
    pub code: ErrorCode,
    pub message: String,
}

pub fn parse_manifest(input: &str) -> Result<TypeManifest, serde_json::Error> {
    serde_json::from_str(input)
}

/// Splits `a.b.Widget` into `(Some("a.b"), "Widget")`.
pub fn split_qualified_name(name: &str) -> (Option<&str>, &str) {
    match name.rsplit_once('.') {
        Some((namespace, simple)) => (Some(namespace), simple),
        None => (None, name),
    }
}

pub fn is_valid_qualified_name(name: &str) -> bool {
    !name.is_empty() && name.split('.').all(is_valid_segment)
}

fn is_valid_segment(segment: &str) -> bool {
    let mut chars = segment.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == '$' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

pub fn validate_manifest(manifest: &TypeManifest) -> Result<(), ValidationError> {
    if manifest.version != MANIFEST_VERSION {
        return Err(ValidationError::new(format!(
            "unsupported manifest version {:?}, expected {:?}",
            manifest.version, MANIFEST_VERSION
        )));
    }

    let mut seen_types = BTreeSet::new();
    for ty in &manifest.types {
        if !is_valid_qualified_name(&ty.name) {
            return Err(ValidationError::new(format!("invalid type name {:?}", ty.name)));
        }
        if !seen_types.insert(ty.name.as_str()) {
            return Err(ValidationError::new(format!("duplicate type {}", ty.name)));
        }
        validate_type(ty)?;
    }

    Ok(())
}

fn validate_type(ty: &TypeDescriptor) -> Result<(), ValidationError> {
    match ty.kind {
        TypeKind::Enum => {
            if ty.constants.is_empty() {
                return Err(ValidationError::new(format!("enum {} has no constants", ty.name)));
            }
            let mut seen = BTreeSet::new();
            for constant in &ty.constants {
                if constant.name.trim().is_empty() {
                    return Err(ValidationError::new(format!(
                        "enum {} has a constant with an empty name",
                        ty.name
                    )));
                }
                if !seen.insert(constant.name.as_str()) {
                    return Err(ValidationError::new(format!(
                        "enum {} declares constant {} twice",
                        ty.name, constant.name
                    )));
                }
            }
            if !ty.fields.is_empty() {
                return Err(ValidationError::new(format!(
                    "enum {} declares fields",
                    ty.name
                )));
            }
        }
        _ => {
            if !ty.constants.is_empty() {
                return Err(ValidationError::new(format!(
                    "{} declares constants but is not an enum",
                    ty.name
                )));
            }
        }
    }

    let mut seen = BTreeSet::new();
    for field in &ty.fields {
        if field.name.trim().is_empty() {
            return Err(ValidationError::new(format!(
                "{} has a field with an empty name",
                ty.name
            )));
        }
        if !seen.insert(field.name.as_str()) {
            return Err(ValidationError::new(format!(
                "{} declares field {} twice",
                ty.name, field.name
            )));
        }

        let mut names = Vec::new();
        field.ty.referenced_names(&mut names);
        if let Some(bad) = names.into_iter().find(|n| !is_valid_qualified_name(n)) {
            return Err(ValidationError::new(format!(
                "{}.{} references invalid type name {:?}",
                ty.name, field.name, bad
            )));
        }
    }

    Ok(())
}
