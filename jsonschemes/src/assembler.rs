// ABOUTME: builds the json schema document for one catalog type from the policy's directives.
// ABOUTME: field directives are applied while walking fields, type-level defaults via a schemars transform.

use std::collections::{BTreeSet, VecDeque};

use jsonschemes_common::policy::{ConstraintDirective, ConstraintPolicy, EnumRepresentation, Scope};
use jsonschemes_common::{TypeDescriptor, TypeKind, TypeReference};
use schemars::transform::{transform_subschemas, Transform};
use schemars::{json_schema, Schema};
use serde_json::{Map, Value};

use crate::catalog::TypeCatalog;
use crate::config::SchemaDialect;

#[derive(Debug, Clone)]
pub struct SchemaDocument {
    pub qualified_name: String,
    pub schema: Schema,
}

impl SchemaDocument {
    /// Pretty-printed UTF-8 text with a trailing newline.
    pub fn render(&self) -> Result<String, serde_json::Error> {
        let mut text = serde_json::to_string_pretty(&self.schema)?;
        text.push('\n');
        Ok(text)
    }
}

pub struct Assembler<'a, C: ?Sized, P> {
    catalog: &'a C,
    policy: &'a P,
    dialect: SchemaDialect,
}

struct Walk<'t> {
    root: &'t str,
    queued: BTreeSet<String>,
    queue: VecDeque<String>,
}

impl<'a, C, P> Assembler<'a, C, P>
where
    C: TypeCatalog + ?Sized,
    P: ConstraintPolicy,
{
    pub fn new(catalog: &'a C, policy: &'a P, dialect: SchemaDialect) -> Self {
        Self {
            catalog,
            policy,
            dialect,
        }
    }

    pub fn assemble(&self, ty: &TypeDescriptor) -> SchemaDocument {
        let mut walk = Walk {
            root: &ty.name,
            queued: BTreeSet::new(),
            queue: VecDeque::new(),
        };

        let mut schema = self.type_schema(ty, &mut walk);

        let mut definitions = Map::new();
        while let Some(name) = walk.queue.pop_front() {
            let Some(def) = self.catalog.resolve(&name) else {
                continue;
            };
            let def_schema = self.type_schema(def, &mut walk);
            definitions.insert(name, def_schema.to_value());
        }
        if !definitions.is_empty() {
            schema.insert(
                self.dialect.definitions_keyword().to_string(),
                Value::Object(definitions),
            );
        }

        let type_level = self.policy.decide(Scope::Type(ty));
        TypeLevelDefaults::from_directive(&type_level).transform(&mut schema);

        schema.insert(
            "$schema".to_string(),
            Value::String(self.dialect.meta_schema().to_string()),
        );

        SchemaDocument {
            qualified_name: ty.name.clone(),
            schema,
        }
    }

    fn type_schema(&self, ty: &TypeDescriptor, walk: &mut Walk<'_>) -> Schema {
        if ty.kind == TypeKind::Enum {
            let values: Vec<Value> = ty
                .constants
                .iter()
                .map(|c| match self.policy.enum_representation() {
                    EnumRepresentation::ByName => Value::String(c.name.clone()),
                    EnumRepresentation::ByStringConversion => {
                        Value::String(c.display.clone().unwrap_or_else(|| c.name.clone()))
                    }
                })
                .collect();
            return json_schema!({
                "type": "string",
                "enum": values,
            });
        }

        let mut properties = Map::new();
        let mut required = Vec::new();
        for field in &ty.fields {
            let directive = self.policy.decide(Scope::Field(field));
            let (base, explicitly_nullable) = strip_nullable(&field.ty);

            let mut field_schema = self.reference_schema(base, directive.nullable_default, walk);
            apply_field_directive(&mut field_schema, &directive);

            let nullable = explicitly_nullable || (directive.nullable_default && !field.required);
            if nullable {
                field_schema = make_nullable(field_schema);
            }
            if field.required {
                required.push(Value::String(field.name.clone()));
            }
            properties.insert(field.name.clone(), field_schema.to_value());
        }

        let mut schema = json_schema!({
            "type": "object",
            "properties": properties,
        });
        if !required.is_empty() {
            schema.insert("required".to_string(), Value::Array(required));
        }
        schema
    }

    /// `nullable_elements` marks array items and map values as accepting null.
    fn reference_schema(
        &self,
        ty: &TypeReference,
        nullable_elements: bool,
        walk: &mut Walk<'_>,
    ) -> Schema {
        match ty {
            TypeReference::Int8
            | TypeReference::Int16
            | TypeReference::Int32
            | TypeReference::Int64
            | TypeReference::BigInteger => json_schema!({ "type": "integer" }),
            TypeReference::Float32 | TypeReference::Float64 | TypeReference::BigDecimal => {
                json_schema!({ "type": "number" })
            }
            TypeReference::Boolean => json_schema!({ "type": "boolean" }),
            TypeReference::Text => json_schema!({ "type": "string" }),
            TypeReference::Nullable { inner } => {
                make_nullable(self.reference_schema(inner, nullable_elements, walk))
            }
            TypeReference::Array { items } => {
                let items = self.element_schema(items, nullable_elements, walk);
                json_schema!({
                    "type": "array",
                    "items": items,
                })
            }
            TypeReference::Map { values } => {
                let values = self.element_schema(values, nullable_elements, walk);
                json_schema!({
                    "type": "object",
                    "additionalProperties": values,
                })
            }
            TypeReference::Named { name, .. } => self.named_schema(name, walk),
        }
    }

    fn element_schema(
        &self,
        ty: &TypeReference,
        nullable_elements: bool,
        walk: &mut Walk<'_>,
    ) -> Schema {
        let (base, explicitly_nullable) = strip_nullable(ty);
        let schema = self.reference_schema(base, nullable_elements, walk);
        if explicitly_nullable || nullable_elements {
            make_nullable(schema)
        } else {
            schema
        }
    }

    fn named_schema(&self, name: &str, walk: &mut Walk<'_>) -> Schema {
        if name == walk.root {
            return json_schema!({ "$ref": "#" });
        }
        if self.catalog.resolve(name).is_none() {
            tracing::warn!(root = walk.root, type_name = name, "unresolved type reference, leaving unconstrained");
            return json_schema!({});
        }
        if walk.queued.insert(name.to_string()) {
            walk.queue.push_back(name.to_string());
        }
        let reference = format!("#/{}/{}", self.dialect.definitions_keyword(), name);
        json_schema!({ "$ref": reference })
    }
}

fn strip_nullable(ty: &TypeReference) -> (&TypeReference, bool) {
    let mut current = ty;
    let mut nullable = false;
    while let TypeReference::Nullable { inner } = current {
        current = &**inner;
        nullable = true;
    }
    (current, nullable)
}

fn apply_field_directive(schema: &mut Schema, directive: &ConstraintDirective) {
    if let Some(minimum) = &directive.minimum {
        schema.insert("minimum".to_string(), Value::Number(minimum.clone()));
    }
    if let Some(maximum) = &directive.maximum {
        schema.insert("maximum".to_string(), Value::Number(maximum.clone()));
    }
    if let Some(max_length) = directive.max_length {
        schema.insert("maxLength".to_string(), Value::from(max_length));
    }
    if let Some(max_items) = directive.max_items {
        schema.insert("maxItems".to_string(), Value::from(max_items));
    }
}

fn make_nullable(mut schema: Schema) -> Schema {
    if schema.as_object().is_some_and(|obj| obj.is_empty()) {
        return schema;
    }
    match schema.get("type").cloned() {
        Some(Value::String(t)) => {
            schema.insert(
                "type".to_string(),
                Value::Array(vec![Value::String(t), Value::String("null".to_string())]),
            );
            schema
        }
        Some(Value::Array(mut types)) => {
            if !types.iter().any(|t| t.as_str() == Some("null")) {
                types.push(Value::String("null".to_string()));
            }
            schema.insert("type".to_string(), Value::Array(types));
            schema
        }
        _ => json_schema!({
            "anyOf": [schema, { "type": "null" }],
        }),
    }
}

fn has_type(schema: &Schema, name: &str) -> bool {
    match schema.get("type") {
        Some(Value::String(t)) => t == name,
        Some(Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(name)),
        _ => false,
    }
}

/// Applies the type-in-general directives to every subschema of a document.
struct TypeLevelDefaults {
    max_items: Option<u32>,
    additional_properties: bool,
}

impl TypeLevelDefaults {
    fn from_directive(directive: &ConstraintDirective) -> Self {
        Self {
            max_items: directive.max_items,
            additional_properties: directive.additional_properties_allowed,
        }
    }
}

impl Transform for TypeLevelDefaults {
    fn transform(&mut self, schema: &mut Schema) {
        if let Some(max_items) = self.max_items {
            if has_type(schema, "array") && schema.get("maxItems").is_none() {
                schema.insert("maxItems".to_string(), Value::from(max_items));
            }
        }
        if has_type(schema, "object") && schema.get("additionalProperties").is_none() {
            schema.insert(
                "additionalProperties".to_string(),
                Value::Bool(self.additional_properties),
            );
        }
        transform_subschemas(self, schema);
    }
}
