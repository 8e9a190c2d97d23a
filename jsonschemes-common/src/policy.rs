// ABOUTME: decides which schema constraints apply to a type and to each of its fields.
// ABOUTME: every decision is a pure function of the descriptor so repeated runs stay byte-identical.

use serde::Serialize;
use serde_json::Number;

use crate::{FieldDescriptor, TypeDescriptor, TypeReference};

/// Symmetric bound one unit narrower than the 32-bit signed extremes. Fixed business rule.
pub const NUMERIC_BOUND: i64 = 214_748_624;
pub const STRING_MAX_LENGTH: u32 = 255;
pub const ARRAY_MAX_ITEMS: u32 = 255;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Kind {
    Integer,
    FloatingPoint,
    Text,
    Other,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum EnumRepresentation {
    ByName,
    ByStringConversion,
}

#[derive(Debug, Clone, Copy)]
pub enum Scope<'a> {
    Type(&'a TypeDescriptor),
    Field(&'a FieldDescriptor),
}

/// A constraint decision for one scope. `None` means "do not constrain".
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ConstraintDirective {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub minimum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub maximum: Option<Number>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_items: Option<u32>,
    pub nullable_default: bool,
    pub additional_properties_allowed: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldDirective {
    pub field: String,
    pub kind: Kind,
    pub directive: ConstraintDirective,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TypeDirectives {
    #[serde(rename = "type")]
    pub type_name: String,
    pub type_level: ConstraintDirective,
    pub fields: Vec<FieldDirective>,
    pub enum_representation: EnumRepresentation,
}

pub fn classify(ty: &TypeReference) -> Kind {
    match ty.erased() {
        TypeReference::Int8
        | TypeReference::Int16
        | TypeReference::Int32
        | TypeReference::Int64
        | TypeReference::BigInteger => Kind::Integer,
        TypeReference::Float32 | TypeReference::Float64 | TypeReference::BigDecimal => {
            Kind::FloatingPoint
        }
        TypeReference::Text => Kind::Text,
        _ => Kind::Other,
    }
}

pub trait ConstraintPolicy {
    fn classify(&self, ty: &TypeReference) -> Kind {
        classify(ty)
    }

    fn numeric_bounds(&self, kind: Kind) -> (Option<Number>, Option<Number>);

    fn string_max_length(&self, kind: Kind) -> Option<u32>;

    fn type_array_max_items(&self) -> u32;

    fn default_nullability(&self) -> bool;

    fn default_additional_properties(&self) -> bool;

    fn enum_representation(&self) -> EnumRepresentation;

    fn decide(&self, scope: Scope<'_>) -> ConstraintDirective {
        match scope {
            Scope::Type(_) => ConstraintDirective {
                max_items: Some(self.type_array_max_items()),
                nullable_default: self.default_nullability(),
                additional_properties_allowed: self.default_additional_properties(),
                ..ConstraintDirective::default()
            },
            Scope::Field(field) => {
                let kind = self.classify(&field.ty);
                let (minimum, maximum) = self.numeric_bounds(kind);
                ConstraintDirective {
                    max_length: self.string_max_length(kind),
                    minimum,
                    maximum,
                    max_items: None,
                    nullable_default: self.default_nullability(),
                    additional_properties_allowed: self.default_additional_properties(),
                }
            }
        }
    }

    fn decide_all(&self, ty: &TypeDescriptor) -> TypeDirectives {
        let fields = ty
            .fields
            .iter()
            .map(|field| FieldDirective {
                field: field.name.clone(),
                kind: self.classify(&field.ty),
                directive: self.decide(Scope::Field(field)),
            })
            .collect();

        TypeDirectives {
            type_name: ty.name.clone(),
            type_level: self.decide(Scope::Type(ty)),
            fields,
            enum_representation: self.enum_representation(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StandardPolicy;

impl ConstraintPolicy for StandardPolicy {
    fn numeric_bounds(&self, kind: Kind) -> (Option<Number>, Option<Number>) {
        match kind {
            Kind::Integer | Kind::FloatingPoint => (
                Some(Number::from(-NUMERIC_BOUND)),
                Some(Number::from(NUMERIC_BOUND)),
            ),
            Kind::Text | Kind::Other => (None, None),
        }
    }

    fn string_max_length(&self, kind: Kind) -> Option<u32> {
        match kind {
            Kind::Text => Some(STRING_MAX_LENGTH),
            _ => None,
        }
    }

    fn type_array_max_items(&self) -> u32 {
        ARRAY_MAX_ITEMS
    }

    fn default_nullability(&self) -> bool {
        true
    }

    fn default_additional_properties(&self) -> bool {
        false
    }

    fn enum_representation(&self) -> EnumRepresentation {
        EnumRepresentation::ByName
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::EnumConstant;

    fn field(name: &str, ty: TypeReference) -> FieldDescriptor {
        FieldDescriptor::new(name, ty)
    }

    #[test]
    fn classify_integer_like_including_wrappers() {
        for ty in [
            TypeReference::Int8,
            TypeReference::Int16,
            TypeReference::Int32,
            TypeReference::Int64,
            TypeReference::BigInteger,
            TypeReference::nullable(TypeReference::Int32),
        ] {
            assert_eq!(classify(&ty), Kind::Integer, "{ty:?}");
        }
    }

    #[test]
    fn classify_floating_point_including_wrappers() {
        for ty in [
            TypeReference::Float32,
            TypeReference::Float64,
            TypeReference::BigDecimal,
            TypeReference::nullable(TypeReference::Float64),
        ] {
            assert_eq!(classify(&ty), Kind::FloatingPoint, "{ty:?}");
        }
    }

    #[test]
    fn classify_text_and_other() {
        assert_eq!(classify(&TypeReference::Text), Kind::Text);
        assert_eq!(classify(&TypeReference::nullable(TypeReference::Text)), Kind::Text);
        assert_eq!(classify(&TypeReference::Boolean), Kind::Other);
        assert_eq!(classify(&TypeReference::array(TypeReference::Int32)), Kind::Other);
        assert_eq!(classify(&TypeReference::map(TypeReference::Text)), Kind::Other);
        assert_eq!(classify(&TypeReference::named("a.b.Widget")), Kind::Other);
    }

    #[test]
    fn numeric_fields_get_fixed_bounds() {
        let policy = StandardPolicy;
        for ty in [TypeReference::Int64, TypeReference::Float32] {
            let directive = policy.decide(Scope::Field(&field("n", ty)));
            assert_eq!(directive.minimum, Some(Number::from(-214_748_624i64)));
            assert_eq!(directive.maximum, Some(Number::from(214_748_624i64)));
            assert_eq!(directive.max_length, None);
        }
    }

    #[test]
    fn only_text_fields_get_max_length() {
        let policy = StandardPolicy;
        let text = policy.decide(Scope::Field(&field("label", TypeReference::Text)));
        assert_eq!(text.max_length, Some(255));
        assert_eq!(text.minimum, None);
        assert_eq!(text.maximum, None);

        for ty in [
            TypeReference::Int32,
            TypeReference::Boolean,
            TypeReference::array(TypeReference::Text),
            TypeReference::named("a.Other"),
        ] {
            let directive = policy.decide(Scope::Field(&field("x", ty)));
            assert_eq!(directive.max_length, None);
        }
    }

    #[test]
    fn type_level_directive_is_the_same_for_any_composition() {
        let policy = StandardPolicy;
        let shapes = vec![
            TypeDescriptor::class("a.Empty", vec![]),
            TypeDescriptor::class(
                "a.Primitives",
                vec![
                    field("i", TypeReference::Int32),
                    field("f", TypeReference::Float64),
                    field("b", TypeReference::Boolean),
                ],
            ),
            TypeDescriptor::class(
                "a.Nested",
                vec![
                    field("child", TypeReference::named("a.Primitives")),
                    field("list", TypeReference::array(TypeReference::named("a.Empty"))),
                ],
            ),
            TypeDescriptor::class("a.WithEnum", vec![field("color", TypeReference::named("a.Color"))]),
            TypeDescriptor::enumeration("a.Color", vec![EnumConstant::new("RED")]),
        ];

        for ty in &shapes {
            let directive = policy.decide(Scope::Type(ty));
            assert_eq!(directive.max_items, Some(255), "{}", ty.name);
            assert!(directive.nullable_default, "{}", ty.name);
            assert!(!directive.additional_properties_allowed, "{}", ty.name);
            assert_eq!(directive.max_length, None);
            assert_eq!(directive.minimum, None);
        }
    }

    #[test]
    fn defaults_are_constant() {
        let policy = StandardPolicy;
        assert!(policy.default_nullability());
        assert!(!policy.default_additional_properties());
        assert_eq!(policy.type_array_max_items(), 255);
        assert_eq!(policy.enum_representation(), EnumRepresentation::ByName);
    }

    #[test]
    fn type_without_fields_yields_type_level_only() {
        let directives = StandardPolicy.decide_all(&TypeDescriptor::class("a.Empty", vec![]));
        assert!(directives.fields.is_empty());
        assert_eq!(directives.type_level.max_items, Some(255));
    }

    #[test]
    fn decide_all_is_deterministic() {
        let ty = TypeDescriptor::class(
            "a.b.Widget",
            vec![field("count", TypeReference::Int32), field("label", TypeReference::Text)],
        );
        let first = StandardPolicy.decide_all(&ty);
        let second = StandardPolicy.decide_all(&ty);
        assert_eq!(first, second);
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
        assert_eq!(first.fields[0].kind, Kind::Integer);
        assert_eq!(first.fields[1].kind, Kind::Text);
    }

    #[test]
    fn directive_serializes_bounds_as_integers() {
        let directive = StandardPolicy.decide(Scope::Field(&field("n", TypeReference::Int32)));
        let v = serde_json::to_value(&directive).unwrap();
        assert_eq!(v["minimum"], serde_json::json!(-214748624));
        assert_eq!(v["maximum"], serde_json::json!(214748624));
        assert!(v.get("maxLength").is_none());
        assert_eq!(v["nullableDefault"], true);
        assert_eq!(v["additionalPropertiesAllowed"], false);
    }
}
