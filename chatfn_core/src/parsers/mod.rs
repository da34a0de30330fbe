//! The ordered parser registry that turns type descriptors into schema
//! fragments and checks untrusted JSON against them.

mod atomic;
mod choice;
mod list;
mod map;
mod record;
mod union;

use std::{fmt, sync::Arc};

use once_cell::sync::Lazy;
use serde_json::Value;

use crate::{
    error::ToolError,
    schema::{SchemaFragment, TypeDescriptor},
    value::ArgValue,
};

pub use atomic::{BoolParser, FloatParser, IntegerParser, NullParser, StringParser};
pub use choice::ChoiceParser;
pub use list::ListParser;
pub use map::MapParser;
pub use record::RecordParser;
pub use union::UnionParser;

/// One entry of the registry.
///
/// Structural parsers recurse through the `registry` they are handed, never a
/// fixed list, so custom parsers apply to nested types as well.
pub trait ArgParser: Send + Sync {
    fn name(&self) -> &str;

    fn can_parse(&self, ty: &TypeDescriptor) -> bool;

    fn schema(
        &self,
        ty: &TypeDescriptor,
        registry: &ParserRegistry,
    ) -> Result<SchemaFragment, ToolError>;

    fn parse_value(
        &self,
        ty: &TypeDescriptor,
        value: &Value,
        registry: &ParserRegistry,
    ) -> Result<ArgValue, ToolError>;
}

/// An ordered list of parsers; the first one whose `can_parse` matches wins.
#[derive(Clone)]
pub struct ParserRegistry {
    parsers: Vec<Arc<dyn ArgParser>>,
}

static DEFAULT_REGISTRY: Lazy<Arc<ParserRegistry>> =
    Lazy::new(|| Arc::new(ParserRegistry::standard()));

/// The shared registry used when a function does not bring its own.
pub fn default_registry() -> Arc<ParserRegistry> {
    DEFAULT_REGISTRY.clone()
}

impl ParserRegistry {
    pub fn empty() -> Self {
        Self {
            parsers: Vec::new(),
        }
    }

    /// Bool is checked before the numeric parsers.
    pub fn standard() -> Self {
        Self::empty()
            .with(BoolParser)
            .with(RecordParser)
            .with(MapParser)
            .with(ChoiceParser)
            .with(FloatParser)
            .with(IntegerParser)
            .with(ListParser)
            .with(NullParser)
            .with(StringParser)
            .with(UnionParser)
    }

    /// Appends a parser with the lowest priority.
    pub fn with(mut self, parser: impl ArgParser + 'static) -> Self {
        self.parsers.push(Arc::new(parser));
        self
    }

    /// Inserts a parser ahead of every existing one.
    pub fn prepend(mut self, parser: impl ArgParser + 'static) -> Self {
        self.parsers.insert(0, Arc::new(parser));
        self
    }

    pub fn names(&self) -> Vec<&str> {
        self.parsers.iter().map(|p| p.name()).collect()
    }

    pub fn find(&self, ty: &TypeDescriptor) -> Result<&dyn ArgParser, ToolError> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(ty))
            .map(|p| p.as_ref())
            .ok_or_else(|| unsupported(ty))
    }

    pub fn schema(&self, ty: &TypeDescriptor) -> Result<SchemaFragment, ToolError> {
        self.find(ty)?.schema(ty, self)
    }

    pub fn parse(&self, ty: &TypeDescriptor, value: &Value) -> Result<ArgValue, ToolError> {
        self.find(ty)?.parse_value(ty, value, self)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::standard()
    }
}

impl fmt::Debug for ParserRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

pub(crate) fn unsupported(ty: &TypeDescriptor) -> ToolError {
    ToolError::CannotParseType {
        type_name: ty.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        schema::{ChoiceDescriptor, Describe, FieldDescriptor, RecordDescriptor, SchemaType},
        value::FromArgValue,
    };
    use indexmap::IndexMap;
    use serde_json::json;

    fn schema_json(ty: &TypeDescriptor) -> Value {
        ParserRegistry::standard().schema(ty).unwrap().to_value()
    }

    #[test]
    fn standard_order() {
        assert_eq!(
            ParserRegistry::standard().names(),
            vec![
                "BoolParser",
                "RecordParser",
                "MapParser",
                "ChoiceParser",
                "FloatParser",
                "IntegerParser",
                "ListParser",
                "NullParser",
                "StringParser",
                "UnionParser"
            ]
        );
    }

    #[test]
    fn atomic_schemas() {
        assert_eq!(schema_json(&TypeDescriptor::Bool), json!({"type": "boolean"}));
        assert_eq!(schema_json(&TypeDescriptor::Integer), json!({"type": "integer"}));
        assert_eq!(schema_json(&TypeDescriptor::Float), json!({"type": "number"}));
        assert_eq!(schema_json(&TypeDescriptor::String), json!({"type": "string"}));
        assert_eq!(schema_json(&TypeDescriptor::Null), json!({"type": "null"}));
    }

    #[test]
    fn booleans_never_parse_as_integers() {
        let registry = ParserRegistry::standard();
        for raw in [json!(true), json!(false)] {
            let err = registry.parse(&TypeDescriptor::Integer, &raw).unwrap_err();
            assert!(matches!(err, ToolError::BrokenSchema { .. }));
            assert!(registry.parse(&TypeDescriptor::Float, &raw).is_err());
        }
        assert_eq!(
            registry.parse(&TypeDescriptor::Bool, &json!(true)).unwrap(),
            ArgValue::Bool(true)
        );
    }

    #[test]
    fn integer_rejects_fractions_float_accepts_any_number() {
        let registry = ParserRegistry::standard();
        assert!(registry.parse(&TypeDescriptor::Integer, &json!(1.5)).is_err());
        assert_eq!(
            registry.parse(&TypeDescriptor::Integer, &json!(-7)).unwrap(),
            ArgValue::Integer(-7)
        );
        assert_eq!(
            registry.parse(&TypeDescriptor::Float, &json!(2)).unwrap(),
            ArgValue::Float(2.0)
        );
    }

    #[test]
    fn integer_covers_the_full_unsigned_range() {
        let registry = ParserRegistry::standard();
        let parsed = registry
            .parse(&u64::descriptor(), &json!(u64::MAX))
            .unwrap();
        assert_eq!(parsed, ArgValue::Unsigned(u64::MAX));
        assert_eq!(u64::from_arg_value(parsed).unwrap(), u64::MAX);
        assert_eq!(
            registry.parse(&u64::descriptor(), &json!(5)).unwrap(),
            ArgValue::Integer(5)
        );
    }

    #[test]
    fn union_resolves_in_declaration_order() {
        let registry = ParserRegistry::standard();
        let float_first = TypeDescriptor::Union(vec![TypeDescriptor::Float, TypeDescriptor::Integer]);
        let int_first = TypeDescriptor::Union(vec![TypeDescriptor::Integer, TypeDescriptor::Float]);

        assert_eq!(registry.parse(&float_first, &json!(3)).unwrap(), ArgValue::Float(3.0));
        assert_eq!(registry.parse(&int_first, &json!(3)).unwrap(), ArgValue::Integer(3));

        let int_or_string = TypeDescriptor::Union(vec![TypeDescriptor::Integer, TypeDescriptor::String]);
        assert_eq!(
            registry.parse(&int_or_string, &json!("3")).unwrap(),
            ArgValue::String("3".into())
        );
        let err = registry.parse(&int_or_string, &json!([3])).unwrap_err();
        assert!(matches!(err, ToolError::BrokenSchema { .. }));

        assert_eq!(
            schema_json(&int_or_string),
            json!({"anyOf": [{"type": "integer"}, {"type": "string"}]})
        );
    }

    #[test]
    fn lists_fail_as_a_whole() {
        let registry = ParserRegistry::standard();
        let ty = TypeDescriptor::list(TypeDescriptor::Integer);
        assert_eq!(
            schema_json(&ty),
            json!({"type": "array", "items": {"type": "integer"}})
        );
        assert_eq!(
            registry.parse(&ty, &json!([1, 2])).unwrap(),
            ArgValue::List(vec![ArgValue::Integer(1), ArgValue::Integer(2)])
        );
        assert!(registry.parse(&ty, &json!([1, "2"])).is_err());
        assert!(registry.parse(&ty, &json!({"a": 1})).is_err());
    }

    #[test]
    fn maps_require_string_keys() {
        let registry = ParserRegistry::standard();
        let ty = TypeDescriptor::map(TypeDescriptor::String, TypeDescriptor::Bool);
        assert_eq!(
            schema_json(&ty),
            json!({"type": "object", "additionalProperties": {"type": "boolean"}})
        );

        let mut expected = IndexMap::new();
        expected.insert("on".to_string(), ArgValue::Bool(true));
        assert_eq!(
            registry.parse(&ty, &json!({"on": true})).unwrap(),
            ArgValue::Map(expected)
        );
        assert!(registry.parse(&ty, &json!({"on": 1})).is_err());

        let int_keys = TypeDescriptor::map(TypeDescriptor::Integer, TypeDescriptor::Bool);
        let err = registry.schema(&int_keys).unwrap_err();
        assert!(matches!(err, ToolError::CannotParseType { ref type_name } if type_name == "map<integer, bool>"));
    }

    #[test]
    fn choices_match_member_names() {
        let registry = ParserRegistry::standard();
        let ty = TypeDescriptor::Choice(
            ChoiceDescriptor::new("Color", ["Red", "Green"]).with_doc("A primary color"),
        );
        assert_eq!(
            schema_json(&ty),
            json!({"type": "string", "description": "A primary color", "enum": ["Red", "Green"]})
        );
        assert_eq!(
            registry.parse(&ty, &json!("Green")).unwrap(),
            ArgValue::Choice {
                type_name: "Color".into(),
                member: "Green".into()
            }
        );
        assert!(registry.parse(&ty, &json!("Blue")).is_err());
        assert!(registry.parse(&ty, &json!(0)).is_err());
    }

    fn point() -> TypeDescriptor {
        TypeDescriptor::Record(
            RecordDescriptor::new("Point")
                .with_doc("A point")
                .field(FieldDescriptor::new("x", TypeDescriptor::Integer))
                .field(FieldDescriptor::new("y", TypeDescriptor::Integer).with_default(json!(0)))
                .field(
                    FieldDescriptor::new("label", TypeDescriptor::optional(TypeDescriptor::String))
                        .with_default(Value::Null)
                        .with_doc("Shown next to the point"),
                ),
        )
    }

    #[test]
    fn record_schema_lists_required_fields() {
        assert_eq!(
            schema_json(&point()),
            json!({
                "type": "object",
                "description": "A point",
                "properties": {
                    "x": {"type": "integer"},
                    "y": {"type": "integer"},
                    "label": {
                        "description": "Shown next to the point",
                        "anyOf": [{"type": "string"}, {"type": "null"}]
                    }
                },
                "required": ["x"]
            })
        );
    }

    #[test]
    fn record_parsing_fills_defaults_and_rejects_strays() {
        let registry = ParserRegistry::standard();
        let parsed = registry.parse(&point(), &json!({"x": 4})).unwrap();
        let ArgValue::Record { type_name, fields } = parsed else {
            panic!("expected a record");
        };
        assert_eq!(type_name, "Point");
        assert_eq!(fields["x"], ArgValue::Integer(4));
        assert_eq!(fields["y"], ArgValue::Integer(0));
        assert_eq!(fields["label"], ArgValue::Null);

        assert!(registry.parse(&point(), &json!({"y": 1})).is_err());
        assert!(registry.parse(&point(), &json!({"x": 1, "z": 2})).is_err());
        assert!(registry.parse(&point(), &json!([1, 2])).is_err());
    }

    struct Timestamp;

    impl ArgParser for Timestamp {
        fn name(&self) -> &str {
            "Timestamp"
        }

        fn can_parse(&self, ty: &TypeDescriptor) -> bool {
            matches!(ty, TypeDescriptor::Named { name, .. } if name == "Timestamp")
        }

        fn schema(
            &self,
            _ty: &TypeDescriptor,
            _registry: &ParserRegistry,
        ) -> Result<SchemaFragment, ToolError> {
            let mut schema = SchemaFragment::of(SchemaType::String);
            schema.extra.insert("format".into(), json!("date-time"));
            Ok(schema)
        }

        fn parse_value(
            &self,
            _ty: &TypeDescriptor,
            value: &Value,
            _registry: &ParserRegistry,
        ) -> Result<ArgValue, ToolError> {
            match value.as_str() {
                Some(s) if s.contains('T') => Ok(ArgValue::String(s.to_string())),
                _ => Err(ToolError::BrokenSchema {
                    value: value.clone(),
                    schema: json!({"type": "string", "format": "date-time"}),
                }),
            }
        }
    }

    #[test]
    fn custom_parsers_apply_to_nested_types() {
        let ty = TypeDescriptor::Record(
            RecordDescriptor::new("Event").field(FieldDescriptor::new(
                "at",
                TypeDescriptor::list(TypeDescriptor::named("Timestamp")),
            )),
        );

        let standard = ParserRegistry::standard();
        assert!(matches!(
            standard.schema(&ty),
            Err(ToolError::CannotParseType { .. })
        ));

        let custom = ParserRegistry::standard().prepend(Timestamp);
        assert_eq!(custom.names()[0], "Timestamp");
        assert_eq!(
            custom.schema(&ty).unwrap().to_value()["properties"]["at"],
            json!({"type": "array", "items": {"type": "string", "format": "date-time"}})
        );
        assert!(custom.parse(&ty, &json!({"at": ["2024-01-01T00:00:00Z"]})).is_ok());
        assert!(custom.parse(&ty, &json!({"at": ["yesterday"]})).is_err());
    }

    #[test]
    fn empty_registry_parses_nothing() {
        let err = ParserRegistry::empty().schema(&TypeDescriptor::Bool).unwrap_err();
        assert_eq!(err.to_string(), "Cannot derive a schema for type `bool`");
    }
}
