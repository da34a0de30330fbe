use serde_json::Value;

use super::{ArgParser, ParserRegistry};
use crate::{
    error::ToolError,
    schema::{SchemaFragment, SchemaType, TypeDescriptor},
    value::ArgValue,
};

// Atomic parsers require an exact JSON type match.
macro_rules! atomic {
    ($parser:ident, $desc:ident, $schema:ident, |$v:ident| $extract:expr) => {
        #[derive(Debug, Default, Clone, Copy)]
        pub struct $parser;

        impl ArgParser for $parser {
            fn name(&self) -> &str {
                stringify!($parser)
            }

            fn can_parse(&self, ty: &TypeDescriptor) -> bool {
                matches!(ty, TypeDescriptor::$desc)
            }

            fn schema(
                &self,
                _ty: &TypeDescriptor,
                _registry: &ParserRegistry,
            ) -> Result<SchemaFragment, ToolError> {
                Ok(SchemaFragment::of(SchemaType::$schema))
            }

            fn parse_value(
                &self,
                _ty: &TypeDescriptor,
                value: &Value,
                _registry: &ParserRegistry,
            ) -> Result<ArgValue, ToolError> {
                let $v = value;
                $extract.ok_or_else(|| {
                    ToolError::broken(value, &SchemaFragment::of(SchemaType::$schema))
                })
            }
        }
    };
}

atomic!(BoolParser, Bool, Boolean, |v| v.as_bool().map(ArgValue::Bool));
atomic!(IntegerParser, Integer, Integer, |v| v
    .as_i64()
    .map(ArgValue::Integer)
    .or_else(|| v.as_u64().map(ArgValue::Unsigned)));
// Any JSON number is a float, integral ones included. In a union listing
// float before integer, `3` therefore resolves to `Float(3.0)`.
atomic!(FloatParser, Float, Number, |v| v.as_f64().map(ArgValue::Float));
atomic!(StringParser, String, String, |v| v
    .as_str()
    .map(|s| ArgValue::String(s.to_owned())));
atomic!(NullParser, Null, Null, |v| v.is_null().then_some(ArgValue::Null));
