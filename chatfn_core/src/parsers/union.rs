use serde_json::Value;
use tracing::trace;

use super::{ArgParser, ParserRegistry, unsupported};
use crate::{
    error::ToolError,
    schema::{SchemaFragment, TypeDescriptor},
    value::ArgValue,
};

/// Tries each alternative in declaration order and keeps the first success.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnionParser;

impl ArgParser for UnionParser {
    fn name(&self) -> &str {
        "UnionParser"
    }

    fn can_parse(&self, ty: &TypeDescriptor) -> bool {
        matches!(ty, TypeDescriptor::Union(_))
    }

    fn schema(
        &self,
        ty: &TypeDescriptor,
        registry: &ParserRegistry,
    ) -> Result<SchemaFragment, ToolError> {
        let TypeDescriptor::Union(alternatives) = ty else {
            return Err(unsupported(ty));
        };
        let fragments = alternatives
            .iter()
            .map(|alt| registry.schema(alt))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SchemaFragment::any_of(fragments))
    }

    fn parse_value(
        &self,
        ty: &TypeDescriptor,
        value: &Value,
        registry: &ParserRegistry,
    ) -> Result<ArgValue, ToolError> {
        let TypeDescriptor::Union(alternatives) = ty else {
            return Err(unsupported(ty));
        };
        for alt in alternatives {
            match registry.parse(alt, value) {
                Ok(parsed) => return Ok(parsed),
                // A missing parser is a registry problem, not a mismatch.
                Err(err @ ToolError::CannotParseType { .. }) => return Err(err),
                Err(err) => trace!(alternative = %alt, error = %err, "union alternative rejected"),
            }
        }
        Err(ToolError::broken(value, &self.schema(ty, registry)?))
    }
}
