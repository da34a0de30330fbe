use serde_json::Value;

use super::{ArgParser, ParserRegistry, unsupported};
use crate::{
    error::ToolError,
    schema::{SchemaFragment, TypeDescriptor},
    value::ArgValue,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct ListParser;

impl ArgParser for ListParser {
    fn name(&self) -> &str {
        "ListParser"
    }

    fn can_parse(&self, ty: &TypeDescriptor) -> bool {
        matches!(ty, TypeDescriptor::List(_))
    }

    fn schema(
        &self,
        ty: &TypeDescriptor,
        registry: &ParserRegistry,
    ) -> Result<SchemaFragment, ToolError> {
        let TypeDescriptor::List(item) = ty else {
            return Err(unsupported(ty));
        };
        Ok(SchemaFragment::array(registry.schema(item)?))
    }

    fn parse_value(
        &self,
        ty: &TypeDescriptor,
        value: &Value,
        registry: &ParserRegistry,
    ) -> Result<ArgValue, ToolError> {
        let TypeDescriptor::List(item) = ty else {
            return Err(unsupported(ty));
        };
        let Some(elements) = value.as_array() else {
            return Err(ToolError::broken(value, &self.schema(ty, registry)?));
        };
        elements
            .iter()
            .map(|element| registry.parse(item, element))
            .collect::<Result<Vec<_>, _>>()
            .map(ArgValue::List)
    }
}
