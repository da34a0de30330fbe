use indexmap::IndexMap;
use serde_json::Value;

use super::{ArgParser, ParserRegistry, unsupported};
use crate::{
    error::ToolError,
    schema::{SchemaFragment, TypeDescriptor},
    value::ArgValue,
};

/// String-keyed mappings. Any other key type is left unparsed.
#[derive(Debug, Default, Clone, Copy)]
pub struct MapParser;

impl ArgParser for MapParser {
    fn name(&self) -> &str {
        "MapParser"
    }

    fn can_parse(&self, ty: &TypeDescriptor) -> bool {
        matches!(ty, TypeDescriptor::Map { key, .. } if **key == TypeDescriptor::String)
    }

    fn schema(
        &self,
        ty: &TypeDescriptor,
        registry: &ParserRegistry,
    ) -> Result<SchemaFragment, ToolError> {
        let TypeDescriptor::Map { value, .. } = ty else {
            return Err(unsupported(ty));
        };
        Ok(SchemaFragment::map(registry.schema(value)?))
    }

    fn parse_value(
        &self,
        ty: &TypeDescriptor,
        value: &Value,
        registry: &ParserRegistry,
    ) -> Result<ArgValue, ToolError> {
        let TypeDescriptor::Map { value: value_ty, .. } = ty else {
            return Err(unsupported(ty));
        };
        let Some(object) = value.as_object() else {
            return Err(ToolError::broken(value, &self.schema(ty, registry)?));
        };
        let mut entries = IndexMap::with_capacity(object.len());
        for (key, raw) in object {
            entries.insert(key.clone(), registry.parse(value_ty, raw)?);
        }
        Ok(ArgValue::Map(entries))
    }
}
