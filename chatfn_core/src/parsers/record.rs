use indexmap::IndexMap;
use serde_json::Value;

use super::{ArgParser, ParserRegistry, unsupported};
use crate::{
    error::ToolError,
    schema::{SchemaFragment, TypeDescriptor},
    value::ArgValue,
};

/// Objects with a fixed set of named fields.
///
/// Every required field must be present and no unknown field is accepted.
/// Omitted fields take their default, which is parsed like any other value.
#[derive(Debug, Default, Clone, Copy)]
pub struct RecordParser;

impl ArgParser for RecordParser {
    fn name(&self) -> &str {
        "RecordParser"
    }

    fn can_parse(&self, ty: &TypeDescriptor) -> bool {
        matches!(ty, TypeDescriptor::Record(_))
    }

    fn schema(
        &self,
        ty: &TypeDescriptor,
        registry: &ParserRegistry,
    ) -> Result<SchemaFragment, ToolError> {
        let TypeDescriptor::Record(record) = ty else {
            return Err(unsupported(ty));
        };

        let mut properties = IndexMap::with_capacity(record.fields.len());
        for field in &record.fields {
            let mut fragment = registry.schema(&field.ty)?;
            if let Some(doc) = &field.doc {
                fragment.description = Some(doc.clone());
            }
            properties.insert(field.name.clone(), fragment);
        }
        let required = record.required_fields().map(|f| f.name.clone()).collect();

        Ok(SchemaFragment {
            description: record.doc.clone(),
            ..SchemaFragment::object(properties, required)
        })
    }

    fn parse_value(
        &self,
        ty: &TypeDescriptor,
        value: &Value,
        registry: &ParserRegistry,
    ) -> Result<ArgValue, ToolError> {
        let TypeDescriptor::Record(record) = ty else {
            return Err(unsupported(ty));
        };
        let broken = || -> Result<ToolError, ToolError> {
            Ok(ToolError::broken(value, &self.schema(ty, registry)?))
        };

        let Some(object) = value.as_object() else {
            return Err(broken()?);
        };
        if record.required_fields().any(|f| !object.contains_key(&f.name))
            || object.keys().any(|k| record.get(k).is_none())
        {
            return Err(broken()?);
        }

        let mut fields = IndexMap::with_capacity(record.fields.len());
        for field in &record.fields {
            let parsed = match (object.get(&field.name), &field.default) {
                (Some(raw), _) => registry.parse(&field.ty, raw)?,
                (None, Some(default)) => registry.parse(&field.ty, default)?,
                (None, None) => return Err(broken()?),
            };
            fields.insert(field.name.clone(), parsed);
        }
        Ok(ArgValue::Record {
            type_name: record.name.clone(),
            fields,
        })
    }
}
