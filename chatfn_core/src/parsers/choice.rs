use serde_json::Value;

use super::{ArgParser, ParserRegistry, unsupported};
use crate::{
    error::ToolError,
    schema::{SchemaFragment, SchemaType, TypeDescriptor},
    value::ArgValue,
};

#[derive(Debug, Default, Clone, Copy)]
pub struct ChoiceParser;

impl ArgParser for ChoiceParser {
    fn name(&self) -> &str {
        "ChoiceParser"
    }

    fn can_parse(&self, ty: &TypeDescriptor) -> bool {
        matches!(ty, TypeDescriptor::Choice(_))
    }

    fn schema(
        &self,
        ty: &TypeDescriptor,
        _registry: &ParserRegistry,
    ) -> Result<SchemaFragment, ToolError> {
        let TypeDescriptor::Choice(choice) = ty else {
            return Err(unsupported(ty));
        };
        Ok(SchemaFragment {
            enum_values: Some(choice.members.clone()),
            description: choice.doc.clone(),
            ..SchemaFragment::of(SchemaType::String)
        })
    }

    fn parse_value(
        &self,
        ty: &TypeDescriptor,
        value: &Value,
        registry: &ParserRegistry,
    ) -> Result<ArgValue, ToolError> {
        let TypeDescriptor::Choice(choice) = ty else {
            return Err(unsupported(ty));
        };
        match value.as_str() {
            Some(member) if choice.members.iter().any(|m| m == member) => Ok(ArgValue::Choice {
                type_name: choice.name.clone(),
                member: member.to_string(),
            }),
            _ => Err(ToolError::broken(value, &self.schema(ty, registry)?)),
        }
    }
}
