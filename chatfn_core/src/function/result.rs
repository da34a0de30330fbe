use std::{any::Any, fmt};

use serde_json::Value;

use super::ResultPolicy;
use crate::error::ToolError;

/// A native function result: inspectable by type, serializable on demand.
pub trait ReturnValue: Any + Send + Sync + erased_serde::Serialize {
    fn as_any(&self) -> &dyn Any;

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync>;

    /// The result as text, when it already is text.
    fn as_text(&self) -> Option<&str>;
}

erased_serde::serialize_trait_object!(ReturnValue);

impl<T> ReturnValue for T
where
    T: Any + Send + Sync + serde::Serialize,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any + Send + Sync> {
        self
    }

    fn as_text(&self) -> Option<&str> {
        let any = self as &dyn Any;
        any.downcast_ref::<String>()
            .map(String::as_str)
            .or_else(|| any.downcast_ref::<&'static str>().copied())
    }
}

/// The untouched return value of one invocation.
// Methods are called through `*self.0`: the box itself also implements
// `ReturnValue`.
pub struct RawFunctionResult(Box<dyn ReturnValue>);

impl RawFunctionResult {
    pub fn new<T: ReturnValue>(value: T) -> Self {
        Self(Box::new(value))
    }

    pub fn is<T: Any>(&self) -> bool {
        (*self.0).as_any().is::<T>()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        (*self.0).as_any().downcast_ref::<T>()
    }

    pub fn downcast<T: Any>(self) -> Option<T> {
        self.0.into_any().downcast::<T>().ok().map(|b| *b)
    }

    pub fn to_json(&self) -> Result<Value, serde_json::Error> {
        serde_json::to_value(&*self.0)
    }

    /// Text content for the conversation.
    ///
    /// Strings are used as they are. Anything else is JSON-encoded when
    /// `serialize` is on and rejected otherwise.
    pub fn content(&self, name: &str, serialize: bool) -> Result<String, ToolError> {
        if let Some(text) = (*self.0).as_text() {
            return Ok(text.to_owned());
        }
        if !serialize {
            return Err(ToolError::NonSerializableOutput {
                name: name.to_string(),
                reason: "serialize is off and the result is not a string".into(),
            });
        }
        serde_json::to_string(&*self.0).map_err(|e| ToolError::NonSerializableOutput {
            name: name.to_string(),
            reason: e.to_string(),
        })
    }
}

impl fmt::Debug for RawFunctionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_json() {
            Ok(value) => f.debug_tuple("RawFunctionResult").field(&value).finish(),
            Err(_) => f.write_str("RawFunctionResult(<unserializable>)"),
        }
    }
}

/// The outcome of running one tool call, with the policy it ran under.
#[derive(Debug)]
pub struct FunctionResult {
    pub name: String,
    pub raw: Option<RawFunctionResult>,
    pub policy: ResultPolicy,
}

impl FunctionResult {
    pub fn new(name: impl Into<String>, raw: RawFunctionResult, policy: ResultPolicy) -> Self {
        Self {
            name: name.into(),
            raw: Some(raw),
            policy,
        }
    }

    /// A result that never produces content.
    pub fn empty(name: impl Into<String>, policy: ResultPolicy) -> Self {
        Self {
            name: name.into(),
            raw: None,
            policy,
        }
    }

    /// `None` when the result does not re-enter the conversation.
    pub fn content(&self) -> Result<Option<String>, ToolError> {
        match &self.raw {
            Some(raw) if self.policy.save_return => {
                raw.content(&self.name, self.policy.serialize).map(Some)
            }
            _ => Ok(None),
        }
    }

    pub fn into_raw(self) -> Option<RawFunctionResult> {
        self.raw
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn raw_results_keep_their_type() {
        let raw = RawFunctionResult::new(vec![1u8, 2, 3]);
        assert!(raw.is::<Vec<u8>>());
        assert_eq!(raw.downcast_ref::<Vec<u8>>(), Some(&vec![1, 2, 3]));
        assert_eq!(raw.to_json().unwrap(), json!([1, 2, 3]));
        assert_eq!(raw.downcast::<Vec<u8>>(), Some(vec![1, 2, 3]));
    }

    #[test]
    fn strings_are_used_verbatim() {
        let raw = RawFunctionResult::new("done".to_string());
        assert_eq!(raw.content("respond", true).unwrap(), "done");
        assert_eq!(raw.content("respond", false).unwrap(), "done");
    }

    #[test]
    fn other_values_need_serialize() {
        let raw = RawFunctionResult::new(3i64);
        assert_eq!(raw.content("add", true).unwrap(), "3");
        let err = raw.content("add", false).unwrap_err();
        assert!(matches!(err, ToolError::NonSerializableOutput { ref name, .. } if name == "add"));
    }

    #[test]
    fn unencodable_values_fail_cleanly() {
        let mut map = HashMap::new();
        map.insert(vec![1u8], 1u8);
        let raw = RawFunctionResult::new(map);
        assert!(matches!(
            raw.content("bytes", true),
            Err(ToolError::NonSerializableOutput { .. })
        ));
    }

    #[test]
    fn save_return_off_hides_content() {
        let policy = ResultPolicy {
            save_return: false,
            ..ResultPolicy::default()
        };
        let result = FunctionResult::new("add", RawFunctionResult::new(3), policy);
        assert_eq!(result.content().unwrap(), None);
        assert!(result.into_raw().is_some());

        let empty = FunctionResult::empty("enable", ResultPolicy::default());
        assert_eq!(empty.content().unwrap(), None);
    }
}
