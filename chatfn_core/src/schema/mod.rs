//! Type descriptors and the JSON-Schema-like fragments derived from them.

mod describe;

use std::{borrow::Cow, fmt};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub use describe::Describe;

// ============================================================================
// TYPE DESCRIPTORS
// ============================================================================

/// The shape of a parameter type, as seen by the parser registry.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeDescriptor {
    Bool,
    Integer,
    Float,
    String,
    Null,
    List(Box<TypeDescriptor>),
    Map {
        key: Box<TypeDescriptor>,
        value: Box<TypeDescriptor>,
    },
    /// Alternatives, tried in declaration order.
    Union(Vec<TypeDescriptor>),
    Choice(ChoiceDescriptor),
    Record(RecordDescriptor),
    /// An opaque type only custom parsers know how to handle.
    Named {
        name: Cow<'static, str>,
        args: Vec<TypeDescriptor>,
    },
}

impl TypeDescriptor {
    pub fn list(item: TypeDescriptor) -> Self {
        TypeDescriptor::List(Box::new(item))
    }

    pub fn map(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::Map {
            key: Box::new(key),
            value: Box::new(value),
        }
    }

    pub fn optional(inner: TypeDescriptor) -> Self {
        TypeDescriptor::Union(vec![inner, TypeDescriptor::Null])
    }

    pub fn named(name: impl Into<Cow<'static, str>>) -> Self {
        TypeDescriptor::Named {
            name: name.into(),
            args: Vec::new(),
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Bool => f.write_str("bool"),
            TypeDescriptor::Integer => f.write_str("integer"),
            TypeDescriptor::Float => f.write_str("float"),
            TypeDescriptor::String => f.write_str("string"),
            TypeDescriptor::Null => f.write_str("null"),
            TypeDescriptor::List(item) => write!(f, "list<{item}>"),
            TypeDescriptor::Map { key, value } => write!(f, "map<{key}, {value}>"),
            TypeDescriptor::Union(alternatives) => {
                for (i, alt) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{alt}")?;
                }
                Ok(())
            }
            TypeDescriptor::Choice(choice) => f.write_str(&choice.name),
            TypeDescriptor::Record(record) => f.write_str(&record.name),
            TypeDescriptor::Named { name, args } => {
                f.write_str(name)?;
                if !args.is_empty() {
                    f.write_str("<")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            f.write_str(", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    f.write_str(">")?;
                }
                Ok(())
            }
        }
    }
}

/// An enumeration whose members are addressed by name.
#[derive(Debug, Clone, PartialEq)]
pub struct ChoiceDescriptor {
    pub name: String,
    pub doc: Option<String>,
    pub members: Vec<String>,
}

impl ChoiceDescriptor {
    pub fn new<I, S>(name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            doc: None,
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

/// A struct-like type with named, typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDescriptor {
    pub name: String,
    pub doc: Option<String>,
    pub fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: None,
            fields: Vec::new(),
        }
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    pub fn field(mut self, field: FieldDescriptor) -> Self {
        self.fields.push(field);
        self
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.default.is_none())
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    pub name: String,
    pub ty: TypeDescriptor,
    /// JSON value used when the field is omitted. `None` makes the field required.
    pub default: Option<Value>,
    pub doc: Option<String>,
}

impl FieldDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            default: None,
            doc: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }

    pub fn with_doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }
}

// ============================================================================
// SCHEMA FRAGMENTS
// ============================================================================

/// The `type` keyword of a schema fragment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SchemaType {
    Boolean,
    Integer,
    Number,
    String,
    Null,
    Array,
    Object,
}

/// A JSON-Schema-like description of an accepted value shape.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaFragment {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<SchemaType>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items: Option<Box<SchemaFragment>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub properties: Option<IndexMap<String, SchemaFragment>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub required: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub additional_properties: Option<Box<SchemaFragment>>,

    #[serde(rename = "enum", default, skip_serializing_if = "Option::is_none")]
    pub enum_values: Option<Vec<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub any_of: Option<Vec<SchemaFragment>>,

    /// Extra keywords contributed by custom parsers.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SchemaFragment {
    pub fn of(kind: SchemaType) -> Self {
        Self {
            kind: Some(kind),
            ..Self::default()
        }
    }

    pub fn array(items: SchemaFragment) -> Self {
        Self {
            items: Some(Box::new(items)),
            ..Self::of(SchemaType::Array)
        }
    }

    pub fn map(values: SchemaFragment) -> Self {
        Self {
            additional_properties: Some(Box::new(values)),
            ..Self::of(SchemaType::Object)
        }
    }

    pub fn object(properties: IndexMap<String, SchemaFragment>, required: Vec<String>) -> Self {
        Self {
            properties: Some(properties),
            required: Some(required),
            ..Self::of(SchemaType::Object)
        }
    }

    pub fn any_of(alternatives: Vec<SchemaFragment>) -> Self {
        Self {
            any_of: Some(alternatives),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_default()
    }
}
