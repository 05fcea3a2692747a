//! Shape inference for arbitrary JSON documents.
//!
//! The inferred schema is a tree mirroring the document: objects keep every key,
//! arrays are represented by the schema of their first element only, and scalars
//! collapse to their JSON type name. Recursion stops at [`MAX_DEPTH`].

use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use serde_json::Value;

/// Deepest level that is still inferred. The root value sits at depth 1.
pub const MAX_DEPTH: usize = 13;

/// Inferred shape of one JSON value.
#[derive(Debug, Clone, PartialEq)]
pub enum SchemaNode {
    /// Keys in document order, each with the shape of its value
    Object(Vec<(String, SchemaNode)>),
    /// Shape of the first element of a non-empty array
    Array(Box<SchemaNode>),
    EmptyList,
    /// JSON type name: `string`, `number`, `boolean` or `null`
    Scalar(&'static str),
    TooDeep,
}

impl Serialize for SchemaNode {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            SchemaNode::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (name, node) in fields {
                    map.serialize_entry(name, node)?;
                }
                map.end()
            }
            SchemaNode::Array(element) => {
                let mut seq = serializer.serialize_seq(Some(1))?;
                seq.serialize_element(element)?;
                seq.end()
            }
            SchemaNode::EmptyList => serializer.serialize_str("empty list"),
            SchemaNode::Scalar(name) => serializer.serialize_str(name),
            SchemaNode::TooDeep => serializer.serialize_str("max depth reached"),
        }
    }
}

/// Infer the schema of a whole document.
pub fn infer(value: &Value) -> SchemaNode {
    infer_at(value, 1)
}

/// Infer the schema of `value` found at `depth`.
pub fn infer_at(value: &Value, depth: usize) -> SchemaNode {
    if depth > MAX_DEPTH {
        return SchemaNode::TooDeep;
    }

    match value {
        Value::Object(map) => SchemaNode::Object(
            map.iter()
                .map(|(key, value)| (key.clone(), infer_at(value, depth + 1)))
                .collect(),
        ),
        Value::Array(items) => match items.first() {
            Some(first) => SchemaNode::Array(Box::new(infer_at(first, depth + 1))),
            None => SchemaNode::EmptyList,
        },
        Value::Null => SchemaNode::Scalar("null"),
        Value::Bool(_) => SchemaNode::Scalar("boolean"),
        Value::Number(_) => SchemaNode::Scalar("number"),
        Value::String(_) => SchemaNode::Scalar("string"),
    }
}
