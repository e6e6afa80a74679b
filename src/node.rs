//! Read-only view over structured data.
//!
//! The engine evaluates against its own [`Value`] type, but callers often
//! hold data in some other tree (a `serde_json::Value`, a generated model
//! type). Anything implementing [`DataNode`] can be fed to
//! [`CompiledExpression::evaluate_node`](crate::CompiledExpression::evaluate_node).

use crate::value::{Map, Value};

/// The shape of a data node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Null,
    Boolean,
    Number,
    String,
    Array,
    Object,
}

/// A minimal, read-only interface over JSON-like data.
///
/// Implementors only describe their shape and hand out borrowed children;
/// the engine never writes through this interface.
pub trait DataNode {
    fn kind(&self) -> NodeKind;

    /// Field lookup. `None` for missing keys and for non-objects.
    fn get_field(&self, name: &str) -> Option<&Self>;

    /// Element lookup. `None` when out of range or not an array.
    fn get_index(&self, index: usize) -> Option<&Self>;

    /// Element count for arrays, entry count for objects, char count for
    /// strings, zero otherwise.
    fn length(&self) -> usize;

    /// Array elements in order; empty for non-arrays.
    fn iterate(&self) -> Box<dyn Iterator<Item = &Self> + '_>;

    /// Object entries in the node's own order; empty for non-objects.
    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &Self)> + '_>;

    fn as_bool(&self) -> Option<bool>;
    fn as_i64(&self) -> Option<i64>;
    fn as_f64(&self) -> Option<f64>;
    fn as_str(&self) -> Option<&str>;

    fn is_object(&self) -> bool {
        self.kind() == NodeKind::Object
    }

    fn is_array(&self) -> bool {
        self.kind() == NodeKind::Array
    }

    fn is_string(&self) -> bool {
        self.kind() == NodeKind::String
    }

    fn is_number(&self) -> bool {
        self.kind() == NodeKind::Number
    }

    fn is_boolean(&self) -> bool {
        self.kind() == NodeKind::Boolean
    }

    fn is_null(&self) -> bool {
        self.kind() == NodeKind::Null
    }
}

impl Value {
    /// Copies any [`DataNode`] tree into an owned `Value`.
    pub fn from_node<N: DataNode + ?Sized>(node: &N) -> Value {
        match node.kind() {
            NodeKind::Null => Value::Null,
            NodeKind::Boolean => Value::Boolean(node.as_bool().unwrap_or(false)),
            NodeKind::Number => match node.as_i64() {
                Some(i) => Value::Integer(i),
                None => node.as_f64().map(Value::Float).unwrap_or(Value::Null),
            },
            NodeKind::String => Value::String(node.as_str().unwrap_or_default().to_string()),
            NodeKind::Array => Value::Array(node.iterate().map(Value::from_node).collect()),
            NodeKind::Object => Value::Object(
                node.entries()
                    .map(|(k, v)| (k.to_string(), Value::from_node(v)))
                    .collect::<Map>(),
            ),
        }
    }
}

impl DataNode for Value {
    fn kind(&self) -> NodeKind {
        match self {
            Value::Null => NodeKind::Null,
            Value::Boolean(_) => NodeKind::Boolean,
            Value::Integer(_) | Value::Float(_) => NodeKind::Number,
            Value::String(_) => NodeKind::String,
            Value::Array(_) => NodeKind::Array,
            Value::Object(_) => NodeKind::Object,
        }
    }

    fn get_field(&self, name: &str) -> Option<&Self> {
        self.as_object()?.get(name)
    }

    fn get_index(&self, index: usize) -> Option<&Self> {
        self.as_array()?.get(index)
    }

    fn length(&self) -> usize {
        match self {
            Value::String(s) => s.chars().count(),
            Value::Array(arr) => arr.len(),
            Value::Object(obj) => obj.len(),
            _ => 0,
        }
    }

    fn iterate(&self) -> Box<dyn Iterator<Item = &Self> + '_> {
        match self {
            Value::Array(arr) => Box::new(arr.iter()),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &Self)> + '_> {
        match self {
            Value::Object(obj) => Box::new(obj.iter().map(|(k, v)| (k.as_str(), v))),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Integer(n) => Some(*n),
            _ => None,
        }
    }

    fn as_f64(&self) -> Option<f64> {
        self.as_float()
    }

    fn as_str(&self) -> Option<&str> {
        Value::as_str(self)
    }
}

impl DataNode for serde_json::Value {
    fn kind(&self) -> NodeKind {
        match self {
            serde_json::Value::Null => NodeKind::Null,
            serde_json::Value::Bool(_) => NodeKind::Boolean,
            serde_json::Value::Number(_) => NodeKind::Number,
            serde_json::Value::String(_) => NodeKind::String,
            serde_json::Value::Array(_) => NodeKind::Array,
            serde_json::Value::Object(_) => NodeKind::Object,
        }
    }

    fn get_field(&self, name: &str) -> Option<&Self> {
        self.as_object()?.get(name)
    }

    fn get_index(&self, index: usize) -> Option<&Self> {
        self.as_array()?.get(index)
    }

    fn length(&self) -> usize {
        match self {
            serde_json::Value::String(s) => s.chars().count(),
            serde_json::Value::Array(arr) => arr.len(),
            serde_json::Value::Object(obj) => obj.len(),
            _ => 0,
        }
    }

    fn iterate(&self) -> Box<dyn Iterator<Item = &Self> + '_> {
        match self {
            serde_json::Value::Array(arr) => Box::new(arr.iter()),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn entries(&self) -> Box<dyn Iterator<Item = (&str, &Self)> + '_> {
        match self {
            serde_json::Value::Object(obj) => Box::new(obj.iter().map(|(k, v)| (k.as_str(), v))),
            _ => Box::new(std::iter::empty()),
        }
    }

    fn as_bool(&self) -> Option<bool> {
        serde_json::Value::as_bool(self)
    }

    fn as_i64(&self) -> Option<i64> {
        serde_json::Value::as_i64(self)
    }

    fn as_f64(&self) -> Option<f64> {
        serde_json::Value::as_f64(self)
    }

    fn as_str(&self) -> Option<&str> {
        serde_json::Value::as_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn serde_json_nodes_convert() {
        let doc = json!({"a": [1, 2.5, "x", null, true]});
        let value = Value::from_node(&doc);
        assert_eq!(value, Value::from(doc.clone()));
        assert!(doc.get_field("a").is_some_and(|a| a.is_array() && a.length() == 5));
        assert!(doc.get_field("missing").is_none());
    }
}
