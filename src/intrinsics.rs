//! Helpers for CloudFormation intrinsic functions and the value types that
//! may carry them.

use serde::Serialize;
use serde_json::{json, Value};

/// `{ "Ref": logical_id }`
pub fn get_ref(logical_id: &str) -> Value {
    json!({ "Ref": logical_id })
}

/// `{ "Fn::GetAtt": [logical_id, attribute] }`
pub fn get_att(logical_id: &str, attribute: &str) -> Value {
    json!({ "Fn::GetAtt": [logical_id, attribute] })
}

/// `{ "Fn::Join": [delimiter, parts] }`
pub fn join(delimiter: &str, parts: Vec<Value>) -> Value {
    json!({ "Fn::Join": [delimiter, parts] })
}

/// A property that is either a literal string, or some intrinsic
/// that resolves to a string at deploy time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StrVal {
    String(String),
    Val(Value),
}

impl From<&str> for StrVal {
    fn from(value: &str) -> Self {
        StrVal::String(value.to_string())
    }
}

impl From<String> for StrVal {
    fn from(value: String) -> Self {
        StrVal::String(value)
    }
}

impl From<Value> for StrVal {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => StrVal::String(s),
            other => StrVal::Val(other),
        }
    }
}

impl StrVal {
    /// the literal string, if this is not an intrinsic.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StrVal::String(s) => Some(s),
            StrVal::Val(_) => None,
        }
    }
}

/// IAM and a few other CloudFormation properties accept either a single
/// item or a list of them. A single item is written without the list.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OneOrMany<T> {
    One(T),
    Many(Vec<T>),
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(mut value: Vec<T>) -> Self {
        if value.len() == 1 {
            if let Some(single) = value.pop() {
                return OneOrMany::One(single);
            }
        }
        OneOrMany::Many(value)
    }
}
