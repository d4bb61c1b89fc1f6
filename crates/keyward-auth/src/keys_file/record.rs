//! Loosely typed key records
//!
//! A keys file maps key material to a bag of JSON attributes. Nothing about
//! the shape of that bag is guaranteed, so every read goes through a typed
//! accessor that reports missing or mistyped attributes explicitly.

use keyward_core::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Key material to the attributes recorded for it
pub type KeyRecords = BTreeMap<String, KeyRecord>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct KeyRecord(Map<String, Value>);

impl KeyRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.0.insert(name.into(), value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    /// A non-empty string attribute that must be present
    pub fn required_str(&self, name: &str) -> Result<&str> {
        match self.optional_str(name)? {
            Some(value) if !value.is_empty() => Ok(value),
            _ => Err(Error::MissingAttribute(name.to_string())),
        }
    }

    /// A string attribute; absent and `null` both read as `None`
    pub fn optional_str(&self, name: &str) -> Result<Option<&str>> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(_) => Err(wrong_type(name, "string")),
        }
    }

    /// A list of strings; absent and `null` both read as empty
    pub fn str_list(&self, name: &str) -> Result<Vec<&str>> {
        match self.0.get(name) {
            None | Some(Value::Null) => Ok(Vec::new()),
            Some(Value::Array(values)) => values
                .iter()
                .map(|v| v.as_str().ok_or_else(|| wrong_type(name, "list of strings")))
                .collect(),
            Some(_) => Err(wrong_type(name, "list of strings")),
        }
    }
}

impl From<Map<String, Value>> for KeyRecord {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

fn wrong_type(name: &str, expected: &'static str) -> Error {
    Error::WrongAttributeType {
        attribute: name.to_string(),
        expected,
    }
}
