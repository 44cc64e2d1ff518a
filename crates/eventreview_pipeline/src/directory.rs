//! Known-manager directory.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

use crate::spec::ReportError;

/// Recognized manager names with opaque metadata.
///
/// Only the key set drives segmentation. Names are trimmed and iterated in
/// sorted order.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(transparent)]
pub struct ManagerDirectory {
    dict_managers: BTreeMap<String, Value>,
}

impl ManagerDirectory {
    /// Build a directory from a name -> metadata map.
    pub fn new(dict_managers: BTreeMap<String, Value>) -> Result<Self, ReportError> {
        let mut dict_clean = BTreeMap::new();
        for (name, meta) in dict_managers {
            let c_name = name.trim();
            if c_name.is_empty() {
                return Err(ReportError::InvalidManagerDirectory(
                    "manager name must not be blank".to_string(),
                ));
            }
            if c_name.contains(crate::conf::C_TOKEN_SEPARATOR) {
                return Err(ReportError::InvalidManagerDirectory(format!(
                    "manager name {c_name:?} contains the token separator"
                )));
            }
            dict_clean.insert(c_name.to_string(), meta);
        }
        Ok(Self {
            dict_managers: dict_clean,
        })
    }

    /// Build a directory from bare names.
    pub fn from_names<I, S>(names: I) -> Result<Self, ReportError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(
            names
                .into_iter()
                .map(|name| (name.as_ref().to_string(), Value::Null))
                .collect(),
        )
    }

    /// Parse a JSON object document (`{"name": metadata, ...}`).
    pub fn from_json_str(txt: &str) -> Result<Self, ReportError> {
        let raw: ManagerDirectory = serde_json::from_str(txt)
            .map_err(|err| ReportError::InvalidManagerDirectory(err.to_string()))?;
        Self::new(raw.dict_managers)
    }

    /// Manager names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.dict_managers.keys().map(String::as_str)
    }

    /// Whether `name` is a known manager.
    pub fn contains(&self, name: &str) -> bool {
        self.dict_managers.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.dict_managers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dict_managers.is_empty()
    }
}
