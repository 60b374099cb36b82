//! `key/ value` parameter lists
//!
//! Component and meta payloads are blank-line separated records, each split
//! on its first `/`. Keys and values are trimmed.

use crate::error::{CgmlError, Result};
use std::collections::BTreeMap;

pub fn parse_parameters(text: &str) -> Result<BTreeMap<String, String>> {
    let mut parameters = BTreeMap::new();
    for record in text.split("\n\n").filter(|r| !r.trim().is_empty()) {
        let (key, value) = record
            .split_once('/')
            .ok_or_else(|| CgmlError::MalformedParameter(record.trim().to_string()))?;
        parameters.insert(key.trim().to_string(), value.trim().to_string());
    }
    Ok(parameters)
}

/// Write pairs in the order given.
pub fn serialize_parameters<'a, I>(parameters: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    parameters
        .into_iter()
        .map(|(key, value)| format!("{key}/ {value}\n\n"))
        .collect()
}
