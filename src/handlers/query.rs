//! Query string access for the search endpoints
//!
//! List parameters may be given comma separated (`states=PENDING,PUBLISHED`),
//! repeated (`states=PENDING&states=PUBLISHED`) or both.

use std::str::FromStr;

use crate::utils::errors::{EventHubError, Result};

/// Decoded query pairs in request order
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    pub fn new(pairs: Vec<(String, String)>) -> Self {
        Self { pairs }
    }

    /// Last value given for `key`; blank values count as absent
    pub fn value(&self, key: &str) -> Option<String> {
        self.pairs
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.trim().to_string())
            .filter(|v| !v.is_empty())
    }

    /// Every entry of a list parameter across repeated keys and commas
    pub fn list(&self, key: &str) -> Vec<String> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .flat_map(|(_, v)| v.split(','))
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect()
    }

    /// Parse a scalar parameter
    pub fn parse<T: FromStr>(&self, key: &str) -> Result<Option<T>> {
        self.value(key)
            .map(|raw| {
                raw.parse::<T>()
                    .map_err(|_| EventHubError::validation(format!("Parameter '{}' is invalid: {}", key, raw)))
            })
            .transpose()
    }

    /// Parse every entry of a list parameter; `None` when the list is empty
    pub fn parse_list<T, F>(&self, key: &str, parse: F) -> Result<Option<Vec<T>>>
    where
        F: Fn(&str) -> Result<T>,
    {
        let values = self.list(key);
        if values.is_empty() {
            return Ok(None);
        }
        values.iter().map(|v| parse(v)).collect::<Result<Vec<_>>>().map(Some)
    }

    /// Id list such as `users` or `categories`
    pub fn ids(&self, key: &str) -> Result<Option<Vec<i64>>> {
        self.parse_list(key, |raw| {
            raw.parse::<i64>()
                .map_err(|_| EventHubError::validation(format!("Parameter '{}' contains invalid id: {}", key, raw)))
        })
    }
}
