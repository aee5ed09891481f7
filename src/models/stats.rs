//! Stats service wire types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::utils::helpers::date_format;

/// A single endpoint hit sent to `POST /hit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EndpointHit {
    pub app: String,
    pub uri: String,
    pub ip: String,
    #[serde(with = "date_format")]
    pub timestamp: DateTime<Utc>,
}

/// One row of the `GET /stats` response
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewStats {
    pub app: String,
    pub uri: String,
    pub hits: i64,
}

/// Parameters of a `GET /stats` query
#[derive(Debug, Clone, PartialEq)]
pub struct StatsQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub uris: Vec<String>,
    pub unique: bool,
}
