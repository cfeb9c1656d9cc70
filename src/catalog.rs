//! In-process search backend for the demo form.
//!
//! Records are loaded from JSON and matched by case-insensitive substring.
//! Names starting with the query rank before names that merely contain it.
//! A fixed delay before answering stands in for a remote service.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{Result, TypeaheadError};
use crate::typeahead::{LookupFuture, SearchSource};

const BUILTIN_PLACES: &str = include_str!("../data/places.json");

/// One searchable record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Primary text, matched against the query.
    pub name: String,
    /// Secondary column text.
    #[serde(default)]
    pub detail: Option<String>,
}

impl Record {
    pub fn new(name: impl Into<String>, detail: Option<&str>) -> Self {
        Self {
            name: name.into(),
            detail: detail.map(String::from),
        }
    }
}

/// The datasets behind the demo fields.
#[derive(Debug, Clone, Deserialize)]
pub struct Places {
    pub countries: Vec<Record>,
    pub cities: Vec<Record>,
}

impl Places {
    /// The dataset shipped with the binary.
    pub fn builtin() -> Result<Self> {
        Self::parse(BUILTIN_PLACES)
    }

    /// Load a dataset from a JSON file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let places = Self::parse(&contents)?;
        info!(
            path = %path.display(),
            countries = places.countries.len(),
            cities = places.cities.len(),
            "Loaded catalog"
        );
        Ok(places)
    }

    fn parse(json: &str) -> Result<Self> {
        serde_json::from_str(json)
            .map_err(|e| TypeaheadError::other(format!("Invalid catalog file: {}", e)))
    }
}

/// A searchable list of records with simulated latency.
#[derive(Debug, Clone)]
pub struct Catalog {
    name: &'static str,
    records: Arc<Vec<Record>>,
    latency: Duration,
    max_results: usize,
}

impl Catalog {
    pub fn new(name: &'static str, records: Vec<Record>) -> Self {
        Self {
            name,
            records: Arc::new(records),
            latency: Duration::ZERO,
            max_results: usize::MAX,
        }
    }

    /// Delay every answer by `latency`.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = latency;
        self
    }

    /// Return at most `max_results` records per query.
    pub fn with_max_results(mut self, max_results: usize) -> Self {
        self.max_results = max_results;
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Match records against `query` without delay.
    ///
    /// An empty query matches everything.
    pub fn matches(&self, query: &str) -> Vec<Record> {
        filter(&self.records, query, self.max_results)
    }
}

fn filter(records: &[Record], query: &str, limit: usize) -> Vec<Record> {
    let needle = query.trim().to_lowercase();
    let mut prefix = Vec::new();
    let mut inner = Vec::new();

    for record in records {
        let name = record.name.to_lowercase();
        if name.starts_with(&needle) {
            prefix.push(record);
        } else if name.contains(&needle) {
            inner.push(record);
        }
    }

    prefix.into_iter().chain(inner).take(limit).cloned().collect()
}

impl SearchSource<Record> for Catalog {
    fn search(&self, query: String) -> LookupFuture<Record> {
        let records = Arc::clone(&self.records);
        let latency = self.latency;
        let limit = self.max_results;
        let name = self.name;

        Box::pin(async move {
            if !latency.is_zero() {
                tokio::time::sleep(latency).await;
            }
            let found = filter(&records, &query, limit);
            debug!(catalog = name, query = %query, count = found.len(), "Catalog search");
            Ok(found)
        })
    }
}
