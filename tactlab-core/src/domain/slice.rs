//! DataSlice: everything that arrived in one data event.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::cape::CapeRecord;

/// One observation for an instrument or a custom dataset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    /// Daily close of a tradable instrument.
    Price { close: f64 },
    /// A CAPE custom-data record.
    Cape(CapeRecord),
}

/// Mapping from instrument/dataset identifier to its latest observation.
///
/// Keys are kept in a `BTreeMap` so iteration order is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataSlice {
    pub date: NaiveDate,
    entries: BTreeMap<String, Observation>,
}

impl DataSlice {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            entries: BTreeMap::new(),
        }
    }

    pub fn insert(&mut self, key: impl Into<String>, observation: Observation) {
        self.entries.insert(key.into(), observation);
    }

    /// Builder form of [`insert`](Self::insert).
    pub fn with(mut self, key: impl Into<String>, observation: Observation) -> Self {
        self.insert(key, observation);
        self
    }

    /// The CAPE record stored under `key`, if that entry is a CAPE observation.
    pub fn cape(&self, key: &str) -> Option<&CapeRecord> {
        match self.entries.get(key)? {
            Observation::Cape(record) => Some(record),
            Observation::Price { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2020, 1, 31).unwrap()
    }

    #[test]
    fn cape_lookup_ignores_price_entries() {
        let slice = DataSlice::new(date())
            .with("SPX", Observation::Price { close: 3225.5 })
            .with(
                "CAPE",
                Observation::Cape(CapeRecord {
                    date: date(),
                    value: 30.9,
                }),
            );

        assert_eq!(slice.cape("CAPE").map(|r| r.value), Some(30.9));
        assert!(slice.cape("SPX").is_none());
        assert!(slice.cape("missing").is_none());
    }

    #[test]
    fn observation_serialization_is_tagged() {
        let json = serde_json::to_string(&Observation::Price { close: 10.0 }).unwrap();
        assert!(json.contains("\"kind\":\"price\""));
    }
}
