//! Selectivity specifications: a [`Pie`] persisted in configuration as a
//! small JSON object and loaded lazily when an estimator needs it.

use crate::config::Configuration;
use crate::error::{Result, SpecificationError};
use crate::estimate::Pie;
use serde::Deserialize;
use tracing::warn;

const RECOGNIZED_TYPE: &str = "juel";

#[derive(Debug, Deserialize)]
struct SelectivitySpecJson {
    #[serde(rename = "type", default = "default_type")]
    kind: String,
    p: f64,
    lower: f64,
    upper: f64,
    #[serde(default)]
    coeff: f64,
}

fn default_type() -> String {
    RECOGNIZED_TYPE.to_string()
}

/// Hook for caching parsed selectivity specifications by configuration
/// key. The source hints at a load-profile-estimator cache that is
/// present but disabled; this trait keeps that seam without activating
/// it. [`NoCache`] is the always-miss default and is behaviorally
/// identical to having no cache at all.
pub trait SelectivityCache: Send + Sync {
    fn get(&self, key: &str) -> Option<Pie>;
    fn put(&self, key: &str, pie: Pie);
}

/// Always-miss cache. Reading never returns anything; writing is a no-op.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoCache;

impl SelectivityCache for NoCache {
    fn get(&self, _key: &str) -> Option<Pie> {
        None
    }

    fn put(&self, _key: &str, _pie: Pie) {}
}

/// Look up and parse the selectivity specification stored under `key` in
/// `config`. Absence of the key is a soft condition: a warning is logged
/// and `Ok(None)` is returned so callers can fall back to a default
/// estimator. Presence of a malformed or unrecognized specification is a
/// hard error.
pub fn load_selectivity(config: &dyn Configuration, key: &str) -> Result<Option<Pie>> {
    let Some(raw) = config.get_optional_string_property(key) else {
        warn!(key, "no selectivity specification found; using null estimate");
        return Ok(None);
    };

    let spec: SelectivitySpecJson = serde_json::from_str(&raw).map_err(|e| {
        SpecificationError::Malformed(format!("key {key}: {e}"))
    })?;

    if spec.kind != RECOGNIZED_TYPE {
        return Err(SpecificationError::UnknownType(spec.kind).into());
    }

    Ok(Some(
        Pie::builder(spec.lower, spec.upper, spec.p)
            .coeff(spec.coeff)
            .key_string(key)
            .build(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfiguration;

    #[test]
    fn missing_key_yields_null_estimate() {
        let config = MapConfiguration::default();
        let result = load_selectivity(&config, "dedup.selectivity").unwrap();
        assert!(result.is_none());
    }

    #[test]
    fn valid_spec_parses_into_pie() {
        let mut config = MapConfiguration::default();
        config.set(
            "dedup.selectivity",
            r#"{"type":"juel","p":0.9,"lower":0.3,"upper":0.5,"coeff":0}"#,
        );

        let pie = load_selectivity(&config, "dedup.selectivity").unwrap().unwrap();
        assert_eq!(pie.lower, 0.3);
        assert_eq!(pie.upper, 0.5);
        assert_eq!(pie.p, 0.9);
        assert_eq!(pie.coeff, 0.0);
        assert_eq!(pie.key_string, "dedup.selectivity");
    }

    #[test]
    fn missing_type_defaults_to_juel() {
        let mut config = MapConfiguration::default();
        config.set("k", r#"{"p":0.5,"lower":0.1,"upper":0.2}"#);
        assert!(load_selectivity(&config, "k").unwrap().is_some());
    }

    #[test]
    fn unknown_type_is_rejected() {
        let mut config = MapConfiguration::default();
        config.set("k", r#"{"type":"sql","p":0.5,"lower":0.1,"upper":0.2}"#);
        let err = load_selectivity(&config, "k").unwrap_err();
        assert!(err.to_string().contains("unknown specification type"));
    }

    #[test]
    fn malformed_json_is_rejected() {
        let mut config = MapConfiguration::default();
        config.set("k", "not json");
        let err = load_selectivity(&config, "k").unwrap_err();
        assert!(err.to_string().contains("could not initialize from specification"));
    }

    #[test]
    fn no_cache_always_misses() {
        let cache = NoCache;
        cache.put("k", Pie::exact(1.0));
        assert!(cache.get("k").is_none());
    }
}
