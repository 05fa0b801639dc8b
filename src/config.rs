//! Configuration boundary consumed by the estimate algebra and the
//! selectivity loader. The core treats configuration as read-only during
//! a run.

use crate::estimate::Pie;
use std::collections::HashMap;

/// Resolves a UDF's selectivity, independent of the static
/// selectivity-specification format in [`crate::selectivity`].
pub trait UdfSelectivityProvider: Send + Sync {
    fn provide_for(&self, predicate_descriptor: &str) -> Option<Pie>;
}

/// Always-absent provider, the default for hosts with no UDF selectivity
/// source configured.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoUdfSelectivityProvider;

impl UdfSelectivityProvider for NoUdfSelectivityProvider {
    fn provide_for(&self, _predicate_descriptor: &str) -> Option<Pie> {
        None
    }
}

/// Read-only configuration surface consumed by the estimator substrate.
pub trait Configuration: Send + Sync {
    fn get_optional_string_property(&self, key: &str) -> Option<String>;
    fn get_udf_selectivity_provider(&self) -> &dyn UdfSelectivityProvider;
}

/// In-memory configuration backed by a `HashMap`. Suitable as a default
/// for hosts that only need static key/value selectivity overrides and
/// for tests.
pub struct MapConfiguration {
    values: HashMap<String, String>,
    udf_provider: Box<dyn UdfSelectivityProvider>,
}

impl Default for MapConfiguration {
    fn default() -> Self {
        Self::new()
    }
}

impl MapConfiguration {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
            udf_provider: Box::new(NoUdfSelectivityProvider),
        }
    }

    pub fn with_udf_provider(mut self, provider: Box<dyn UdfSelectivityProvider>) -> Self {
        self.udf_provider = provider;
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }
}

impl Configuration for MapConfiguration {
    fn get_optional_string_property(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn get_udf_selectivity_provider(&self) -> &dyn UdfSelectivityProvider {
        self.udf_provider.as_ref()
    }
}
