//! Per-data-type TTL policy.

use std::collections::HashMap;
use std::time::Duration;

use nodedeck_core::DataType;

/// How long a freshly fetched payload stays fresh, per data type.
///
/// Settings and webhook lists change rarely; power and sensor readings are
/// live values and go stale quickly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TtlPolicy {
    /// TTL for data types without an override.
    pub default_ttl: Duration,
    overrides: HashMap<DataType, Duration>,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self::new()
            .with_ttl(DataType::SystemSettings, Duration::from_secs(300))
            .with_ttl(DataType::Webhooks, Duration::from_secs(300))
            .with_ttl(DataType::PowerRanking, Duration::from_secs(60))
            .with_ttl(DataType::EnvironmentSensors, Duration::from_secs(30))
    }
}

impl TtlPolicy {
    /// Create a policy with a 60 second default and no overrides.
    pub fn new() -> Self {
        Self {
            default_ttl: Duration::from_secs(60),
            overrides: HashMap::new(),
        }
    }

    /// Set the default TTL.
    pub fn with_default(mut self, ttl: Duration) -> Self {
        self.default_ttl = ttl;
        self
    }

    /// Set the TTL for one data type.
    pub fn with_ttl(mut self, data_type: DataType, ttl: Duration) -> Self {
        self.overrides.insert(data_type, ttl);
        self
    }

    pub fn ttl_for(&self, data_type: DataType) -> Duration {
        self.overrides
            .get(&data_type)
            .copied()
            .unwrap_or(self.default_ttl)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = TtlPolicy::default();
        assert_eq!(policy.ttl_for(DataType::SystemSettings), Duration::from_secs(300));
        assert_eq!(policy.ttl_for(DataType::EnvironmentSensors), Duration::from_secs(30));
    }

    #[test]
    fn test_ttl_policy_builder() {
        let policy = TtlPolicy::new()
            .with_default(Duration::from_secs(120))
            .with_ttl(DataType::PowerRanking, Duration::from_secs(5));

        assert_eq!(policy.ttl_for(DataType::PowerRanking), Duration::from_secs(5));
        assert_eq!(policy.ttl_for(DataType::Webhooks), Duration::from_secs(120));
    }
}
