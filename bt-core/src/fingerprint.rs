//! Run fingerprinting — deterministic identity for a backtest configuration.
//!
//! A strategy is an arbitrary `impl Strategy`, not a fixed set of
//! components, so it cannot be hashed structurally the way a closed set of
//! component types could. Instead the caller supplies its own parameters
//! as a `serde_json::Value` (typically `serde_json::to_value(&my_params)`
//! on whatever struct configures the strategy) and the engine config is
//! hashed alongside it. `serde_json::Map` is BTreeMap-backed without the
//! `preserve_order` feature, so key order in the combined JSON is already
//! deterministic — no custom canonicalization needed.

use crate::domain::ids::{ConfigHash, RunId};
use crate::engine::config::EngineConfig;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Hash the engine configuration and strategy parameters together.
/// Two runs with identical configuration and strategy parameters always
/// produce the same hash, regardless of the bars fed through them.
pub fn config_hash(engine_config: &EngineConfig, strategy_params: &Value) -> ConfigHash {
    let combined = serde_json::json!({
        "engine": engine_config,
        "strategy": strategy_params,
    });
    let canonical = serde_json::to_string(&combined).expect("config must serialize");
    ConfigHash::from_bytes(canonical.as_bytes())
}

/// Identity record for one backtest run: what configuration produced it,
/// over how many bars, and when it was computed. Suitable for appending to
/// a run-history log to detect repeated or duplicate configurations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunFingerprint {
    pub run_id: RunId,
    pub config_hash: ConfigHash,
    pub computed_at: DateTime<Utc>,
    pub bar_count: usize,
}

impl RunFingerprint {
    /// `run_id` additionally folds in `bar_count`, so the same configuration
    /// run over a longer or shorter bar series is a distinct run identity
    /// even though its `config_hash` is unchanged.
    pub fn new(engine_config: &EngineConfig, strategy_params: &Value, bar_count: usize) -> Self {
        let hash = config_hash(engine_config, strategy_params);
        let run_id = RunId::from_bytes(format!("{}:{bar_count}", hash.as_hex()).as_bytes());
        Self { run_id, config_hash: hash, computed_at: Utc::now(), bar_count }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_hash_is_structural_plus_values() {
        let config = EngineConfig::default();
        let params = serde_json::json!({"lookback": 20});
        let h1 = config_hash(&config, &params);
        let h2 = config_hash(&config, &params);
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_strategy_params_change_the_hash() {
        let config = EngineConfig::default();
        let h1 = config_hash(&config, &serde_json::json!({"lookback": 20}));
        let h2 = config_hash(&config, &serde_json::json!({"lookback": 50}));
        assert_ne!(h1, h2);
    }

    #[test]
    fn different_engine_config_changes_the_hash() {
        let params = serde_json::json!({"lookback": 20});
        let mut c2 = EngineConfig::default();
        c2.max_positions = 10;
        assert_ne!(config_hash(&EngineConfig::default(), &params), config_hash(&c2, &params));
    }

    #[test]
    fn run_id_differs_by_bar_count_even_with_identical_config_hash() {
        let config = EngineConfig::default();
        let params = serde_json::json!({"lookback": 20});
        let fp1 = RunFingerprint::new(&config, &params, 500);
        let fp2 = RunFingerprint::new(&config, &params, 1000);
        assert_eq!(fp1.config_hash, fp2.config_hash);
        assert_ne!(fp1.run_id, fp2.run_id);
    }
}
