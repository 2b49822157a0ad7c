//! Engine configuration.

use anyhow::{bail, Context, Result};
use shelfmark_packing::{
    ExactPacker, GreedyPacker, Packer, PackingStrategy, DEFAULT_EXACT_ITEM_LIMIT,
    DEFAULT_HAZARD_TRIPLE_LIMIT,
};

pub const ENV_SHELF_CAPACITY: &str = "SHELFMARK_SHELF_CAPACITY";
pub const ENV_PACKING_STRATEGY: &str = "SHELFMARK_PACKING_STRATEGY";
pub const ENV_HAZARD_TRIPLE_LIMIT: &str = "SHELFMARK_HAZARD_TRIPLE_LIMIT";
pub const ENV_EXACT_ITEM_LIMIT: &str = "SHELFMARK_EXACT_ITEM_LIMIT";
pub const ENV_MAILBOX_CAPACITY: &str = "SHELFMARK_MAILBOX_CAPACITY";
pub const ENV_LOG_LEVEL: &str = "SHELFMARK_LOG_LEVEL";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub shelf_capacity: f64,
    pub strategy: PackingStrategy,
    pub hazard_triple_limit: usize,
    pub exact_item_limit: usize,
    pub mailbox_capacity: usize,
    pub log_level: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            shelf_capacity: 8.0,
            strategy: PackingStrategy::Greedy,
            hazard_triple_limit: DEFAULT_HAZARD_TRIPLE_LIMIT,
            exact_item_limit: DEFAULT_EXACT_ITEM_LIMIT,
            mailbox_capacity: 64,
            log_level: "info".to_string(),
        }
    }
}

impl EngineConfig {
    /// Reads the configuration from `SHELFMARK_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Builds a configuration from any variable source; unset variables
    /// keep their defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let shelf_capacity = match lookup(ENV_SHELF_CAPACITY) {
            Some(raw) => parse_capacity(&raw)
                .with_context(|| format!("invalid {ENV_SHELF_CAPACITY}"))?,
            None => defaults.shelf_capacity,
        };

        let strategy = match lookup(ENV_PACKING_STRATEGY) {
            Some(raw) => raw
                .parse::<PackingStrategy>()
                .with_context(|| format!("invalid {ENV_PACKING_STRATEGY}"))?,
            None => defaults.strategy,
        };

        let hazard_triple_limit = match lookup(ENV_HAZARD_TRIPLE_LIMIT) {
            Some(raw) => parse_count(&raw, 0)
                .with_context(|| format!("invalid {ENV_HAZARD_TRIPLE_LIMIT}"))?,
            None => defaults.hazard_triple_limit,
        };

        let exact_item_limit = match lookup(ENV_EXACT_ITEM_LIMIT) {
            Some(raw) => parse_count(&raw, 1)
                .with_context(|| format!("invalid {ENV_EXACT_ITEM_LIMIT}"))?,
            None => defaults.exact_item_limit,
        };

        let mailbox_capacity = match lookup(ENV_MAILBOX_CAPACITY) {
            Some(raw) => parse_count(&raw, 1)
                .with_context(|| format!("invalid {ENV_MAILBOX_CAPACITY}"))?,
            None => defaults.mailbox_capacity,
        };

        let log_level = lookup(ENV_LOG_LEVEL).unwrap_or(defaults.log_level);

        Ok(Self {
            shelf_capacity,
            strategy,
            hazard_triple_limit,
            exact_item_limit,
            mailbox_capacity,
            log_level,
        })
    }

    /// Builds the packer selected by `strategy`.
    pub fn packer(&self) -> Box<dyn Packer> {
        match self.strategy {
            PackingStrategy::Greedy => Box::new(GreedyPacker::new(self.hazard_triple_limit)),
            PackingStrategy::Exact => Box::new(ExactPacker::new(self.exact_item_limit)),
        }
    }
}

/// Parses a shelf capacity: a finite number greater than zero.
pub fn parse_capacity(raw: &str) -> Result<f64> {
    let value: f64 = raw
        .trim()
        .parse()
        .with_context(|| format!("{raw:?} is not a number"))?;
    if !value.is_finite() || value <= 0.0 {
        bail!("capacity must be finite and positive, got {value}");
    }
    Ok(value)
}

/// Parses a count that must be at least `min`.
pub fn parse_count(raw: &str, min: usize) -> Result<usize> {
    let value: usize = raw
        .trim()
        .parse()
        .with_context(|| format!("{raw:?} is not a non-negative integer"))?;
    if value < min {
        bail!("value must be at least {min}, got {value}");
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = EngineConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, EngineConfig::default());
        assert_eq!(config.shelf_capacity, 8.0);
        assert_eq!(config.exact_item_limit, 15);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = EngineConfig::from_lookup(lookup(&[
            (ENV_SHELF_CAPACITY, "7.5"),
            (ENV_PACKING_STRATEGY, "exact"),
            (ENV_HAZARD_TRIPLE_LIMIT, "0"),
            (ENV_EXACT_ITEM_LIMIT, "10"),
            (ENV_MAILBOX_CAPACITY, "8"),
            (ENV_LOG_LEVEL, "debug"),
        ]))
        .unwrap();

        assert_eq!(config.shelf_capacity, 7.5);
        assert_eq!(config.strategy, PackingStrategy::Exact);
        assert_eq!(config.hazard_triple_limit, 0);
        assert_eq!(config.exact_item_limit, 10);
        assert_eq!(config.mailbox_capacity, 8);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.packer().strategy(), PackingStrategy::Exact);
    }

    #[rstest]
    #[case(ENV_SHELF_CAPACITY, "0")]
    #[case(ENV_SHELF_CAPACITY, "-2")]
    #[case(ENV_SHELF_CAPACITY, "inf")]
    #[case(ENV_SHELF_CAPACITY, "heavy")]
    #[case(ENV_PACKING_STRATEGY, "best-fit")]
    #[case(ENV_EXACT_ITEM_LIMIT, "0")]
    #[case(ENV_MAILBOX_CAPACITY, "0")]
    #[case(ENV_HAZARD_TRIPLE_LIMIT, "-1")]
    fn test_rejects_invalid_values(#[case] name: &str, #[case] value: &str) {
        let err = EngineConfig::from_lookup(lookup(&[(name, value)])).unwrap_err();
        assert!(err.to_string().contains(name));
    }

    #[test]
    fn test_parse_capacity_trims() {
        assert_eq!(parse_capacity(" 12 ").unwrap(), 12.0);
    }
}
