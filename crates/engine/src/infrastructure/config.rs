//! Engine configuration read from the environment.

use std::str::FromStr;

use ringside_domain::CompanyId;

pub const DEFAULT_DB_PATH: &str = "ringside.db";
/// Value of `RINGSIDE_DB` that selects the in-memory store.
pub const IN_MEMORY_DB: &str = ":memory:";

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// SQLite database path, or `:memory:` for the in-memory store
    pub db_path: String,
    /// Seed for a replayable run; `None` uses the thread RNG
    pub seed: Option<u64>,
    /// Company to run the weekly update for
    pub company_id: Option<CompanyId>,
    pub weeks: u32,
    /// Locker-room morale fed to crisis triggering
    pub morale: Option<i32>,
    /// Active rumor count fed to crisis triggering
    pub rumors: Option<u32>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            db_path: DEFAULT_DB_PATH.to_string(),
            seed: None,
            company_id: None,
            weeks: 1,
            morale: None,
            rumors: None,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup. Unparseable values fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        Self {
            db_path: get("RINGSIDE_DB").unwrap_or(defaults.db_path),
            seed: parse_var("RINGSIDE_SEED", get("RINGSIDE_SEED")),
            company_id: parse_var("RINGSIDE_COMPANY_ID", get("RINGSIDE_COMPANY_ID")),
            weeks: parse_var("RINGSIDE_WEEKS", get("RINGSIDE_WEEKS"))
                .filter(|w| *w > 0)
                .unwrap_or(defaults.weeks),
            morale: parse_var::<i32>("RINGSIDE_MORALE", get("RINGSIDE_MORALE"))
                .map(|m| m.clamp(0, 100)),
            rumors: parse_var("RINGSIDE_RUMORS", get("RINGSIDE_RUMORS")),
        }
    }

    pub fn uses_memory_store(&self) -> bool {
        self.db_path == IN_MEMORY_DB
    }
}

fn parse_var<T: FromStr>(key: &str, raw: Option<String>) -> Option<T> {
    let raw = raw?;
    match raw.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(key, value = %raw, "Ignoring unparseable configuration value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> EngineConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        EngineConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        assert_eq!(config(&[]), EngineConfig::default());
        assert!(!EngineConfig::default().uses_memory_store());
    }

    #[test]
    fn values_are_parsed() {
        let company = CompanyId::new();
        let company_str = company.to_string();
        let cfg = config(&[
            ("RINGSIDE_DB", ":memory:"),
            ("RINGSIDE_SEED", "42"),
            ("RINGSIDE_COMPANY_ID", company_str.as_str()),
            ("RINGSIDE_WEEKS", "4"),
            ("RINGSIDE_MORALE", "140"),
            ("RINGSIDE_RUMORS", "3"),
        ]);
        assert!(cfg.uses_memory_store());
        assert_eq!(cfg.seed, Some(42));
        assert_eq!(cfg.company_id, Some(company));
        assert_eq!(cfg.weeks, 4);
        assert_eq!(cfg.morale, Some(100));
        assert_eq!(cfg.rumors, Some(3));
    }

    #[test]
    fn bad_values_fall_back() {
        let cfg = config(&[
            ("RINGSIDE_SEED", "abc"),
            ("RINGSIDE_WEEKS", "0"),
            ("RINGSIDE_COMPANY_ID", "not-a-uuid"),
            ("RINGSIDE_DB", "   "),
        ]);
        assert_eq!(cfg.seed, None);
        assert_eq!(cfg.weeks, 1);
        assert_eq!(cfg.company_id, None);
        assert_eq!(cfg.db_path, DEFAULT_DB_PATH);
    }
}
