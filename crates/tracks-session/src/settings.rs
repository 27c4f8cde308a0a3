//! Environment-driven settings.
//!
//! | variable | meaning | default |
//! |---|---|---|
//! | `SHUFFLING_SEED` (or `CPT_SHUFFLING_SEED`) | seed of the event permutation | `1` |
//! | `CPT_DEV_BYPASS` | `true`/`yes`/`1` skips the decay-kind checks of a session | `false` |

use log::warn;
use serde::{Deserialize, Serialize};

pub const SHUFFLING_SEED_VARS: [&str; 2] = ["SHUFFLING_SEED", "CPT_SHUFFLING_SEED"];
pub const DEV_BYPASS_VAR: &str = "CPT_DEV_BYPASS";

const DEFAULT_SEED: u64 = 1;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Seed shared by all views when shuffling events.
    pub shuffling_seed: u64,
    /// Development switch: enable every action regardless of workflow state.
    pub dev_bypass: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            shuffling_seed: DEFAULT_SEED,
            dev_bypass: false,
        }
    }
}

impl Settings {
    /// Read settings from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read settings through an arbitrary variable lookup.
    ///
    /// Empty values count as unset. An unparseable seed falls back to the
    /// default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let shuffling_seed = SHUFFLING_SEED_VARS
            .iter()
            .find_map(|name| get(*name).map(|v| (*name, v)))
            .map_or(DEFAULT_SEED, |(name, value)| parse_seed(name, value.trim()));

        let dev_bypass = get(DEV_BYPASS_VAR)
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "true" | "yes" | "1"))
            .unwrap_or(false);

        Self {
            shuffling_seed,
            dev_bypass,
        }
    }
}

/// Seeds are unsigned: negative integers fall back to the default just like
/// text that is not a number, but with their own warning.
fn parse_seed(name: &str, value: &str) -> u64 {
    if let Ok(seed) = value.parse() {
        return seed;
    }
    if value.parse::<i64>().is_ok() {
        warn!("negative value {value} for {name}, using fallback seed {DEFAULT_SEED}");
    } else {
        warn!("invalid value {value:?} for {name}, using fallback seed {DEFAULT_SEED}");
    }
    DEFAULT_SEED
}
