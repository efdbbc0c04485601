//! Runtime configuration for shellkit-seriko-core.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use serde::{Deserialize, Serialize};

/// Knobs for one [`Seriko`](crate::Seriko) instance.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Seed for the wait/choice RNG. `None` draws a seed from OS entropy.
    pub seed: Option<u64>,

    /// Upper bound on queue entries one animation may process in a tick.
    /// Exceeding it drops the rest of that animation's tick; the others still
    /// run to completion.
    pub max_steps_per_tick: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            seed: None,
            max_steps_per_tick: 100_000,
        }
    }
}

impl Config {
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    pub(crate) fn rng(&self) -> Pcg64Mcg {
        let seed = self.seed.unwrap_or_else(rand::random::<u64>);
        Pcg64Mcg::seed_from_u64(seed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn seeded_rngs_agree() {
        let cfg = Config::with_seed(7);
        let (mut a, mut b) = (cfg.rng(), cfg.rng());
        for _ in 0..4 {
            assert_eq!(a.random::<u64>(), b.random::<u64>());
        }
    }

    #[test]
    fn partial_json_uses_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"seed": 3}"#).expect("config json");
        assert_eq!(cfg.seed, Some(3));
        assert_eq!(cfg.max_steps_per_tick, 100_000);
    }
}
