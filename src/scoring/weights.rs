// =============================================================================
// Factor Weights
// =============================================================================

use serde::{Deserialize, Serialize};

use crate::types::Factor;

fn default_trend() -> f64 {
    0.25
}

fn default_momentum() -> f64 {
    0.20
}

fn default_volatility() -> f64 {
    0.15
}

fn default_volume() -> f64 {
    0.15
}

fn default_open_interest() -> f64 {
    0.15
}

fn default_basis() -> f64 {
    0.10
}

/// Relative weight of each factor in the composite score.  The weights need
/// not sum to one; they are applied as-is.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Weights {
    #[serde(default = "default_trend")]
    pub trend: f64,
    #[serde(default = "default_momentum")]
    pub momentum: f64,
    #[serde(default = "default_volatility")]
    pub volatility: f64,
    #[serde(default = "default_volume")]
    pub volume: f64,
    #[serde(default = "default_open_interest")]
    pub open_interest: f64,
    #[serde(default = "default_basis")]
    pub basis: f64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            trend: default_trend(),
            momentum: default_momentum(),
            volatility: default_volatility(),
            volume: default_volume(),
            open_interest: default_open_interest(),
            basis: default_basis(),
        }
    }
}

impl Weights {
    pub fn get(&self, factor: Factor) -> f64 {
        match factor {
            Factor::Trend => self.trend,
            Factor::Momentum => self.momentum,
            Factor::Volatility => self.volatility,
            Factor::Volume => self.volume,
            Factor::OpenInterest => self.open_interest,
            Factor::Basis => self.basis,
        }
    }

    pub fn total(&self) -> f64 {
        Factor::ALL.iter().map(|&f| self.get(f)).sum()
    }
}
