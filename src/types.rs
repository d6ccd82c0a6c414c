// =============================================================================
// Shared types used across the futures scoring engine
// =============================================================================

use serde::{Deserialize, Serialize};

/// Discrete trading recommendation derived from a 0-100 composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    StrongBuy,
    Buy,
    Hold,
    Watch,
    Reduce,
    Sell,
    StrongSell,
}

impl Recommendation {
    /// Map a composite score onto a recommendation.
    ///
    /// Lower bounds are inclusive: 80 is `StrongBuy`, 79 is `Buy`.
    pub fn from_score(score: u8) -> Self {
        match score {
            80..=u8::MAX => Self::StrongBuy,
            65..=79 => Self::Buy,
            55..=64 => Self::Hold,
            45..=54 => Self::Watch,
            35..=44 => Self::Reduce,
            20..=34 => Self::Sell,
            _ => Self::StrongSell,
        }
    }
}

impl std::fmt::Display for Recommendation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::StrongBuy => write!(f, "Strong Buy"),
            Self::Buy => write!(f, "Buy"),
            Self::Hold => write!(f, "Hold"),
            Self::Watch => write!(f, "Watch"),
            Self::Reduce => write!(f, "Reduce"),
            Self::Sell => write!(f, "Sell"),
            Self::StrongSell => write!(f, "Strong Sell"),
        }
    }
}

/// The six factor categories that feed the composite score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Factor {
    Trend,
    Momentum,
    Volatility,
    Volume,
    OpenInterest,
    Basis,
}

impl Factor {
    pub const ALL: [Factor; 6] = [
        Factor::Trend,
        Factor::Momentum,
        Factor::Volatility,
        Factor::Volume,
        Factor::OpenInterest,
        Factor::Basis,
    ];
}

impl std::fmt::Display for Factor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Trend => write!(f, "trend"),
            Self::Momentum => write!(f, "momentum"),
            Self::Volatility => write!(f, "volatility"),
            Self::Volume => write!(f, "volume"),
            Self::OpenInterest => write!(f, "open_interest"),
            Self::Basis => write!(f, "basis"),
        }
    }
}
