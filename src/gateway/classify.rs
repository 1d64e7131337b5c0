use serde::{Deserialize, Serialize};

/// Stunting risk tier derived from the height-for-age z-score. Ordered most
/// severe first; `as_str` is the record-store lookup key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Deserialize, Serialize)]
pub enum RiskTier {
    Severe,
    Moderate,
    Mild,
    Normal,
}

impl RiskTier {
    /// Boundary semantics: the exact boundary value always lands in the less
    /// severe tier (`-3.0` is Moderate, `-2.0` is Mild, `-1.0` is Normal).
    /// Non-finite scores must be rejected by payload validation before this
    /// is called.
    pub fn from_z_score(z: f64) -> Self {
        if z < -3.0 {
            Self::Severe
        } else if z < -2.0 {
            Self::Moderate
        } else if z < -1.0 {
            Self::Mild
        } else {
            Self::Normal
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Severe => "Severe",
            Self::Moderate => "Moderate",
            Self::Mild => "Mild",
            Self::Normal => "Normal",
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
