//! Loudness tiers.
//!
//! [`classify`] maps a mean level in dBFS onto one of six ordered [`Tier`]
//! values. The scale is tuned for speech and conference recordings: anything
//! below -50 dB is close to inaudible, -36 to -24 dB is a comfortable voice
//! level, and anything from -24 dB upwards is broadcast-loud.
//!
//! Every lower bound is inclusive, so a value sitting exactly on a boundary
//! belongs to the louder tier.
//!
//! # Example
//!
//! ```
//! use audiolevel::{Tier, classify};
//!
//! assert_eq!(classify(-42.0), Tier::MediumMinus);
//! assert_eq!(classify(-42.01), Tier::Low);
//! assert_eq!(classify(-10.0), Tier::High);
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::{Deserialize, Serialize};

/// One of six ordered loudness classifications, quietest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// Below -50 dB. Usually a recording problem.
    VeryLow,
    /// -50 dB up to -42 dB. Weak, should be normalized.
    Low,
    /// -42 dB up to -36 dB. Acceptable but quiet.
    MediumMinus,
    /// -36 dB up to -30 dB. Correct level for speech.
    Medium,
    /// -30 dB up to -24 dB. Good level.
    MediumPlus,
    /// -24 dB and above. Loud, close to broadcast.
    High,
}

impl Tier {
    /// All tiers in ascending loudness order.
    pub const ALL: [Tier; 6] = [
        Tier::VeryLow,
        Tier::Low,
        Tier::MediumMinus,
        Tier::Medium,
        Tier::MediumPlus,
        Tier::High,
    ];

    /// Inclusive lower bound of the tier in dB, `None` for [`Tier::VeryLow`].
    pub fn lower_bound(self) -> Option<f64> {
        match self {
            Tier::VeryLow => None,
            Tier::Low => Some(-50.0),
            Tier::MediumMinus => Some(-42.0),
            Tier::Medium => Some(-36.0),
            Tier::MediumPlus => Some(-30.0),
            Tier::High => Some(-24.0),
        }
    }

    /// Human-readable label used in every export.
    pub fn label(self) -> &'static str {
        match self {
            Tier::VeryLow => "VERY LOW",
            Tier::Low => "LOW",
            Tier::MediumMinus => "MEDIUM-",
            Tier::Medium => "MEDIUM",
            Tier::MediumPlus => "MEDIUM+",
            Tier::High => "HIGH",
        }
    }

    /// Hex colour used by the HTML report.
    pub fn color(self) -> &'static str {
        match self {
            Tier::VeryLow => "#ef4444",
            Tier::Low => "#f97316",
            Tier::MediumMinus => "#eab308",
            Tier::Medium => "#22c55e",
            Tier::MediumPlus => "#10b981",
            Tier::High => "#3b82f6",
        }
    }

    /// Speaker glyph shown next to the label.
    pub fn glyph(self) -> &'static str {
        match self {
            Tier::VeryLow => "🔇",
            Tier::Low => "🔈",
            Tier::MediumMinus => "🔉",
            Tier::Medium | Tier::MediumPlus => "🔊",
            Tier::High => "📢",
        }
    }

    /// Parse a label produced by [`Tier::label`].
    pub fn from_label(label: &str) -> Option<Tier> {
        Tier::ALL.into_iter().find(|tier| tier.label() == label)
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.label())
    }
}

/// Classify a mean level in dBFS.
///
/// Total over every `f64`: NaN compares false against every bound and so
/// lands in [`Tier::VeryLow`], positive infinity in [`Tier::High`].
pub fn classify(mean_db: f64) -> Tier {
    if mean_db >= -24.0 {
        Tier::High
    } else if mean_db >= -30.0 {
        Tier::MediumPlus
    } else if mean_db >= -36.0 {
        Tier::Medium
    } else if mean_db >= -42.0 {
        Tier::MediumMinus
    } else if mean_db >= -50.0 {
        Tier::Low
    } else {
        Tier::VeryLow
    }
}
