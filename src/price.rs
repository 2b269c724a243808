//! 32nd fractional Treasury price representation.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Denominator of the Treasury 32nds pricing grid.
pub const THIRTY_SECONDS_DENOMINATOR: u32 = 32;

/// Minimum tick on the grid: one 32nd.
pub const MIN_TICK_32NDS: f64 = 1.0 / THIRTY_SECONDS_DENOMINATOR as f64;

/// Half of a 32nd, the finest increment `Price32nd` can represent.
pub const HALF_32ND_INCREMENT: f64 = 0.5 / THIRTY_SECONDS_DENOMINATOR as f64;

/// An exact Treasury price expressed as `(whole, thirty_seconds, half_32nds)`.
///
/// Decimal value is `whole + thirty_seconds/32 + half_32nds/64`. Ordering is
/// lexicographic on the triple, which is total and consistent with numeric
/// order because `thirty_seconds < 32` and `half_32nds ∈ {0,1}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Price32nd {
    /// Whole-dollar part of the price.
    pub whole: u32,
    /// Number of 32nds above `whole`, in `0..32`.
    pub thirty_seconds: u8,
    /// An extra half-32nd tick, `0` or `1`.
    pub half_32nds: u8,
}

impl Price32nd {
    /// The zero price, used as a sentinel for "no price" in quote state.
    pub const ZERO: Price32nd = Price32nd {
        whole: 0,
        thirty_seconds: 0,
        half_32nds: 0,
    };

    /// Constructs a price directly from its triple, normalising any overflow
    /// in `thirty_seconds`/`half_32nds` into the whole-dollar part.
    pub fn new(whole: u32, thirty_seconds: u8, half_32nds: u8) -> Price32nd {
        let mut total_half_ticks = u64::from(thirty_seconds) * 2 + u64::from(half_32nds);
        let mut whole = u64::from(whole);
        whole += total_half_ticks / 64;
        total_half_ticks %= 64;
        Price32nd {
            whole: whole as u32,
            thirty_seconds: (total_half_ticks / 2) as u8,
            half_32nds: (total_half_ticks % 2) as u8,
        }
    }

    /// Rounds a decimal price to the nearest 1/64th. Pure and deterministic:
    /// identical input always yields identical output.
    pub fn from_decimal(decimal: f64) -> Price32nd {
        let clamped = decimal.max(0.0);
        let half_ticks = (clamped * 64.0).round() as u64;
        let whole = half_ticks / 64;
        let remainder = half_ticks % 64;
        Price32nd {
            whole: whole as u32,
            thirty_seconds: (remainder / 2) as u8,
            half_32nds: (remainder % 2) as u8,
        }
    }

    /// Rounds a decimal price down to the nearest 1/32nd. Used for bid quotes
    ///.
    pub fn from_decimal_round_down(decimal: f64) -> Price32nd {
        let clamped = decimal.max(0.0);
        let thirty_seconds_ticks = (clamped * THIRTY_SECONDS_DENOMINATOR as f64).floor() as u64;
        let whole = thirty_seconds_ticks / THIRTY_SECONDS_DENOMINATOR as u64;
        let remainder = thirty_seconds_ticks % THIRTY_SECONDS_DENOMINATOR as u64;
        Price32nd {
            whole: whole as u32,
            thirty_seconds: remainder as u8,
            half_32nds: 0,
        }
    }

    /// Rounds a decimal price up to the nearest 1/32nd. Used for ask quotes.
    pub fn from_decimal_round_up(decimal: f64) -> Price32nd {
        let clamped = decimal.max(0.0);
        let thirty_seconds_ticks = (clamped * THIRTY_SECONDS_DENOMINATOR as f64).ceil() as u64;
        let whole = thirty_seconds_ticks / THIRTY_SECONDS_DENOMINATOR as u64;
        let remainder = thirty_seconds_ticks % THIRTY_SECONDS_DENOMINATOR as u64;
        Price32nd {
            whole: whole as u32,
            thirty_seconds: remainder as u8,
            half_32nds: 0,
        }
    }

    /// Exact decimal value on the representable lattice.
    pub fn to_decimal(self) -> f64 {
        f64::from(self.whole)
            + f64::from(self.thirty_seconds) / f64::from(THIRTY_SECONDS_DENOMINATOR)
            + f64::from(self.half_32nds) / (2.0 * f64::from(THIRTY_SECONDS_DENOMINATOR))
    }

    /// True iff the price falls exactly on the 32nd grid (no half-tick residual).
    #[inline]
    pub const fn is_32nds_aligned(self) -> bool {
        self.half_32nds == 0
    }

    /// Absolute decimal distance between two prices.
    pub fn abs_diff(self, other: Price32nd) -> f64 {
        (self.to_decimal() - other.to_decimal()).abs()
    }
}

impl PartialOrd for Price32nd {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Price32nd {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.whole, self.thirty_seconds, self.half_32nds).cmp(&(
            other.whole,
            other.thirty_seconds,
            other.half_32nds,
        ))
    }
}

impl fmt::Display for Price32nd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.half_32nds == 0 {
            write!(f, "{}-{:02}", self.whole, self.thirty_seconds)
        } else {
            write!(f, "{}-{:02}+", self.whole, self.thirty_seconds)
        }
    }
}
