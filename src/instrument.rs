//! Treasury instrument universe and per-instrument array indexing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The number of instruments the core tracks. Every per-instrument array in this
/// crate is sized to this constant rather than growing at runtime.
pub const NUM_INSTRUMENTS: usize = 6;

/// A closed enum of the six Treasury instrument families the core quotes.
///
/// `Instrument as usize` is the canonical array index used throughout the
/// crate (order book manager, risk state, quote manager, DV01 table).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Instrument {
    /// 3-month Treasury bill
    Bill3M = 0,
    /// 6-month Treasury bill
    Bill6M = 1,
    /// 2-year Treasury note
    Note2Y = 2,
    /// 5-year Treasury note
    Note5Y = 3,
    /// 10-year Treasury note
    Note10Y = 4,
    /// 30-year Treasury bond
    Bond30Y = 5,
}

impl Instrument {
    /// All instruments in index order, for iteration over per-instrument state.
    pub const ALL: [Instrument; NUM_INSTRUMENTS] = [
        Instrument::Bill3M,
        Instrument::Bill6M,
        Instrument::Note2Y,
        Instrument::Note5Y,
        Instrument::Note10Y,
        Instrument::Bond30Y,
    ];

    /// Returns the instrument's canonical array index.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Builds an `Instrument` from a validated array index.
    ///
    /// Returns `None` for `idx >= NUM_INSTRUMENTS` rather than panicking, since
    /// instrument indices can arrive from external callers (market updates).
    #[inline]
    pub const fn from_index(idx: usize) -> Option<Instrument> {
        match idx {
            0 => Some(Instrument::Bill3M),
            1 => Some(Instrument::Bill6M),
            2 => Some(Instrument::Note2Y),
            3 => Some(Instrument::Note5Y),
            4 => Some(Instrument::Note10Y),
            5 => Some(Instrument::Bond30Y),
            _ => None,
        }
    }

    /// Approximate years to maturity, used for fair-price-from-yield conversion
    /// in the fair-curve collaborator and for DV01 sanity checks.
    pub const fn years_to_maturity(self) -> f64 {
        match self {
            Instrument::Bill3M => 0.25,
            Instrument::Bill6M => 0.5,
            Instrument::Note2Y => 2.0,
            Instrument::Note5Y => 5.0,
            Instrument::Note10Y => 10.0,
            Instrument::Bond30Y => 30.0,
        }
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Instrument::Bill3M => "3M_BILL",
            Instrument::Bill6M => "6M_BILL",
            Instrument::Note2Y => "2Y_NOTE",
            Instrument::Note5Y => "5Y_NOTE",
            Instrument::Note10Y => "10Y_NOTE",
            Instrument::Bond30Y => "30Y_BOND",
        };
        f.write_str(s)
    }
}

/// A fixed-size array indexed by [`Instrument`], avoiding hash-map lookups on
/// the hot path for per-instrument tables (DV01 table, fair-curve snapshot).
pub type PerInstrument<T> = [T; NUM_INSTRUMENTS];
