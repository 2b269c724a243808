//! Point-in-time, checksummed engine snapshots for operator tooling.
//!
//! Grounded on the reference desk's checksum-wrapped snapshot package: a
//! versioned envelope around a JSON-serializable payload, with a SHA-256
//! checksum over the serialized bytes so a consumer can detect a truncated
//! or hand-edited dump before trusting it. Nothing here runs on the hot
//! path; a snapshot is assembled on demand by a monitoring or reconciliation
//! collaborator, not by the decision engine itself.

use crate::instrument::Instrument;
use crate::orderbook::{BookStats, OrderBookManager};
use crate::price::Price32nd;
use crate::risk::{PortfolioRisk, RiskState};
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use uuid::Uuid;

bitflags! {
    /// Selects which derived fields a snapshot populates, so a caller that
    /// only wants top-of-book doesn't pay for market-depth walks.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
    pub struct SnapshotFields: u32 {
        /// Best bid/ask per instrument.
        const TOP_OF_BOOK = 1 << 0;
        /// Ladder depth per instrument (see `EngineSnapshotPackage::capture`'s `depth` argument).
        const DEPTH = 1 << 1;
        /// Position, DV01 and daily P&L per instrument.
        const RISK = 1 << 2;
        /// Order book operation counters per instrument.
        const STATS = 1 << 3;
        /// Every field above.
        const ALL = Self::TOP_OF_BOOK.bits() | Self::DEPTH.bits()
                  | Self::RISK.bits() | Self::STATS.bits();
    }
}

/// One instrument's contribution to an [`EngineSnapshot`]; fields outside
/// the captured [`SnapshotFields`] are left at their default (`None`/empty).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InstrumentSnapshot {
    /// Which instrument this entry describes.
    pub instrument: Option<Instrument>,
    /// Best resting bid price, if [`SnapshotFields::TOP_OF_BOOK`] was requested.
    pub best_bid: Option<Price32nd>,
    /// Best resting ask price, if [`SnapshotFields::TOP_OF_BOOK`] was requested.
    pub best_ask: Option<Price32nd>,
    /// Bid-side ladder depth, best-first, if [`SnapshotFields::DEPTH`] was requested.
    pub bid_depth: Vec<(Price32nd, u64)>,
    /// Ask-side ladder depth, best-first, if [`SnapshotFields::DEPTH`] was requested.
    pub ask_depth: Vec<(Price32nd, u64)>,
    /// Order book counters, if [`SnapshotFields::STATS`] was requested.
    pub stats: Option<BookStats>,
    /// Signed position, if [`SnapshotFields::RISK`] was requested.
    pub position: Option<i64>,
    /// DV01 exposure, if [`SnapshotFields::RISK`] was requested.
    pub dv01: Option<f64>,
    /// Today's running P&L, if [`SnapshotFields::RISK`] was requested.
    pub daily_pnl: Option<f64>,
}

/// A full engine snapshot: one entry per instrument plus the last-computed
/// portfolio aggregate, tagged with a unique id and the caller's clock
/// reading.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Unique identifier for this snapshot, for cross-referencing in logs.
    pub snapshot_id: Uuid,
    /// Caller-supplied clock reading at capture time.
    pub taken_at_ns: u64,
    /// Per-instrument entries, in [`Instrument::ALL`] order.
    pub instruments: Vec<InstrumentSnapshot>,
    /// The most recently computed portfolio risk aggregate, if any (does
    /// not force a fresh [`RiskState::refresh_portfolio_risk`] call).
    pub portfolio: Option<PortfolioRisk>,
}

/// Format version of [`EngineSnapshotPackage`]'s envelope.
pub const ENGINE_SNAPSHOT_FORMAT_VERSION: u32 = 1;

/// Checksum-validated envelope around an [`EngineSnapshot`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSnapshotPackage {
    /// Envelope schema version.
    pub version: u32,
    /// The snapshot payload.
    pub snapshot: EngineSnapshot,
    /// Hex-encoded SHA-256 checksum of the serialized payload.
    pub checksum: String,
}

/// Failure modes for building, serializing, or validating a snapshot.
#[derive(Debug)]
pub enum SnapshotError {
    /// `serde_json` failed to encode or decode the payload.
    Serialization(String),
    /// [`EngineSnapshotPackage::validate`] found a checksum mismatch.
    ChecksumMismatch {
        /// Checksum recorded in the package.
        expected: String,
        /// Checksum recomputed from the payload.
        actual: String,
    },
    /// The envelope's `version` is not one this build understands.
    UnsupportedVersion(u32),
}

impl fmt::Display for SnapshotError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SnapshotError::Serialization(msg) => write!(f, "snapshot serialization failed: {msg}"),
            SnapshotError::ChecksumMismatch { expected, actual } => {
                write!(f, "snapshot checksum mismatch: expected {expected}, got {actual}")
            }
            SnapshotError::UnsupportedVersion(v) => write!(f, "unsupported snapshot format version {v}"),
        }
    }
}

impl std::error::Error for SnapshotError {}

impl EngineSnapshotPackage {
    /// Walks every instrument's book (and, if requested, its risk state)
    /// and assembles a checksummed snapshot package. `depth` bounds the
    /// ladder walk when [`SnapshotFields::DEPTH`] is set.
    pub fn capture(
        books: &OrderBookManager,
        risk: &RiskState,
        portfolio: Option<PortfolioRisk>,
        fields: SnapshotFields,
        depth: usize,
        taken_at_ns: u64,
    ) -> Result<EngineSnapshotPackage, SnapshotError> {
        let mut instruments = Vec::with_capacity(Instrument::ALL.len());
        for instrument in Instrument::ALL {
            let book = books.book(instrument);
            let mut entry = InstrumentSnapshot {
                instrument: Some(instrument),
                ..InstrumentSnapshot::default()
            };
            if fields.contains(SnapshotFields::TOP_OF_BOOK) {
                entry.best_bid = book.get_best_bid();
                entry.best_ask = book.get_best_ask();
            }
            if fields.contains(SnapshotFields::DEPTH) {
                entry.bid_depth = book.get_market_depth(crate::order::Side::Bid, depth);
                entry.ask_depth = book.get_market_depth(crate::order::Side::Ask, depth);
            }
            if fields.contains(SnapshotFields::STATS) {
                entry.stats = Some(book.stats());
            }
            if fields.contains(SnapshotFields::RISK) {
                let instrument_risk = risk.instrument(instrument);
                entry.position = Some(instrument_risk.position());
                entry.dv01 = Some(instrument_risk.dv01());
                entry.daily_pnl = Some(instrument_risk.daily_pnl());
            }
            instruments.push(entry);
        }

        let snapshot = EngineSnapshot {
            snapshot_id: Uuid::new_v4(),
            taken_at_ns,
            instruments,
            portfolio,
        };
        let checksum = Self::compute_checksum(&snapshot)?;
        Ok(EngineSnapshotPackage {
            version: ENGINE_SNAPSHOT_FORMAT_VERSION,
            snapshot,
            checksum,
        })
    }

    /// Serializes the package as JSON.
    pub fn to_json(&self) -> Result<String, SnapshotError> {
        serde_json::to_string(self).map_err(|e| SnapshotError::Serialization(e.to_string()))
    }

    /// Deserializes a package from JSON. Does not itself validate the
    /// checksum; call [`EngineSnapshotPackage::validate`] before trusting it.
    pub fn from_json(data: &str) -> Result<EngineSnapshotPackage, SnapshotError> {
        serde_json::from_str(data).map_err(|e| SnapshotError::Serialization(e.to_string()))
    }

    /// Confirms the envelope version is understood and the checksum matches
    /// the payload.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        if self.version != ENGINE_SNAPSHOT_FORMAT_VERSION {
            return Err(SnapshotError::UnsupportedVersion(self.version));
        }
        let computed = Self::compute_checksum(&self.snapshot)?;
        if computed != self.checksum {
            return Err(SnapshotError::ChecksumMismatch {
                expected: self.checksum.clone(),
                actual: computed,
            });
        }
        Ok(())
    }

    fn compute_checksum(snapshot: &EngineSnapshot) -> Result<String, SnapshotError> {
        let payload = serde_json::to_vec(snapshot).map_err(|e| SnapshotError::Serialization(e.to_string()))?;
        let mut hasher = Sha256::new();
        hasher.update(&payload);
        Ok(format!("{:x}", hasher.finalize()))
    }
}
