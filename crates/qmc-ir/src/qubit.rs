//! Qubit and classical bit types.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Dense identifier of a qubit within a circuit (`0..width`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct QubitId(pub u32);

impl QubitId {
    /// Bit position of this qubit in a basis-state index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for QubitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "q{}", self.0)
    }
}

impl From<u32> for QubitId {
    fn from(id: u32) -> Self {
        QubitId(id)
    }
}

/// Identifier of a classical bit receiving a measurement outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ClbitId(pub u32);

impl fmt::Display for ClbitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "c{}", self.0)
    }
}

impl From<u32> for ClbitId {
    fn from(id: u32) -> Self {
        ClbitId(id)
    }
}

/// Classification of a qubit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QubitKind {
    /// A logical qubit of the algorithm.
    #[default]
    Logical,
    /// A physical device qubit.
    Physical,
    /// Scratch qubit, expected to be returned to |0⟩.
    Ancilla,
}

/// Memory-tier hint used by placement heuristics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub enum MemoryTier {
    /// Hot storage.
    #[default]
    L1,
    /// Warm storage.
    L2,
    /// Cold storage.
    L3,
}

/// A qubit owned by a circuit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Qubit {
    id: QubitId,
    kind: QubitKind,
    tier: MemoryTier,
    last_used: f64,
}

impl Qubit {
    /// Create a logical qubit in the L1 tier.
    pub fn new(id: QubitId) -> Self {
        Self::with_kind(id, QubitKind::Logical, MemoryTier::L1)
    }

    /// Create a qubit with an explicit classification and memory tier.
    pub fn with_kind(id: QubitId, kind: QubitKind, tier: MemoryTier) -> Self {
        Self {
            id,
            kind,
            tier,
            last_used: 0.0,
        }
    }

    /// The qubit's identifier.
    pub fn id(&self) -> QubitId {
        self.id
    }

    /// The qubit's classification.
    pub fn kind(&self) -> QubitKind {
        self.kind
    }

    /// The qubit's memory-tier hint.
    pub fn tier(&self) -> MemoryTier {
        self.tier
    }

    /// End time of the latest gate that touched this qubit.
    pub fn last_used(&self) -> f64 {
        self.last_used
    }

    pub(crate) fn touch(&mut self, end_time: f64) {
        if end_time > self.last_used {
            self.last_used = end_time;
        }
    }
}
