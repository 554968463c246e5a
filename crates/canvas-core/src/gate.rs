//! Per-participant placement gate.
//!
//! Records the last round each participant placed in. A participant may
//! place iff that round is strictly less than the current round; never
//! having placed counts as round 0.

use std::collections::BTreeMap;

use canvas_types::ParticipantId;

/// Last placement round per participant.
#[derive(Debug, Clone, Default)]
pub struct PlacementGate {
    last_round: BTreeMap<ParticipantId, u64>,
}

impl PlacementGate {
    /// An empty gate: everybody may place.
    pub const fn new() -> Self {
        Self {
            last_round: BTreeMap::new(),
        }
    }

    /// Last round `participant` placed in, or 0.
    pub fn last_placed_round(&self, participant: &ParticipantId) -> u64 {
        self.last_round.get(participant).copied().unwrap_or(0)
    }

    /// Whether `participant` may place during `current_round`.
    pub fn may_place(&self, participant: &ParticipantId, current_round: u64) -> bool {
        self.last_placed_round(participant) < current_round
    }

    /// Record that `participant` placed during `round`.
    pub fn record(&mut self, participant: &ParticipantId, round: u64) {
        self.last_round.insert(participant.clone(), round);
    }
}
