//! Append-only log of paid boosts.
//!
//! Each entry records the payment authorizer's transaction id exactly as
//! the caller supplied it. The id is not checked against any external
//! ledger: that trust boundary sits outside this crate.

use canvas_types::{BoostRecord, ParticipantId};

/// Append-only boost audit log. Entries are never modified or removed.
#[derive(Debug, Clone, Default)]
pub struct BoostAudit {
    /// All records, in commit order.
    records: Vec<BoostRecord>,
}

impl BoostAudit {
    /// Create an empty log.
    pub const fn new() -> Self {
        Self {
            records: Vec::new(),
        }
    }

    /// Append a record.
    pub fn append(&mut self, record: BoostRecord) {
        self.records.push(record);
    }

    /// Number of recorded boosts.
    pub const fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no boost has been recorded.
    pub const fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[BoostRecord] {
        &self.records
    }

    /// Records paid for by one participant, oldest first.
    pub fn boosts_by<'a>(
        &'a self,
        participant: &'a ParticipantId,
    ) -> impl Iterator<Item = &'a BoostRecord> + 'a {
        self.records
            .iter()
            .filter(move |r| &r.participant_id == participant)
    }

    /// Total tokens spent across all recorded boosts.
    pub fn total_spent(&self) -> u64 {
        self.records
            .iter()
            .fold(0_u64, |acc, r| acc.saturating_add(u64::from(r.cost)))
    }
}

#[cfg(test)]
mod tests {
    use canvas_types::{Coord, TransactionId};
    use chrono::Utc;

    use super::*;

    fn record(who: &str, level: u8) -> BoostRecord {
        BoostRecord {
            participant_id: ParticipantId::new(who),
            coord: Coord::new(1, 1),
            level,
            cost: u32::from(level),
            transaction_id: TransactionId::new(format!("tx_{who}_{level}")),
            round: 1,
            at: Utc::now(),
        }
    }

    #[test]
    fn append_preserves_order() {
        let mut audit = BoostAudit::new();
        audit.append(record("a", 1));
        audit.append(record("b", 2));
        assert_eq!(audit.len(), 2);
        let levels: Vec<u8> = audit.records().iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![1, 2]);
    }

    #[test]
    fn boosts_by_filters_on_participant() {
        let mut audit = BoostAudit::new();
        audit.append(record("a", 1));
        audit.append(record("b", 2));
        audit.append(record("a", 3));
        let who = ParticipantId::new("a");
        assert_eq!(audit.boosts_by(&who).count(), 2);
        assert_eq!(audit.total_spent(), 6);
    }
}
