//! The participant registry and balance book.

use std::collections::BTreeMap;

use canvas_types::{Participant, ParticipantId};
use chrono::{DateTime, Utc};
use tracing::debug;

use crate::LedgerError;

/// Outcome of a registration call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Registration {
    /// The participant record (new or existing).
    pub participant: Participant,
    /// `true` when this call created the record.
    pub created: bool,
}

/// Registry of known participants and their token balances.
///
/// Participants are never removed. Registration is idempotent: the first
/// call for an id fixes the display name and grants the initial balance;
/// later calls return the stored record untouched.
#[derive(Debug, Clone)]
pub struct ParticipantLedger {
    /// Tokens granted at first registration.
    initial_balance: u32,
    /// All participants keyed by id.
    participants: BTreeMap<ParticipantId, Participant>,
}

impl ParticipantLedger {
    /// Create an empty ledger granting `initial_balance` to each newcomer.
    pub const fn new(initial_balance: u32) -> Self {
        Self {
            initial_balance,
            participants: BTreeMap::new(),
        }
    }

    /// Tokens granted at first registration.
    pub const fn initial_balance(&self) -> u32 {
        self.initial_balance
    }

    /// Register a participant, or return the existing record.
    ///
    /// `display_name` is ignored when `id` is already known. Never fails.
    pub fn register(
        &mut self,
        id: &ParticipantId,
        display_name: &str,
        now: DateTime<Utc>,
    ) -> Registration {
        if let Some(existing) = self.participants.get(id) {
            return Registration {
                participant: existing.clone(),
                created: false,
            };
        }

        let participant = Participant {
            id: id.clone(),
            display_name: display_name.to_owned(),
            balance: self.initial_balance,
            created_at: now,
        };
        self.participants.insert(id.clone(), participant.clone());
        debug!(participant_id = %id, balance = self.initial_balance, "participant recorded");

        Registration {
            participant,
            created: true,
        }
    }

    /// Look up a participant.
    pub fn get(&self, id: &ParticipantId) -> Option<&Participant> {
        self.participants.get(id)
    }

    /// Whether `id` has registered.
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.participants.contains_key(id)
    }

    /// Current balance, if registered.
    pub fn balance(&self, id: &ParticipantId) -> Option<u32> {
        self.participants.get(id).map(|p| p.balance)
    }

    /// Number of registered participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Whether nobody has registered yet.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    /// Subtract `amount` from a participant's balance.
    ///
    /// Returns the remaining balance. On error the balance is unchanged.
    ///
    /// # Errors
    ///
    /// [`LedgerError::UnknownParticipant`] if `id` is not registered,
    /// [`LedgerError::InsufficientBalance`] if `amount` exceeds the balance.
    pub fn debit(&mut self, id: &ParticipantId, amount: u32) -> Result<u32, LedgerError> {
        let participant = self
            .participants
            .get_mut(id)
            .ok_or_else(|| LedgerError::UnknownParticipant(id.clone()))?;

        let remaining = participant.balance.checked_sub(amount).ok_or(
            LedgerError::InsufficientBalance {
                balance: participant.balance,
                amount,
            },
        )?;
        participant.balance = remaining;
        Ok(remaining)
    }

    /// Iterate over all participants in id order.
    pub fn iter(&self) -> impl Iterator<Item = &Participant> {
        self.participants.values()
    }
}
