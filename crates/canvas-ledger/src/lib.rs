//! Participant registry, token balances, and boost audit log.
//!
//! Every token a participant holds is tracked here. Tokens are granted
//! once, at first registration, and leave only through boosts. A balance
//! can never go negative: [`ParticipantLedger::debit`] checks and
//! subtracts in one step and refuses rather than overdrawing.
//!
//! # Modules
//!
//! - [`participants`] -- The [`ParticipantLedger`]: idempotent
//!   registration, lookup, and debits.
//! - [`audit`] -- The [`BoostAudit`]: append-only log of paid boosts.
//!
//! # Usage
//!
//! ```
//! use canvas_ledger::ParticipantLedger;
//! use canvas_types::ParticipantId;
//! use chrono::Utc;
//!
//! let mut ledger = ParticipantLedger::new(5);
//! let id = ParticipantId::new("alien_1");
//! ledger.register(&id, "Starlight", Utc::now());
//!
//! assert_eq!(ledger.debit(&id, 2).ok(), Some(3));
//! assert!(ledger.debit(&id, 4).is_err());
//! ```

pub mod audit;
pub mod participants;

// Re-export primary types at crate root.
pub use audit::BoostAudit;
pub use participants::{ParticipantLedger, Registration};

use canvas_types::ParticipantId;

/// Errors that can occur when moving tokens.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LedgerError {
    /// No participant with this id has registered.
    #[error("participant {0} is not registered")]
    UnknownParticipant(ParticipantId),

    /// The debit exceeds the participant's balance.
    #[error("insufficient balance: have {balance}, need {amount}")]
    InsufficientBalance {
        /// Current balance.
        balance: u32,
        /// Requested debit.
        amount: u32,
    },
}
