//! Type-safe identifier wrappers.
//!
//! Participant and transaction identifiers are opaque strings minted by
//! external collaborators (the identity verifier and the payment
//! authorizer). Wrapping them prevents a transaction id from ever being
//! passed where a participant id is expected. Suggestion ids are minted
//! locally and use UUID v7 (time-ordered).

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Generates a newtype wrapper around an opaque external [`String`] id.
macro_rules! define_external_id {
    (
        $(#[$meta:meta])*
        $name:ident
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
        #[serde(transparent)]
        #[ts(export, export_to = "bindings/")]
        pub struct $name(pub String);

        impl $name {
            /// Wrap an externally issued identifier.
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Whether the identifier is empty or whitespace only.
            pub fn is_blank(&self) -> bool {
                self.0.trim().is_empty()
            }

            /// Return the inner [`String`].
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl core::fmt::Display for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }
    };
}

define_external_id! {
    /// Verified participant identifier returned by the identity verifier.
    ParticipantId
}

define_external_id! {
    /// Transaction identifier returned by the payment authorizer.
    ///
    /// Recorded against each boost for audit. Never verified locally.
    TransactionId
}

/// Unique identifier for a curator suggestion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct SuggestionId(pub Uuid);

impl SuggestionId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for SuggestionId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for SuggestionId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn participant_id_serializes_as_plain_string() {
        let id = ParticipantId::new("alien_u1");
        let json = serde_json::to_string(&id).ok();
        assert_eq!(json.as_deref(), Some("\"alien_u1\""));
    }

    #[test]
    fn blank_ids_are_detected() {
        assert!(ParticipantId::new("   ").is_blank());
        assert!(TransactionId::new("").is_blank());
        assert!(!TransactionId::new("tx_1").is_blank());
    }

    #[test]
    fn id_display_matches_inner() {
        let id = TransactionId::from("tx_abc");
        assert_eq!(id.to_string(), "tx_abc");
        assert_eq!(id.as_str(), "tx_abc");
    }

    #[test]
    fn suggestion_ids_are_unique() {
        assert_ne!(SuggestionId::new(), SuggestionId::new());
    }
}
