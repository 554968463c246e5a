//! Caller-facing errors for canvas operations.
//!
//! Every variant is an expected, recoverable condition. None of them
//! leaves partial state behind: an operation that returns an error has
//! changed nothing except, possibly, advancing the round clock.

use canvas_types::{Coord, ParticipantId};

/// Why a canvas operation was refused.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CanvasError {
    /// The participant has never registered.
    #[error("participant {participant_id} is not registered")]
    NotRegistered {
        /// The unknown id.
        participant_id: ParticipantId,
    },

    /// The coordinate lies outside the grid.
    #[error("({x},{y}) is outside the {grid_size}x{grid_size} grid")]
    OutOfBounds {
        /// Requested column.
        x: i64,
        /// Requested row.
        y: i64,
        /// Grid dimension.
        grid_size: u32,
    },

    /// The participant already placed a cell this round.
    #[error("already placed in round {round}; wait for the next round")]
    RoundExhausted {
        /// The current round.
        round: u64,
    },

    /// There is no cell to boost at the coordinate.
    #[error("no cell at ({x},{y})")]
    NoCellAtPosition {
        /// Requested column.
        x: i64,
        /// Requested row.
        y: i64,
    },

    /// The boost level is outside `1..=3`.
    #[error("boost level must be 1-3, got {level}")]
    InvalidLevel {
        /// The rejected level.
        level: i64,
    },

    /// The participant cannot afford the boost.
    #[error("insufficient balance: have {balance}, boost costs {cost}")]
    InsufficientBalance {
        /// Current balance.
        balance: u32,
        /// Cost of the requested boost.
        cost: u32,
    },
}

impl CanvasError {
    /// Stable machine-readable kind, used in API error bodies.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotRegistered { .. } => "not_registered",
            Self::OutOfBounds { .. } => "out_of_bounds",
            Self::RoundExhausted { .. } => "round_exhausted",
            Self::NoCellAtPosition { .. } => "no_cell_at_position",
            Self::InvalidLevel { .. } => "invalid_level",
            Self::InsufficientBalance { .. } => "insufficient_balance",
        }
    }

    pub(crate) fn no_cell(coord: Coord) -> Self {
        Self::NoCellAtPosition {
            x: i64::from(coord.x),
            y: i64::from(coord.y),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_are_snake_case() {
        let err = CanvasError::RoundExhausted { round: 3 };
        assert_eq!(err.kind(), "round_exhausted");
        assert_eq!(err.to_string(), "already placed in round 3; wait for the next round");
    }

    #[test]
    fn no_cell_widens_coordinates() {
        let err = CanvasError::no_cell(Coord::new(4, 9));
        assert_eq!(err, CanvasError::NoCellAtPosition { x: 4, y: 9 });
    }
}
