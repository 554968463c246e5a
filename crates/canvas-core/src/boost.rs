//! Boost pricing and intensity rules.
//!
//! A boost of level `L` costs `L` tokens, flat, regardless of the cell's
//! current intensity. Intensity rises by `L` and saturates at
//! [`MAX_INTENSITY`]; any excess is absorbed without refund.

use crate::error::CanvasError;

/// Lowest accepted boost level.
pub const MIN_LEVEL: u8 = 1;

/// Highest accepted boost level.
pub const MAX_LEVEL: u8 = 3;

/// Intensity cap for any cell.
pub const MAX_INTENSITY: u8 = 3;

/// A validated boost level in `MIN_LEVEL..=MAX_LEVEL`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct BoostLevel(u8);

impl BoostLevel {
    /// The level as a plain number.
    pub const fn get(self) -> u8 {
        self.0
    }

    /// Tokens charged for this level.
    pub fn cost(self) -> u32 {
        u32::from(self.0)
    }

    /// Intensity after applying this boost to a cell at `current`.
    pub const fn apply(self, current: u8) -> u8 {
        let raised = current.saturating_add(self.0);
        if raised > MAX_INTENSITY {
            MAX_INTENSITY
        } else {
            raised
        }
    }
}

impl TryFrom<i64> for BoostLevel {
    type Error = CanvasError;

    fn try_from(level: i64) -> Result<Self, Self::Error> {
        u8::try_from(level)
            .ok()
            .filter(|l| (MIN_LEVEL..=MAX_LEVEL).contains(l))
            .map(Self)
            .ok_or(CanvasError::InvalidLevel { level })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn accepts_one_through_three() {
        for level in 1..=3 {
            let parsed = BoostLevel::try_from(level).unwrap();
            assert_eq!(i64::from(parsed.get()), level);
            assert_eq!(i64::from(parsed.cost()), level);
        }
    }

    #[test]
    fn rejects_out_of_range_levels() {
        for level in [0, 4, -1, 256, i64::MAX, i64::MIN] {
            assert_eq!(
                BoostLevel::try_from(level),
                Err(CanvasError::InvalidLevel { level })
            );
        }
    }

    #[test]
    fn apply_saturates_at_cap() {
        let two = BoostLevel::try_from(2).unwrap();
        assert_eq!(two.apply(0), 2);
        assert_eq!(two.apply(2), 3);
        assert_eq!(two.apply(3), 3);
    }
}
