//! Demo artwork for an otherwise empty canvas.
//!
//! Six founding participants share a small heart drawn near the centre of
//! the grid. Loading it publishes no events and uses no placement slots.

use canvas_types::{Cell, Color, ParticipantId};
use chrono::{DateTime, TimeDelta, Utc};

/// Founding participants as `(id, display name)`.
pub const FOUNDERS: [(&str, &str); 6] = [
    ("alien_c01", "Pixel"),
    ("alien_c02", "Voxel"),
    ("alien_c03", "Raster"),
    ("alien_c04", "Vector"),
    ("alien_c05", "Hue"),
    ("alien_c06", "Chroma"),
];

/// Heart offsets as `(dx, dy)` from the top-left anchor.
const HEART: [(u32, u32); 15] = [
    (1, 0),
    (2, 0),
    (0, 1),
    (1, 1),
    (2, 1),
    (3, 1),
    (0, 2),
    (1, 2),
    (2, 2),
    (3, 2),
    (4, 2),
    (1, 3),
    (2, 3),
    (3, 3),
    (2, 4),
];

const HEART_COLORS: [Color; 4] = [Color::DeepPink, Color::HotPink, Color::Red, Color::OrangeRed];

/// Minutes before "now" that the demo cells claim to have been placed.
const SEED_AGE_MINUTES: i64 = 5;

/// Participants and cells to load into a fresh engine.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeedPlan {
    /// Participants as `(id, display name)`.
    pub participants: Vec<(ParticipantId, String)>,
    /// Cells, all in round 0.
    pub cells: Vec<Cell>,
}

/// The demo heart for a `grid_size` canvas.
///
/// The anchor sits at `grid_size / 2 - 2` on both axes. Owners and colours
/// cycle through [`FOUNDERS`] and the heart colours in order.
pub fn demo_art(grid_size: u32, now: DateTime<Utc>) -> SeedPlan {
    let anchor = (grid_size / 2).saturating_sub(2);
    let placed_at = now.checked_sub_signed(TimeDelta::minutes(SEED_AGE_MINUTES)).unwrap_or(now);

    let participants = FOUNDERS
        .iter()
        .map(|(id, name)| (ParticipantId::new(*id), (*name).to_owned()))
        .collect();

    let cells = HEART
        .iter()
        .zip(FOUNDERS.iter().cycle())
        .zip(HEART_COLORS.iter().cycle())
        .filter_map(|((&(dx, dy), &(id, name)), &color)| {
            Some(Cell {
                x: anchor.checked_add(dx)?,
                y: anchor.checked_add(dy)?,
                color,
                owner_id: ParticipantId::new(id),
                owner_name: name.to_owned(),
                intensity: 0,
                placed_at,
                round: 0,
            })
        })
        .collect();

    SeedPlan {
        participants,
        cells,
    }
}
