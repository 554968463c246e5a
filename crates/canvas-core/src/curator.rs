//! The curator: placement hints and a short story about the canvas.
//!
//! Purely advisory. The curator reads a cell list and never touches engine
//! state. Randomness comes from the caller so tests can seed it.

use std::collections::{BTreeMap, BTreeSet};

use canvas_types::{CanvasNarrative, Cell, Color, Coord, PALETTE, Suggestion, SuggestionId};
use chrono::{DateTime, Utc};
use rand::Rng;
use rand::seq::{IndexedRandom, SliceRandom};

/// Most suggestions returned by one analysis.
pub const MAX_SUGGESTIONS: usize = 3;

/// Chebyshev radius inspected when picking a contrasting colour.
const NEIGHBOURHOOD: u32 = 2;

const STORIES: [&str; 5] = [
    "The canvas is coming alive. People are working together on {pattern}",
    "{pattern} is emerging from shared creativity",
    "Every cell tells a story, and right now the story is {pattern}",
    "Art in progress: {pattern} is taking shape one cell at a time",
    "The canvas speaks of {pattern}. Each new cell adds to it",
];

const PATTERNS: [&str; 8] = [
    "a colorful mosaic",
    "an abstract landscape",
    "a pixel art masterpiece",
    "a community mural",
    "a digital tapestry",
    "something uniquely human",
    "a collaborative vision",
    "a joyful kind of chaos",
];

const REASONS: [&str; 6] = [
    "This spot would complement the nearby colors",
    "A cell here could join two emerging patterns",
    "This area has been empty for a while",
    "Color here would balance the composition",
    "This cell could complete an emerging shape",
    "The region around here is missing contrast",
];

/// Empty in-bounds 4-neighbours of every placed cell.
///
/// A spot bordering several placed cells appears once per neighbour, which
/// weights busy areas higher after shuffling.
pub fn candidate_spots(cells: &[Cell], grid_size: u32) -> Vec<Coord> {
    let occupied: BTreeSet<Coord> = cells.iter().map(Cell::coord).collect();
    let mut spots = Vec::new();
    for cell in cells {
        let neighbours = [
            cell.x.checked_sub(1).map(|x| Coord::new(x, cell.y)),
            cell.x.checked_add(1).map(|x| Coord::new(x, cell.y)),
            cell.y.checked_sub(1).map(|y| Coord::new(cell.x, y)),
            cell.y.checked_add(1).map(|y| Coord::new(cell.x, y)),
        ];
        spots.extend(
            neighbours
                .into_iter()
                .flatten()
                .filter(|c| c.x < grid_size && c.y < grid_size && !occupied.contains(c)),
        );
    }
    spots
}

/// A palette colour not already used near `at`, or any colour if the
/// neighbourhood uses them all.
pub fn suggest_color<R: Rng + ?Sized>(cells: &[Cell], at: Coord, rng: &mut R) -> Color {
    let nearby: BTreeSet<Color> = cells
        .iter()
        .filter(|c| c.x.abs_diff(at.x) <= NEIGHBOURHOOD && c.y.abs_diff(at.y) <= NEIGHBOURHOOD)
        .map(|c| c.color)
        .collect();
    let unused: Vec<Color> = PALETTE
        .iter()
        .copied()
        .filter(|c| !nearby.contains(c))
        .collect();
    unused
        .choose(rng)
        .or_else(|| PALETTE.choose(rng))
        .copied()
        .unwrap_or(Color::White)
}

/// Up to [`MAX_SUGGESTIONS`] placement hints next to existing cells.
///
/// An empty canvas gets no suggestions.
pub fn suggest<R: Rng + ?Sized>(
    cells: &[Cell],
    grid_size: u32,
    rng: &mut R,
    now: DateTime<Utc>,
) -> Vec<Suggestion> {
    let mut spots = candidate_spots(cells, grid_size);
    spots.shuffle(rng);
    spots
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|spot| Suggestion {
            id: SuggestionId::new(),
            x: spot.x,
            y: spot.y,
            color: suggest_color(cells, spot, rng),
            reason: pick(&REASONS, rng).to_owned(),
            confidence: rng.random_range(0.6..0.9),
            created_at: now,
        })
        .collect()
}

/// Suggestions plus a story and a summary of the dominant colours.
pub fn analyze<R: Rng + ?Sized>(
    cells: &[Cell],
    grid_size: u32,
    rng: &mut R,
    now: DateTime<Utc>,
) -> CanvasNarrative {
    let suggestions = suggest(cells, grid_size, rng, now);
    let pattern = pick(&PATTERNS, rng);
    let story = pick(&STORIES, rng).replace("{pattern}", pattern);

    CanvasNarrative {
        story,
        suggestions,
        pattern_detected: Some(pattern.to_owned()),
        community_style: community_style(cells),
        last_analysis: now,
    }
}

/// The three most used colours, ties broken by palette order.
pub fn top_colors(cells: &[Cell]) -> Vec<Color> {
    let mut counts: BTreeMap<Color, usize> = BTreeMap::new();
    for cell in cells {
        let n = counts.entry(cell.color).or_default();
        *n = n.saturating_add(1);
    }
    let mut ranked: Vec<(Color, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    ranked
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(color, _)| color)
        .collect()
}

fn community_style(cells: &[Cell]) -> String {
    let top = top_colors(cells);
    if top.is_empty() {
        return "The canvas awaits its first human touch".to_owned();
    }
    let names: Vec<&str> = top.iter().map(|c| c.hex()).collect();
    format!(
        "Favoring {} across {} cells placed by real humans",
        names.join(", "),
        cells.len()
    )
}

fn pick<'a, R: Rng + ?Sized>(options: &[&'a str], rng: &mut R) -> &'a str {
    options.choose(rng).copied().unwrap_or_default()
}
