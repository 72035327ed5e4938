//! Weighted random selection.

use rand::Rng;

/// Outcome of a weighted draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WeightedPick {
    /// The draw landed inside an item's cumulative range.
    Weighted(usize),
    /// No range matched (non-positive total or a boundary draw); picked uniformly.
    Fallback(usize),
}

impl WeightedPick {
    pub fn index(&self) -> usize {
        match *self {
            WeightedPick::Weighted(i) | WeightedPick::Fallback(i) => i,
        }
    }
}

/// Draw an index with probability proportional to its weight.
///
/// Returns `None` only for an empty slice. Cumulative ranges follow slice order.
pub fn pick_weighted<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Option<WeightedPick> {
    if weights.is_empty() {
        return None;
    }

    let total: f64 = weights.iter().copied().filter(|w| usable(*w)).sum();
    if total > 0.0 {
        let draw = rng.gen_range(0.0..total);
        if let Some(index) = locate(weights, draw) {
            return Some(WeightedPick::Weighted(index));
        }
    }

    Some(WeightedPick::Fallback(rng.gen_range(0..weights.len())))
}

/// Index whose cumulative range `[prev, prev + w)` contains `draw`.
pub(crate) fn locate(weights: &[f64], draw: f64) -> Option<usize> {
    let mut cumulative = 0.0;
    for (index, weight) in weights.iter().copied().enumerate() {
        if !usable(weight) {
            continue;
        }
        cumulative += weight;
        if draw < cumulative {
            return Some(index);
        }
    }
    None
}

fn usable(weight: f64) -> bool {
    weight.is_finite() && weight > 0.0
}
