use std::sync::Arc;

use rand::rngs::SmallRng;
use rand::Rng;

use crate::game::Position;
use crate::mcts::config::SearchConfig;
use crate::mcts::node::Node;

/// Progressive-widening cap: a node may hold at most
/// `max(1, floor(k * (visits + 1)^alpha))` children.
#[inline]
pub(crate) fn max_children(visits: u32, config: &SearchConfig) -> usize {
    let cap = (config.pw_k * ((visits as f64) + 1.0).powf(config.pw_alpha)).floor() as usize;
    cap.max(1)
}

/// PUCT-style score. Virtual loss inflates the exploration denominator,
/// steering concurrent workers onto sibling lines.
///
/// The caller holds the parent's mutex; reading the child's value sum
/// takes the child's. Locks nest parent -> child only.
pub(crate) fn puct_score<P: Position>(
    parent_visits: u32,
    child: &Node<P>,
    config: &SearchConfig,
) -> f64 {
    let visits = child.visits();
    let q = child.value_sum() / (visits.max(1) as f64);
    let den = visits as f64 + child.virtual_loss() as f64 + 1.0;
    let u = config.c_explore * (((parent_visits as f64) + 1.0).ln() / den).sqrt();
    let p = config.c_prior * child.prior / (1.0 + visits as f64);
    q + u + p
}

/// Index of the highest-scoring child; ties keep the lowest index.
pub(crate) fn best_child_index<P: Position>(
    children: &[Arc<Node<P>>],
    parent_visits: u32,
    config: &SearchConfig,
) -> usize {
    debug_assert!(!children.is_empty());
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, child) in children.iter().enumerate() {
        let score = puct_score(parent_visits, child, config);
        if score > best_score {
            best_score = score;
            best = i;
        }
    }
    best
}

/// Root-level chooser used by the observability surface. Virtual loss
/// is amplified here (tenfold in the denominator, plus a flat penalty)
/// so a reservation meaningfully repels the choice even against large
/// visit counts.
pub(crate) fn amplified_root_index<P: Position>(
    children: &[Arc<Node<P>>],
    root_visits: u32,
    config: &SearchConfig,
) -> usize {
    debug_assert!(!children.is_empty());
    let mut best = 0;
    let mut best_score = f64::NEG_INFINITY;
    for (i, child) in children.iter().enumerate() {
        let visits = child.visits();
        let vloss = child.virtual_loss();
        let q = if visits == 0 {
            0.0
        } else {
            child.value_sum() / visits as f64
        };
        let den = visits as f64 + 1.0 + vloss as f64 * 10.0;
        let u = config.c_explore * ((1.0 + root_visits as f64).ln() / den).sqrt();
        let score = q + u - vloss as f64;
        if score > best_score {
            best_score = score;
            best = i;
        }
    }
    best
}

/// Cumulative-sum draw over non-negative weights. Falls back to a
/// uniform pick when the weights sum to zero.
pub(crate) fn weighted_index(weights: &[f64], rng: &mut SmallRng) -> usize {
    debug_assert!(!weights.is_empty());
    let total: f64 = weights.iter().sum();
    if total <= 0.0 {
        return rng.gen_range(0..weights.len());
    }
    let mut draw = rng.gen_range(0.0..total);
    for (i, w) in weights.iter().enumerate() {
        draw -= w;
        if draw < 0.0 {
            return i;
        }
    }
    weights.len() - 1
}
