use std::time::Duration;

use crate::game::Ruleset;

/// Knobs for a [`Searcher`](super::Searcher). Built with chained setters:
///
/// ```
/// use tesuji::mcts::SearchConfig;
/// let config = SearchConfig::new().iterations(5_000).thread_count(4);
/// ```
#[derive(Clone, Debug)]
pub struct SearchConfig {
    /// Total iteration budget shared by all workers.
    pub iterations: usize,
    /// Maximum ply per rollout.
    pub playout_depth: usize,
    /// UCT exploration constant.
    pub c_explore: f64,
    /// Prior mixing weight in the selection score.
    pub c_prior: f64,
    /// Progressive widening multiplier.
    pub pw_k: f64,
    /// Progressive widening exponent.
    pub pw_alpha: f64,
    /// Worker threads; 1 runs the iteration body inline on the caller.
    pub thread_count: usize,
    /// Shard count of the transposition table.
    pub tt_shards: usize,
    /// When set, overrides `iterations` as the stopping condition.
    pub deadline: Option<Duration>,
    pub ruleset: Ruleset,
    pub komi: f64,
    /// Master RNG seed; `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            iterations: 1000,
            playout_depth: 200,
            c_explore: 1.4,
            c_prior: 0.5,
            pw_k: 1.0,
            pw_alpha: 0.5,
            thread_count: 1,
            tt_shards: 64,
            deadline: None,
            ruleset: Ruleset::Chinese,
            komi: 6.5,
            seed: None,
        }
    }
}

impl SearchConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn playout_depth(mut self, playout_depth: usize) -> Self {
        self.playout_depth = playout_depth;
        self
    }

    pub fn c_explore(mut self, c_explore: f64) -> Self {
        self.c_explore = c_explore;
        self
    }

    pub fn c_prior(mut self, c_prior: f64) -> Self {
        self.c_prior = c_prior;
        self
    }

    pub fn pw_k(mut self, pw_k: f64) -> Self {
        self.pw_k = pw_k;
        self
    }

    pub fn pw_alpha(mut self, pw_alpha: f64) -> Self {
        self.pw_alpha = pw_alpha;
        self
    }

    pub fn thread_count(mut self, thread_count: usize) -> Self {
        self.thread_count = thread_count.max(1);
        self
    }

    pub fn tt_shards(mut self, tt_shards: usize) -> Self {
        self.tt_shards = tt_shards.max(1);
        self
    }

    pub fn deadline_ms(mut self, millis: u64) -> Self {
        self.deadline = Some(Duration::from_millis(millis));
        self
    }

    pub fn ruleset(mut self, ruleset: Ruleset) -> Self {
        self.ruleset = ruleset;
        self
    }

    pub fn komi(mut self, komi: f64) -> Self {
        self.komi = komi;
        self
    }

    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
