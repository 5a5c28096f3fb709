use std::sync::atomic::{AtomicI64, Ordering::Relaxed};
use std::sync::{Arc, Mutex, Weak};

use log::warn;
use rand::rngs::SmallRng;
use rand::Rng;
use rand_core::SeedableRng;
use serde::Serialize;

use crate::game::{Color, Move, Position};
use crate::mcts::config::SearchConfig;
use crate::mcts::node::{Node, UntriedMove};
use crate::mcts::oracle::{sanitize_policy, CenterHeuristic, Oracle};
use crate::mcts::select;
use crate::mcts::simulate;
use crate::mcts::table::ShardedTable;
use crate::mcts::timer::Timer;

/// Per-child snapshot of the root statistics, for logging and the demo.
#[derive(Clone, Debug, Serialize)]
pub struct ChildStats {
    pub mv: Move,
    pub visits: u32,
    pub value_sum: f64,
    pub virtual_loss: i32,
    pub prior: f64,
}

/// The search coordinator. Owns the tree root, the transposition table
/// and the master RNG; workers share the tree for the duration of one
/// `search` call and nothing else mutates it meanwhile.
pub struct Searcher<P: Position> {
    config: SearchConfig,
    oracle: Box<dyn Oracle<P>>,
    root: Option<Arc<Node<P>>>,
    table: ShardedTable<P>,
    master_rng: Mutex<SmallRng>,
    timer: Timer,
}

impl<P: Position> Searcher<P> {
    pub fn new(config: SearchConfig) -> Self {
        Self::with_oracle(config, Box::new(CenterHeuristic))
    }

    pub fn with_oracle(config: SearchConfig, oracle: Box<dyn Oracle<P>>) -> Self {
        let master_rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        let table = ShardedTable::new(config.tt_shards);
        Searcher {
            config,
            oracle,
            root: None,
            table,
            master_rng: Mutex::new(master_rng),
            timer: Timer::new(),
        }
    }

    pub fn set_oracle(&mut self, oracle: Box<dyn Oracle<P>>) {
        self.oracle = oracle;
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Build a node: ask the oracle for priors over the legal moves of
    /// `state` and stage them all as untried.
    fn new_node(
        &self,
        state: P,
        to_play: Color,
        move_from_parent: Move,
        parent: Weak<Node<P>>,
        prior: f64,
    ) -> Arc<Node<P>> {
        let legal = state.legal_moves(to_play);
        let policy = sanitize_policy(self.oracle.policy(&state, &legal), legal.len());
        let untried = legal
            .into_iter()
            .zip(policy)
            .map(|(mv, prior)| UntriedMove { mv, prior })
            .collect();
        Arc::new(Node::new(state, to_play, move_from_parent, parent, prior, untried))
    }

    /// Run a full search from `state` and return the best move found.
    ///
    /// The root is reused when it matches `state` (after a successful
    /// [`reroot`](Self::reroot)); otherwise a fresh tree is grown. The
    /// transposition table is cleared and reseeded either way.
    pub fn search(&mut self, state: &P, to_play: Color) -> Move {
        let root = match &self.root {
            Some(r) if r.state.zobrist() == state.zobrist() && r.to_play == to_play => r.clone(),
            _ => {
                let r = self.new_node(
                    state.clone(),
                    to_play,
                    Move::pass(to_play),
                    Weak::new(),
                    1.0,
                );
                self.root = Some(r.clone());
                r
            }
        };

        self.table.clear();
        self.table.insert(root.state.zobrist(), &root);
        self.timer.start(self.config.deadline);

        // With a deadline the iteration budget is effectively unbounded.
        let budget = if self.config.deadline.is_some() {
            i64::MAX
        } else {
            self.config.iterations as i64
        };
        let remaining = AtomicI64::new(budget);

        if self.config.thread_count <= 1 {
            let mut rng = self.worker_rng();
            self.worker_loop(&root, &remaining, &mut rng);
        } else {
            let this: &Searcher<P> = self;
            std::thread::scope(|scope| {
                for _ in 0..this.config.thread_count {
                    let mut rng = this.worker_rng();
                    let root = root.clone();
                    let remaining = &remaining;
                    scope.spawn(move || this.worker_loop(&root, remaining, &mut rng));
                }
            });
        }

        self.best_move(&root, to_play)
    }

    fn worker_rng(&self) -> SmallRng {
        let mut master = self.master_rng.lock().unwrap();
        SmallRng::seed_from_u64(master.gen())
    }

    fn worker_loop(&self, root: &Arc<Node<P>>, remaining: &AtomicI64, rng: &mut SmallRng) {
        loop {
            // Budget and deadline are only checked between iterations.
            if self.timer.done() {
                break;
            }
            if remaining.fetch_sub(1, Relaxed) <= 0 {
                break;
            }
            self.run_iteration(root, rng);
        }
    }

    /// One iteration: select, expand at most one leaf, simulate,
    /// backpropagate. Every node appended below the root carries a
    /// virtual-loss reservation until backpropagation releases it.
    fn run_iteration(&self, root: &Arc<Node<P>>, rng: &mut SmallRng) {
        let mut path: Vec<Arc<Node<P>>> = vec![root.clone()];

        // Selection: descend while the node has children and its
        // widening budget is spent.
        let mut current = root.clone();
        loop {
            let next = {
                let inner = current.lock();
                if inner.children.is_empty() {
                    break;
                }
                if !inner.untried.is_empty()
                    && inner.children.len() < select::max_children(current.visits(), &self.config)
                {
                    break;
                }
                let idx = select::best_child_index(&inner.children, current.visits(), &self.config);
                let child = inner.children[idx].clone();
                child.reserve_vloss();
                child
            };
            path.push(next.clone());
            current = next;
        }

        // Expansion, entirely under the leaf's mutex. The widening cap
        // is re-checked there: another worker may have filled it since
        // selection let go of the lock.
        {
            let mut inner = current.lock();
            if !inner.untried.is_empty()
                && inner.children.len() < select::max_children(current.visits(), &self.config)
            {
                let weights: Vec<f64> = inner.untried.iter().map(|u| u.prior).collect();
                let idx = select::weighted_index(&weights, rng);
                let UntriedMove { mv, prior } = inner.untried[idx].clone();
                match current.state.apply(&mv) {
                    Ok(child_state) => {
                        let child = self.new_node(
                            child_state,
                            current.to_play.opponent(),
                            mv,
                            Arc::downgrade(&current),
                            prior,
                        );
                        inner.attach_child(idx, child.clone());
                        self.table.insert(child.state.zobrist(), &child);
                        child.reserve_vloss();
                        drop(inner);
                        path.push(child);
                    }
                    Err(err) => {
                        drop(inner);
                        warn!("adapter rejected a listed-legal move ({err}); iteration dropped");
                        release_path(&path);
                        return;
                    }
                }
            }
        }

        // Simulation from the end of the path.
        let leaf = path.last().unwrap();
        let z = match simulate::rollout(
            leaf.state.clone(),
            leaf.to_play,
            self.oracle.as_ref(),
            &self.config,
            rng,
        ) {
            Ok(z) => z,
            Err(err) => {
                warn!("rollout hit an illegal apply ({err}); iteration dropped");
                release_path(&path);
                return;
            }
        };

        // Backpropagation in reverse path order. The root was never
        // reserved; its release saturates at zero.
        for node in path.iter().rev() {
            node.release_vloss();
            node.record_result(z);
        }
    }

    /// Most-visited root child; ties go to the higher mean value, then
    /// the lower child index. Pass when the root has no children.
    fn best_move(&self, root: &Arc<Node<P>>, to_play: Color) -> Move {
        let inner = root.lock();
        let mut best: Option<(Move, u32, f64)> = None;
        for child in &inner.children {
            let visits = child.visits();
            let mean = child.expected_value();
            let better = match best {
                None => true,
                Some((_, bv, bm)) => visits > bv || (visits == bv && mean > bm),
            };
            if better {
                best = Some((child.move_from_parent, visits, mean));
            }
        }
        best.map(|(mv, _, _)| mv).unwrap_or_else(|| Move::pass(to_play))
    }

    /// Advance the root one ply to the child reached by `mv`, keeping
    /// that subtree. Tries the transposition table first, then a scan
    /// over the expanded children, then promotion of a still-untried
    /// move. Returns `false` when `mv` is not reachable from the root;
    /// the caller then discards the tree.
    pub fn reroot(&mut self, mv: &Move) -> bool {
        let root = match &self.root {
            Some(r) => r.clone(),
            None => return false,
        };

        // Transposition hit, validated to be a direct child of the
        // current root before use.
        if let Ok(post) = root.state.apply(mv) {
            if let Some(hit) = self.table.get(post.zobrist()) {
                let spliced = {
                    let mut inner = root.lock();
                    inner
                        .children
                        .iter()
                        .position(|c| Arc::ptr_eq(c, &hit))
                        .map(|i| inner.children.remove(i))
                };
                if let Some(new_root) = spliced {
                    self.root = Some(new_root);
                    return true;
                }
            }
        }

        // Move-equality scan over the expanded children.
        let spliced = {
            let mut inner = root.lock();
            inner
                .children
                .iter()
                .position(|c| c.move_from_parent == *mv)
                .map(|i| inner.children.remove(i))
        };
        if let Some(new_root) = spliced {
            self.root = Some(new_root);
            return true;
        }

        // The move may still be sitting in the untried list.
        let untried = {
            let mut inner = root.lock();
            inner
                .untried
                .iter()
                .position(|u| u.mv == *mv)
                .map(|i| inner.untried.remove(i))
        };
        if let Some(u) = untried {
            match root.state.apply(mv) {
                Ok(state) => {
                    let new_root =
                        self.new_node(state, root.to_play.opponent(), *mv, Weak::new(), u.prior);
                    self.table.insert(new_root.state.zobrist(), &new_root);
                    self.root = Some(new_root);
                    return true;
                }
                Err(err) => {
                    warn!("reroot: adapter rejected untried move ({err})");
                    return false;
                }
            }
        }

        false
    }

    // ------------------------------------------------------------------
    // Debug / observability surface.

    pub fn root_node(&self) -> Option<Arc<Node<P>>> {
        self.root.clone()
    }

    pub fn root_hash(&self) -> u64 {
        self.root.as_ref().map_or(0, |r| r.state.zobrist())
    }

    pub fn root_children_count(&self) -> usize {
        self.root.as_ref().map_or(0, |r| r.lock().children.len())
    }

    pub fn child_visits(&self, idx: usize) -> Option<u32> {
        let root = self.root.as_ref()?;
        let inner = root.lock();
        inner.children.get(idx).map(|c| c.visits())
    }

    pub fn child_virtual_loss(&self, idx: usize) -> Option<i32> {
        let root = self.root.as_ref()?;
        let inner = root.lock();
        inner.children.get(idx).map(|c| c.virtual_loss())
    }

    pub fn apply_virtual_loss(&self, idx: usize, amount: i32) -> bool {
        let Some(root) = self.root.as_ref() else {
            return false;
        };
        let inner = root.lock();
        match inner.children.get(idx) {
            Some(c) => {
                c.add_vloss(amount);
                true
            }
            None => false,
        }
    }

    pub fn revert_virtual_loss(&self, idx: usize, amount: i32) -> bool {
        let Some(root) = self.root.as_ref() else {
            return false;
        };
        let inner = root.lock();
        match inner.children.get(idx) {
            Some(c) => {
                c.sub_vloss(amount);
                true
            }
            None => false,
        }
    }

    /// Index the live virtual-loss-aware chooser would pick at the root.
    pub fn choose_child_index_at_root(&self) -> Option<usize> {
        let root = self.root.as_ref()?;
        let inner = root.lock();
        if inner.children.is_empty() {
            return None;
        }
        Some(select::amplified_root_index(
            &inner.children,
            root.visits(),
            &self.config,
        ))
    }

    pub fn root_stats(&self) -> Vec<ChildStats> {
        let Some(root) = self.root.as_ref() else {
            return Vec::new();
        };
        let inner = root.lock();
        inner
            .children
            .iter()
            .map(|c| ChildStats {
                mv: c.move_from_parent,
                visits: c.visits(),
                value_sum: c.value_sum(),
                virtual_loss: c.virtual_loss(),
                prior: c.prior,
            })
            .collect()
    }

    pub fn table_len(&self) -> usize {
        self.table.len()
    }
}

fn release_path<P: Position>(path: &[Arc<Node<P>>]) {
    for node in path {
        node.release_vloss();
    }
}
