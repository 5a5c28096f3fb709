use std::sync::atomic::Ordering::Relaxed;
use std::sync::atomic::{AtomicI32, AtomicU32};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

use crate::game::{Color, Move, Position};

/// A move not yet expanded into a child, with the prior the oracle gave
/// it at node creation.
#[derive(Clone, Debug)]
pub(crate) struct UntriedMove {
    pub mv: Move,
    pub prior: f64,
}

/// Structural state guarded by the node mutex. `value_sum` lives here
/// too: it is updated together with the statistics readers that also
/// need a consistent child list.
pub(crate) struct NodeInner<P: Position> {
    pub children: Vec<Arc<Node<P>>>,
    pub untried: Vec<UntriedMove>,
    pub value_sum: f64,
}

impl<P: Position> NodeInner<P> {
    /// Append a child and retire the untried entry that produced it.
    /// `untried` keeps its order; it only ever shrinks.
    pub fn attach_child(&mut self, untried_idx: usize, child: Arc<Node<P>>) {
        self.untried.remove(untried_idx);
        self.children.push(child);
    }
}

/// One tree node. Never relocated while reachable: the parent holds the
/// owning `Arc`, the transposition table only `Weak` handles.
pub struct Node<P: Position> {
    pub state: P,
    /// Colour to move at this node.
    pub to_play: Color,
    /// The move that produced `state` from the parent.
    pub move_from_parent: Move,
    /// Upgrades to `None` only for the current root.
    pub(crate) parent: Weak<Node<P>>,
    /// Prior of `move_from_parent`, fixed at creation.
    pub prior: f64,
    visits: AtomicU32,
    virtual_loss: AtomicI32,
    pub(crate) inner: Mutex<NodeInner<P>>,
}

impl<P: Position> Node<P> {
    pub(crate) fn new(
        state: P,
        to_play: Color,
        move_from_parent: Move,
        parent: Weak<Node<P>>,
        prior: f64,
        untried: Vec<UntriedMove>,
    ) -> Node<P> {
        Node {
            state,
            to_play,
            move_from_parent,
            parent,
            prior,
            visits: AtomicU32::new(0),
            virtual_loss: AtomicI32::new(0),
            inner: Mutex::new(NodeInner {
                children: Vec::new(),
                untried,
                value_sum: 0.0,
            }),
        }
    }

    #[inline]
    pub fn visits(&self) -> u32 {
        self.visits.load(Relaxed)
    }

    #[inline]
    pub fn virtual_loss(&self) -> i32 {
        self.virtual_loss.load(Relaxed)
    }

    #[inline]
    pub(crate) fn lock(&self) -> MutexGuard<'_, NodeInner<P>> {
        self.inner.lock().unwrap()
    }

    #[inline]
    pub fn reserve_vloss(&self) {
        self.virtual_loss.fetch_add(1, Relaxed);
    }

    /// Saturates at zero so a stray extra release can never drive the
    /// counter negative.
    #[inline]
    pub fn release_vloss(&self) {
        let prev = self.virtual_loss.fetch_sub(1, Relaxed);
        if prev <= 0 {
            self.virtual_loss.store(0, Relaxed);
        }
    }

    pub fn add_vloss(&self, amount: i32) {
        self.virtual_loss.fetch_add(amount, Relaxed);
    }

    pub fn sub_vloss(&self, amount: i32) {
        let prev = self.virtual_loss.fetch_sub(amount, Relaxed);
        if prev - amount < 0 {
            self.virtual_loss.store(0, Relaxed);
        }
    }

    /// One finished iteration: bump the visit count and fold the
    /// Black-perspective result into the value sum.
    pub fn record_result(&self, z: f64) {
        self.visits.fetch_add(1, Relaxed);
        self.lock().value_sum += z;
    }

    pub fn value_sum(&self) -> f64 {
        self.lock().value_sum
    }

    /// Mean result; zero until the first visit lands.
    pub fn expected_value(&self) -> f64 {
        let sum = self.value_sum();
        sum / (self.visits().max(1) as f64)
    }

    /// Snapshot of the child list (the `Arc`s, not the subtrees).
    pub fn children(&self) -> Vec<Arc<Node<P>>> {
        self.lock().children.clone()
    }

    pub fn untried_len(&self) -> usize {
        self.lock().untried.len()
    }

    pub fn is_root(&self) -> bool {
        self.parent.upgrade().is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Color;
    use crate::games::go::Board;

    fn leaf(board: &Board) -> Node<Board> {
        Node::new(
            board.clone(),
            Color::Black,
            Move::pass(Color::Black),
            Weak::new(),
            1.0,
            vec![UntriedMove {
                mv: Move::place(0, 0, Color::Black),
                prior: 1.0,
            }],
        )
    }

    #[test]
    fn vloss_release_saturates_at_zero() {
        let n = leaf(&Board::new(5));
        n.release_vloss();
        assert_eq!(n.virtual_loss(), 0);

        n.reserve_vloss();
        n.reserve_vloss();
        n.release_vloss();
        assert_eq!(n.virtual_loss(), 1);
        n.release_vloss();
        n.release_vloss();
        assert_eq!(n.virtual_loss(), 0);
    }

    #[test]
    fn bulk_vloss_saturates_too() {
        let n = leaf(&Board::new(5));
        n.add_vloss(5);
        assert_eq!(n.virtual_loss(), 5);
        n.sub_vloss(7);
        assert_eq!(n.virtual_loss(), 0);
    }

    #[test]
    fn record_result_accumulates() {
        let n = leaf(&Board::new(5));
        assert_eq!(n.expected_value(), 0.0);
        n.record_result(1.0);
        n.record_result(0.0);
        n.record_result(1.0);
        assert_eq!(n.visits(), 3);
        assert_eq!(n.value_sum(), 2.0);
        assert!((n.expected_value() - 2.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn attach_child_retires_untried_entry() {
        let board = Board::new(5);
        let parent = leaf(&board);
        let child = Arc::new(Node::new(
            board.clone(),
            Color::White,
            Move::place(0, 0, Color::Black),
            Weak::new(),
            1.0,
            Vec::new(),
        ));

        let mut inner = parent.lock();
        assert_eq!(inner.untried.len(), 1);
        inner.attach_child(0, child);
        assert_eq!(inner.untried.len(), 0);
        assert_eq!(inner.children.len(), 1);
    }
}
