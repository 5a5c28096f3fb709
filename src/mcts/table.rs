use std::sync::{Arc, Mutex, Weak};

use rustc_hash::FxHashMap;

use crate::game::Position;
use crate::mcts::node::Node;

/// Sharded zobrist → node map. Entries are advisory `Weak` handles: a
/// miss is always safe, a dead handle upgrades to a miss, and callers
/// re-validate parentage before trusting a hit. Each operation takes
/// only its shard's lock; `clear` walks the shards one at a time.
pub struct ShardedTable<P: Position> {
    shards: Box<[Mutex<FxHashMap<u64, Weak<Node<P>>>>]>,
}

impl<P: Position> ShardedTable<P> {
    pub fn new(shards: usize) -> Self {
        let shards = shards.max(1);
        let mut v = Vec::with_capacity(shards);
        v.resize_with(shards, || Mutex::new(FxHashMap::default()));
        ShardedTable {
            shards: v.into_boxed_slice(),
        }
    }

    #[inline]
    fn shard(&self, key: u64) -> &Mutex<FxHashMap<u64, Weak<Node<P>>>> {
        &self.shards[(key % self.shards.len() as u64) as usize]
    }

    pub fn insert(&self, key: u64, node: &Arc<Node<P>>) {
        self.shard(key)
            .lock()
            .unwrap()
            .insert(key, Arc::downgrade(node));
    }

    pub fn get(&self, key: u64) -> Option<Arc<Node<P>>> {
        self.shard(key).lock().unwrap().get(&key)?.upgrade()
    }

    pub fn erase(&self, key: u64) {
        self.shard(key).lock().unwrap().remove(&key);
    }

    pub fn clear(&self) {
        for shard in self.shards.iter() {
            shard.lock().unwrap().clear();
        }
    }

    /// Live and dead entries alike; debug use only.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.lock().unwrap().len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::{Color, Move, Position};
    use crate::games::go::Board;
    use crate::mcts::node::Node;

    fn node(board: &Board) -> Arc<Node<Board>> {
        Arc::new(Node::new(
            board.clone(),
            Color::Black,
            Move::pass(Color::Black),
            Weak::new(),
            1.0,
            Vec::new(),
        ))
    }

    #[test]
    fn insert_then_get() {
        let table = ShardedTable::new(64);
        let board = Board::new(5);
        let n = node(&board);
        table.insert(board.zobrist(), &n);

        let hit = table.get(board.zobrist()).unwrap();
        assert!(Arc::ptr_eq(&hit, &n));
        assert!(table.get(board.zobrist() ^ 1).is_none());
    }

    #[test]
    fn dead_entry_is_a_miss() {
        let table = ShardedTable::new(8);
        let board = Board::new(5);
        let key = board.zobrist();
        {
            let n = node(&board);
            table.insert(key, &n);
        }
        // The node is gone; the stale handle must not resolve.
        assert!(table.get(key).is_none());
        assert_eq!(table.len(), 1);
    }

    #[test]
    fn erase_and_clear() {
        let table = ShardedTable::new(4);
        let board = Board::new(5);
        let nodes: Vec<_> = (0..16).map(|_| node(&board)).collect();
        for (i, n) in nodes.iter().enumerate() {
            table.insert(i as u64, n);
        }
        assert_eq!(table.len(), 16);

        table.erase(3);
        assert!(table.get(3).is_none());
        assert_eq!(table.len(), 15);

        table.clear();
        assert!(table.is_empty());
    }

    #[test]
    fn single_shard_still_works() {
        let table = ShardedTable::new(0);
        assert_eq!(table.shard_count(), 1);
        let board = Board::new(5);
        let n = node(&board);
        table.insert(42, &n);
        assert!(table.get(42).is_some());
    }
}
