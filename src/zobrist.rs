use rand::rngs::StdRng;
use rand::Rng;
use rand_core::SeedableRng;
use std::sync::OnceLock;

use crate::game::Color;

/// Largest board the shared table covers.
pub const MAX_BOARD: usize = 19;
const MAX_CELLS: usize = MAX_BOARD * MAX_BOARD;

pub struct ZobristTable {
    stones: Box<[[u64; 2]; MAX_CELLS]>,
}

impl ZobristTable {
    fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut stones = Box::new([[0u64; 2]; MAX_CELLS]);
        for cell in stones.iter_mut() {
            cell[0] = rng.gen::<u64>();
            cell[1] = rng.gen::<u64>();
        }
        ZobristTable { stones }
    }

    #[inline]
    fn stone_hash(&self, cell: usize, color: Color) -> u64 {
        debug_assert!(cell < MAX_CELLS);
        self.stones[cell][color.index()]
    }
}

/// Table initialisation is deferred until the first hash is needed.
pub struct LazyZobristTable {
    once: OnceLock<ZobristTable>,
    seed: u64,
}

impl LazyZobristTable {
    pub const fn new(seed: u64) -> Self {
        LazyZobristTable {
            once: OnceLock::new(),
            seed,
        }
    }

    #[inline(always)]
    fn get_or_init(&self) -> &ZobristTable {
        self.once.get_or_init(|| ZobristTable::new(self.seed))
    }

    #[inline(always)]
    pub fn stone_hash(&self, cell: usize, color: Color) -> u64 {
        self.get_or_init().stone_hash(cell, color)
    }
}

// Fixed seed so hashes are stable across runs and processes.
pub static STONES: LazyZobristTable = LazyZobristTable::new(0x9e37_79b9_7f4a_7c15);

/// XOR of the per-stone hashes over the occupied cells.
pub fn grid_hash(grid: &[Option<Color>]) -> u64 {
    let mut h = 0u64;
    for (i, cell) in grid.iter().enumerate() {
        if let Some(color) = cell {
            h ^= STONES.stone_hash(i, *color);
        }
    }
    h
}
