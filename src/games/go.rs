//! Go board with capture, suicide and positional-superko rules.
//!
//! Legality is decided on a simulated grid: captures are resolved first,
//! then the suicide check, then the superko check against the full hash
//! history. `legal_moves` therefore only ever returns moves that
//! `apply` accepts.

use crate::game::{Color, IllegalMove, IllegalReason, Move, Position, Ruleset};
use crate::zobrist;

const DX: [i32; 4] = [1, -1, 0, 0];
const DY: [i32; 4] = [0, 0, 1, -1];

#[derive(Clone, Debug)]
pub struct Board {
    size: usize,
    grid: Vec<Option<Color>>,
    hash: u64,
    // Every position hash seen so far, the initial empty board included.
    history: Vec<u64>,
    consecutive_passes: u32,
}

impl Board {
    pub fn new(size: usize) -> Board {
        assert!(size >= 2 && size <= zobrist::MAX_BOARD);
        let grid = vec![None; size * size];
        let hash = zobrist::grid_hash(&grid);
        Board {
            size,
            grid,
            hash,
            history: vec![hash],
            consecutive_passes: 0,
        }
    }

    #[inline]
    fn inside(&self, x: i32, y: i32) -> bool {
        x >= 0 && y >= 0 && (x as usize) < self.size && (y as usize) < self.size
    }

    #[inline]
    fn idx(&self, x: i32, y: i32) -> usize {
        y as usize * self.size + x as usize
    }

    pub fn get(&self, x: i32, y: i32) -> Option<Color> {
        if self.inside(x, y) {
            self.grid[self.idx(x, y)]
        } else {
            None
        }
    }

    pub fn consecutive_passes(&self) -> u32 {
        self.consecutive_passes
    }

    fn group_has_liberty(&self, grid: &[Option<Color>], x: i32, y: i32) -> bool {
        let color = match grid[self.idx(x, y)] {
            Some(c) => c,
            None => return true,
        };
        let mut visited = vec![false; self.size * self.size];
        let mut stack = vec![(x, y)];
        visited[self.idx(x, y)] = true;
        while let Some((cx, cy)) = stack.pop() {
            for i in 0..4 {
                let (nx, ny) = (cx + DX[i], cy + DY[i]);
                if !self.inside(nx, ny) {
                    continue;
                }
                let id = self.idx(nx, ny);
                match grid[id] {
                    None => return true,
                    Some(c) if c == color && !visited[id] => {
                        visited[id] = true;
                        stack.push((nx, ny));
                    }
                    _ => {}
                }
            }
        }
        false
    }

    fn collect_group(&self, grid: &[Option<Color>], x: i32, y: i32) -> Vec<usize> {
        let color = grid[self.idx(x, y)];
        let mut seen = vec![false; self.size * self.size];
        let mut stack = vec![(x, y)];
        let mut out = Vec::new();
        seen[self.idx(x, y)] = true;
        while let Some((cx, cy)) = stack.pop() {
            out.push(self.idx(cx, cy));
            for i in 0..4 {
                let (nx, ny) = (cx + DX[i], cy + DY[i]);
                if !self.inside(nx, ny) {
                    continue;
                }
                let id = self.idx(nx, ny);
                if !seen[id] && grid[id] == color {
                    seen[id] = true;
                    stack.push((nx, ny));
                }
            }
        }
        out
    }

    /// Resolve a placement on a scratch grid without committing it.
    fn try_place(&self, x: i32, y: i32, color: Color) -> Result<(Vec<Option<Color>>, u64), IllegalMove> {
        let mv = Move::place(x, y, color);
        if !self.inside(x, y) {
            return Err(IllegalMove {
                mv,
                reason: IllegalReason::OffBoard,
            });
        }
        let id = self.idx(x, y);
        if self.grid[id].is_some() {
            return Err(IllegalMove {
                mv,
                reason: IllegalReason::Occupied,
            });
        }

        let mut tmp = self.grid.clone();
        tmp[id] = Some(color);

        // Captures resolve before the suicide check.
        for i in 0..4 {
            let (nx, ny) = (x + DX[i], y + DY[i]);
            if !self.inside(nx, ny) {
                continue;
            }
            let nid = self.idx(nx, ny);
            if tmp[nid].is_some()
                && tmp[nid] != Some(color)
                && !self.group_has_liberty(&tmp, nx, ny)
            {
                for p in self.collect_group(&tmp, nx, ny) {
                    tmp[p] = None;
                }
            }
        }

        if !self.group_has_liberty(&tmp, x, y) {
            return Err(IllegalMove {
                mv,
                reason: IllegalReason::Suicide,
            });
        }

        let new_hash = zobrist::grid_hash(&tmp);
        if self.history.contains(&new_hash) {
            return Err(IllegalMove {
                mv,
                reason: IllegalReason::Superko,
            });
        }

        Ok((tmp, new_hash))
    }

    pub fn place(&mut self, x: i32, y: i32, color: Color) -> Result<(), IllegalMove> {
        let (grid, hash) = self.try_place(x, y, color)?;
        self.grid = grid;
        self.hash = hash;
        self.history.push(hash);
        self.consecutive_passes = 0;
        Ok(())
    }

    /// A pass leaves the grid alone but still extends the history.
    pub fn pass_turn(&mut self) {
        self.history.push(self.hash);
        self.consecutive_passes += 1;
    }
}

impl Position for Board {
    fn size(&self) -> usize {
        self.size
    }

    fn legal_moves(&self, to_play: Color) -> Vec<Move> {
        let mut moves = Vec::new();
        for y in 0..self.size as i32 {
            for x in 0..self.size as i32 {
                if self.grid[self.idx(x, y)].is_none() && self.try_place(x, y, to_play).is_ok() {
                    moves.push(Move::place(x, y, to_play));
                }
            }
        }
        moves.push(Move::pass(to_play));
        moves
    }

    fn apply(&self, mv: &Move) -> Result<Board, IllegalMove> {
        let mut next = self.clone();
        if mv.pass {
            next.pass_turn();
        } else {
            next.place(mv.x, mv.y, mv.color)?;
        }
        Ok(next)
    }

    fn zobrist(&self) -> u64 {
        self.hash
    }

    fn is_terminal(&self) -> bool {
        self.consecutive_passes >= 2
    }

    fn score(&self, rules: Ruleset, komi: f64) -> (f64, f64) {
        let n = self.size as i32;
        let mut stones_black = 0usize;
        let mut stones_white = 0usize;
        for cell in &self.grid {
            match cell {
                Some(Color::Black) => stones_black += 1,
                Some(Color::White) => stones_white += 1,
                None => {}
            }
        }

        // Flood-fill the empty regions; a region counts as territory only
        // when it borders exactly one colour and never touches the edge.
        let mut seen = vec![false; self.size * self.size];
        let mut territory_black = 0usize;
        let mut territory_white = 0usize;

        for y in 0..n {
            for x in 0..n {
                let id = self.idx(x, y);
                if self.grid[id].is_some() || seen[id] {
                    continue;
                }
                let mut stack = vec![(x, y)];
                seen[id] = true;
                let mut region = 0usize;
                let mut borders_black = false;
                let mut borders_white = false;
                let mut touches_edge = false;
                while let Some((cx, cy)) = stack.pop() {
                    region += 1;
                    for i in 0..4 {
                        let (nx, ny) = (cx + DX[i], cy + DY[i]);
                        if !self.inside(nx, ny) {
                            touches_edge = true;
                            continue;
                        }
                        let nid = self.idx(nx, ny);
                        match self.grid[nid] {
                            None => {
                                if !seen[nid] {
                                    seen[nid] = true;
                                    stack.push((nx, ny));
                                }
                            }
                            Some(Color::Black) => borders_black = true,
                            Some(Color::White) => borders_white = true,
                        }
                    }
                }
                if !touches_edge {
                    match (borders_black, borders_white) {
                        (true, false) => territory_black += region,
                        (false, true) => territory_white += region,
                        _ => {}
                    }
                }
            }
        }

        match rules {
            Ruleset::Chinese => (
                (stones_black + territory_black) as f64,
                (stones_white + territory_white) as f64 + komi,
            ),
            Ruleset::Japanese => (territory_black as f64, territory_white as f64 + komi),
        }
    }

    fn stone_at(&self, x: i32, y: i32) -> Option<Color> {
        self.get(x, y)
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for y in 0..self.size as i32 {
            for x in 0..self.size as i32 {
                let c = match self.grid[self.idx(x, y)] {
                    Some(Color::Black) => 'X',
                    Some(Color::White) => 'O',
                    None => '.',
                };
                write!(f, "{c} ")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
