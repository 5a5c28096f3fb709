use serde::Serialize;

/// Stone colour. Go is strictly two-player, so this doubles as the
/// player identifier.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize)]
pub enum Color {
    Black,
    White,
}

impl Color {
    #[inline]
    pub fn opponent(self) -> Color {
        match self {
            Color::Black => Color::White,
            Color::White => Color::Black,
        }
    }

    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

impl std::fmt::Display for Color {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Color::Black => write!(f, "black"),
            Color::White => write!(f, "white"),
        }
    }
}

/// A move: a placement at (x, y) or a pass. A pass carries `x = y = -1`.
/// Equality is over all four fields.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq, Serialize)]
pub struct Move {
    pub x: i32,
    pub y: i32,
    pub color: Color,
    pub pass: bool,
}

impl Move {
    pub fn place(x: i32, y: i32, color: Color) -> Move {
        Move {
            x,
            y,
            color,
            pass: false,
        }
    }

    pub fn pass(color: Color) -> Move {
        Move {
            x: -1,
            y: -1,
            color,
            pass: true,
        }
    }

    #[inline]
    pub fn is_pass(&self) -> bool {
        self.pass
    }
}

impl std::fmt::Display for Move {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.pass {
            write!(f, "{} pass", self.color)
        } else {
            write!(f, "{} ({},{})", self.color, self.x, self.y)
        }
    }
}

/// Scoring ruleset. Chinese counts stones plus territory, Japanese
/// territory only.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum Ruleset {
    Chinese,
    Japanese,
}

/// Why an adapter rejected a move.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IllegalReason {
    OffBoard,
    Occupied,
    Suicide,
    Superko,
}

/// Returned by [`Position::apply`] when the rules reject a move. The
/// search treats this as an adapter bug: the offending iteration is
/// dropped, never propagated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IllegalMove {
    pub mv: Move,
    pub reason: IllegalReason,
}

impl std::fmt::Display for IllegalMove {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "illegal move {}: {:?}", self.mv, self.reason)
    }
}

impl std::error::Error for IllegalMove {}

/// The game-state contract the search consumes. Implementations must be
/// cheap to clone; `apply` is by-value (clone then mutate).
///
/// `legal_moves` must only return moves `apply` accepts, must order them
/// deterministically, and must include pass as the last element.
pub trait Position: Clone + Send + Sync {
    fn size(&self) -> usize;

    fn legal_moves(&self, to_play: Color) -> Vec<Move>;

    fn apply(&self, mv: &Move) -> Result<Self, IllegalMove>;

    /// Stable 64-bit hash: equal positions hash equal across instances.
    fn zobrist(&self) -> u64;

    /// Two consecutive passes end the game.
    fn is_terminal(&self) -> bool;

    /// `(black, white)` with komi already added to white.
    fn score(&self, rules: Ruleset, komi: f64) -> (f64, f64);

    /// Occupancy of an intersection; `None` when empty or off-board.
    fn stone_at(&self, x: i32, y: i32) -> Option<Color>;
}
