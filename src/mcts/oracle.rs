use log::warn;

use crate::game::{Move, Position};

/// Prior/value capability consumed by the search. A real policy/value
/// network slots in here; the default is a cheap board heuristic.
pub trait Oracle<P: Position>: Send + Sync {
    /// One non-negative weight per legal move, summing to 1, in the
    /// order of `legal`.
    fn policy(&self, state: &P, legal: &[Move]) -> Vec<f64>;

    /// Position value in `[0, 1]` from Black's perspective.
    fn value(&self, state: &P) -> f64;
}

/// Default oracle: prefers central points and contact with existing
/// stones. Pass scores zero before normalisation.
#[derive(Clone, Copy, Debug, Default)]
pub struct CenterHeuristic;

fn move_prior_score<P: Position>(state: &P, mv: &Move) -> f64 {
    if mv.pass {
        return 0.0;
    }
    let n = state.size() as f64;
    let center = (n - 1.0) / 2.0;
    let dx = mv.x as f64 - center;
    let dy = mv.y as f64 - center;
    let center_score = n - (dx * dx + dy * dy).sqrt();

    let mut adjacent = 0;
    for dy2 in -1..=1 {
        for dx2 in -1..=1 {
            if dx2 == 0 && dy2 == 0 {
                continue;
            }
            if state.stone_at(mv.x + dx2, mv.y + dy2).is_some() {
                adjacent += 1;
            }
        }
    }
    center_score + 2.0 * adjacent as f64
}

impl<P: Position> Oracle<P> for CenterHeuristic {
    fn policy(&self, state: &P, legal: &[Move]) -> Vec<f64> {
        let mut out = Vec::with_capacity(legal.len());
        let mut total = 0.0;
        for mv in legal {
            let s = move_prior_score(state, mv) + 1.0;
            out.push(s);
            total += s;
        }
        if total <= 0.0 {
            let uniform = 1.0 / legal.len().max(1) as f64;
            out.iter_mut().for_each(|v| *v = uniform);
        } else {
            out.iter_mut().for_each(|v| *v /= total);
        }
        out
    }

    fn value(&self, _state: &P) -> f64 {
        0.5
    }
}

/// Guard against a misbehaving oracle: wrong length, negative or
/// non-finite entries, or a zero sum all collapse to uniform.
pub(crate) fn sanitize_policy(policy: Vec<f64>, len: usize) -> Vec<f64> {
    let ok = policy.len() == len
        && policy.iter().all(|p| p.is_finite() && *p >= 0.0)
        && policy.iter().sum::<f64>() > 0.0;
    if ok {
        policy
    } else {
        warn!("oracle returned an invalid policy, falling back to uniform");
        vec![1.0 / len.max(1) as f64; len]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Color;
    use crate::games::go::Board;

    #[test]
    fn policy_is_a_distribution() {
        let board = Board::new(5);
        let legal = board.legal_moves(Color::Black);
        let policy = CenterHeuristic.policy(&board, &legal);

        assert_eq!(policy.len(), legal.len());
        assert!(policy.iter().all(|p| *p >= 0.0));
        assert!((policy.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn center_beats_corner_and_pass() {
        let board = Board::new(5);
        let legal = board.legal_moves(Color::Black);
        let policy = CenterHeuristic.policy(&board, &legal);

        let at = |x, y| {
            legal
                .iter()
                .position(|m| m.x == x && m.y == y && !m.pass)
                .unwrap()
        };
        let center = policy[at(2, 2)];
        let corner = policy[at(0, 0)];
        let pass = policy[legal.len() - 1];
        assert!(center > corner);
        assert!(corner > pass);
    }

    #[test]
    fn contact_moves_gain_weight() {
        let mut board = Board::new(5);
        board.place(2, 2, Color::White).unwrap();
        let legal = board.legal_moves(Color::Black);
        let policy = CenterHeuristic.policy(&board, &legal);

        // (2,1) touches the white stone, (0,0) touches nothing; the
        // neighbour bonus should widen the gap beyond pure centrality.
        let at = |x, y| {
            legal
                .iter()
                .position(|m| m.x == x && m.y == y && !m.pass)
                .unwrap()
        };
        assert!(policy[at(2, 1)] > policy[at(0, 0)]);
    }

    #[test]
    fn default_value_is_neutral() {
        let board = Board::new(5);
        assert_eq!(Oracle::<Board>::value(&CenterHeuristic, &board), 0.5);
    }

    #[test]
    fn sanitize_rejects_bad_policies() {
        let uniform = vec![0.25; 4];
        assert_eq!(sanitize_policy(vec![], 4), uniform);
        assert_eq!(sanitize_policy(vec![0.5, -0.5, 0.5, 0.5], 4), uniform);
        assert_eq!(sanitize_policy(vec![f64::NAN, 0.0, 0.0, 1.0], 4), uniform);
        assert_eq!(sanitize_policy(vec![0.0; 4], 4), uniform);

        let good = vec![0.1, 0.2, 0.3, 0.4];
        assert_eq!(sanitize_policy(good.clone(), 4), good);
    }
}
