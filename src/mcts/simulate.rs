use rand::rngs::SmallRng;

use crate::game::{Color, IllegalMove, Position};
use crate::mcts::config::SearchConfig;
use crate::mcts::oracle::{sanitize_policy, Oracle};
use crate::mcts::select::weighted_index;

/// Bounded playout from `state`: prior-weighted moves until two
/// consecutive passes or the depth cap, then a Chinese-rules count.
/// The result is 1.0 when Black wins, 0.0 otherwise, regardless of
/// whose turn it was at the leaf.
pub(crate) fn rollout<P: Position>(
    mut state: P,
    mut to_play: Color,
    oracle: &dyn Oracle<P>,
    config: &SearchConfig,
    rng: &mut SmallRng,
) -> Result<f64, IllegalMove> {
    for _ in 0..config.playout_depth {
        if state.is_terminal() {
            break;
        }
        let legal = state.legal_moves(to_play);
        if legal.is_empty() {
            break;
        }
        let policy = sanitize_policy(oracle.policy(&state, &legal), legal.len());
        let mv = legal[weighted_index(&policy, rng)];
        state = state.apply(&mv)?;
        to_play = to_play.opponent();
    }

    let (black, white) = state.score(config.ruleset, config.komi);
    Ok(if black > white { 1.0 } else { 0.0 })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::Move;
    use crate::games::go::Board;
    use crate::mcts::oracle::CenterHeuristic;
    use rand_core::SeedableRng;

    #[test]
    fn rollout_returns_a_binary_result() {
        let config = SearchConfig::default().playout_depth(30);
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..10 {
            let z = rollout(
                Board::new(5),
                Color::Black,
                &CenterHeuristic,
                &config,
                &mut rng,
            )
            .unwrap();
            assert!(z == 0.0 || z == 1.0);
        }
    }

    #[test]
    fn zero_depth_scores_the_given_position() {
        // Empty board: no territory for anyone, komi decides for White.
        let config = SearchConfig::default().playout_depth(0);
        let mut rng = SmallRng::seed_from_u64(3);
        let z = rollout(
            Board::new(5),
            Color::Black,
            &CenterHeuristic,
            &config,
            &mut rng,
        )
        .unwrap();
        assert_eq!(z, 0.0);
    }

    #[test]
    fn terminal_position_is_scored_immediately() {
        let board = Board::new(5)
            .apply(&Move::pass(Color::Black))
            .unwrap()
            .apply(&Move::pass(Color::White))
            .unwrap();
        let config = SearchConfig::default();
        let mut rng = SmallRng::seed_from_u64(3);
        let z = rollout(board, Color::Black, &CenterHeuristic, &config, &mut rng).unwrap();
        assert_eq!(z, 0.0);
    }

    #[test]
    fn same_seed_same_result() {
        let config = SearchConfig::default().playout_depth(40);
        let run = |seed| {
            let mut rng = SmallRng::seed_from_u64(seed);
            rollout(
                Board::new(5),
                Color::Black,
                &CenterHeuristic,
                &config,
                &mut rng,
            )
            .unwrap()
        };
        assert_eq!(run(11), run(11));
        assert_eq!(run(99), run(99));
    }
}
