use rand::Rng;

use crate::win_prob::calculate_win_prob;

/// Sample one game. Returns `true` when the first team wins.
///
/// One uniform draw in [0, 1) is compared against the first team's logistic
/// win probability.
pub fn game_transform_sim<R: Rng>(rating_a: f64, rating_b: f64, rng: &mut R) -> bool {
    rng.gen::<f64>() < calculate_win_prob(rating_a, rating_b)
}

/// Bracket slot order for `size` seeds (a power of two), as 0-based seed
/// indices.
///
/// Built recursively so that seed 1 and seed 2 can only meet in the final:
/// each round of doubling pairs seed `s` with seed `2n + 1 - s`. For eight
/// seeds this gives 1v8, 4v5, 2v7, 3v6.
pub fn seeding_order(size: usize) -> Vec<usize> {
    debug_assert!(size.is_power_of_two());
    if size <= 1 {
        return vec![0];
    }
    seeding_order(size / 2)
        .into_iter()
        .flat_map(|seed| [seed, size - 1 - seed])
        .collect()
}

/// Play a bracket to completion.
///
/// `slots` holds team indices in bracket order; adjacent slots meet, and the
/// winners meet pairwise in the next round until one team is left.
/// `on_advance(round, team)` fires for every winner, `round` counting from 0.
pub fn play_bracket<R, F>(slots: &[usize], ratings: &[f64], rng: &mut R, on_advance: &mut F) -> usize
where
    R: Rng,
    F: FnMut(usize, usize),
{
    play_round(slots.to_vec(), 0, ratings, rng, on_advance)
}

fn play_round<R, F>(slots: Vec<usize>, round: usize, ratings: &[f64], rng: &mut R, on_advance: &mut F) -> usize
where
    R: Rng,
    F: FnMut(usize, usize),
{
    if slots.len() == 1 {
        return slots[0];
    }

    let winners: Vec<usize> = slots
        .chunks(2)
        .map(|pair| {
            let (a, b) = (pair[0], pair[1]);
            let winner = if game_transform_sim(ratings[a], ratings[b], rng) { a } else { b };
            on_advance(round, winner);
            winner
        })
        .collect();

    play_round(winners, round + 1, ratings, rng, on_advance)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_seeding_order_eight() {
        assert_eq!(seeding_order(8), vec![0, 7, 3, 4, 1, 6, 2, 5]);
    }

    #[test]
    fn test_seeding_order_small() {
        assert_eq!(seeding_order(1), vec![0]);
        assert_eq!(seeding_order(2), vec![0, 1]);
        assert_eq!(seeding_order(4), vec![0, 3, 1, 2]);
    }

    #[test]
    fn test_seeding_order_is_permutation() {
        let mut order = seeding_order(32);
        order.sort_unstable();
        assert_eq!(order, (0..32).collect::<Vec<_>>());
    }

    #[test]
    fn test_game_transform_sim_heavy_favourite() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let wins = (0..1000)
            .filter(|_| game_transform_sim(2500.0, 1500.0, &mut rng))
            .count();
        assert!(wins > 980, "near-certain favourite won only {} of 1000", wins);
    }

    #[test]
    fn test_play_bracket_records_every_round() {
        let ratings = vec![1600.0, 1550.0, 1500.0, 1450.0];
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut advances: Vec<(usize, usize)> = Vec::new();

        let champion = play_bracket(&seeding_order(4), &ratings, &mut rng, &mut |round, team| {
            advances.push((round, team))
        });

        assert_eq!(advances.len(), 3);
        assert_eq!(advances.iter().filter(|(r, _)| *r == 0).count(), 2);
        assert_eq!(advances.last(), Some(&(1, champion)));
    }

    #[test]
    fn test_play_bracket_same_seed_same_champion() {
        let ratings: Vec<f64> = (0..8).map(|i| 1600.0 - 20.0 * i as f64).collect();
        let slots = seeding_order(8);
        let run = |seed| {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            play_bracket(&slots, &ratings, &mut rng, &mut |_, _| {})
        };
        assert_eq!(run(42), run(42));
    }
}
