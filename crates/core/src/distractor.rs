//! Option lists for multiple-choice presentation.

use std::collections::HashSet;

use rand::Rng;

use crate::model::QuizItem;
use crate::shuffle::fisher_yates;

/// Number of distractors shown next to the correct answer by default.
pub const DEFAULT_DISTRACTOR_COUNT: usize = 3;

/// Sample up to `desired` wrong answers for `item` from the other items in `pool`.
///
/// Candidates are the distinct correct answers of the other items, minus the
/// item's own answer. Sampling is without replacement and caps at
/// `min(desired, available)`.
pub fn sample_distractors<I, R>(item: &I, pool: &[I], desired: usize, rng: &mut R) -> Vec<String>
where
    I: QuizItem,
    R: Rng + ?Sized,
{
    let mut seen = HashSet::new();
    let mut candidates: Vec<&str> = pool
        .iter()
        .filter(|other| other.id() != item.id())
        .map(QuizItem::answer)
        .filter(|answer| *answer != item.answer())
        .filter(|answer| seen.insert(*answer))
        .collect();

    fisher_yates(&mut candidates, rng);
    candidates.truncate(desired.min(candidates.len()));
    candidates.into_iter().map(str::to_string).collect()
}

/// Build the option list shown for `item`.
///
/// Curated choices are returned as authored unless `reshuffle_curated` is set.
/// Otherwise distractors are sampled from `pool`, the correct answer is added,
/// and the whole list is shuffled so the answer's slot carries no signal.
pub fn build_options<I, R>(
    item: &I,
    pool: &[I],
    desired: usize,
    reshuffle_curated: bool,
    rng: &mut R,
) -> Vec<String>
where
    I: QuizItem,
    R: Rng + ?Sized,
{
    if let Some(choices) = item.choices() {
        let mut options = choices.to_vec();
        if reshuffle_curated {
            fisher_yates(&mut options, rng);
        }
        return options;
    }

    let mut options = sample_distractors(item, pool, desired, rng);
    options.push(item.answer().to_string());
    fisher_yates(&mut options, rng);
    options
}
