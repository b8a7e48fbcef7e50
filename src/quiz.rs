use std::collections::HashSet;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::sqlite::SqliteExecutor;

use crate::db::queries::questions::get_quiz_candidates;
use crate::db::Question;

/// Category a quiz is played in. Id 0 stands for every category; the `type`
/// label clients send alongside the id does not affect selection.
#[derive(Debug, Clone, Deserialize)]
pub struct QuizCategory {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub id: i64,
}

impl QuizCategory {
    pub const ALL: i64 = 0;

    pub fn filter(&self) -> Option<i64> {
        (self.id != Self::ALL).then_some(self.id)
    }
}

/// Uniformly picks a candidate whose id is not in `previous`.
pub fn pick_unseen<R: Rng + ?Sized>(
    candidates: Vec<Question>,
    previous: &[i64],
    rng: &mut R,
) -> Option<Question> {
    let seen: HashSet<i64> = previous.iter().copied().collect();
    let unseen: Vec<Question> = candidates
        .into_iter()
        .filter(|q| !seen.contains(&q.id))
        .collect();
    unseen.choose(rng).cloned()
}

/// Next question for a quiz, or `None` once the category is exhausted.
pub async fn next_question<'c>(
    executor: impl SqliteExecutor<'c>,
    category: Option<&QuizCategory>,
    previous: &[i64],
) -> sqlx::Result<Option<Question>> {
    let filter = category.and_then(QuizCategory::filter);
    let candidates = get_quiz_candidates(executor, filter).await?;
    Ok(pick_unseen(candidates, previous, &mut rand::thread_rng()))
}
