use axum::{
    extract::{rejection::JsonRejection, State},
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::{
    db::Question,
    quiz::{next_question, QuizCategory},
    server::{app::AppState, error::ApiError},
    telemetry::QUIZ_CNTR,
};

use super::{success, ApiResponse};

#[derive(Deserialize)]
struct QuizRequest {
    #[serde(default)]
    previous_questions: Vec<i64>,
    #[serde(default)]
    quiz_category: Option<QuizCategory>,
}

/// `question` is left out entirely once the quiz is exhausted.
#[derive(Serialize)]
struct QuizQuestion {
    #[serde(skip_serializing_if = "Option::is_none")]
    question: Option<Question>,
}

async fn play_quiz(
    State(pool): State<SqlitePool>,
    body: Result<Json<QuizRequest>, JsonRejection>,
) -> ApiResponse<QuizQuestion> {
    let Json(request) = body.map_err(ApiError::unprocessable)?;
    let category = request.quiz_category.as_ref();
    let question = next_question(&pool, category, &request.previous_questions).await?;

    // client-supplied ids stay out of the labels so the series count is fixed
    let filter = category.and_then(QuizCategory::filter);
    let scope = if filter.is_some() { "filtered" } else { "all" };
    let outcome = if question.is_some() { "question" } else { "exhausted" };
    QUIZ_CNTR.with_label_values(&[scope, outcome]).inc();
    tracing::debug!(
        "Quiz in category {filter:?} after {} questions: {outcome}",
        request.previous_questions.len()
    );

    Ok(success(QuizQuestion { question }))
}

pub fn quizzes_router() -> Router<AppState> {
    Router::new().route("/quizzes", post(play_quiz))
}
