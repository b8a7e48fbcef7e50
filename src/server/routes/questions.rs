use std::collections::BTreeMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    routing::{patch, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_option_number_from_string;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories::get_categories_map, questions},
        NewQuestion, Question,
    },
    server::{
        app::AppState,
        deserializers::{deserialize_page, first_page},
        error::ApiError,
    },
    telemetry::QUESTION_MUTATIONS_CNTR,
};

use super::{id_from_path, success, ApiResponse};

pub const QUESTIONS_PER_PAGE: i64 = 10;

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default = "first_page", deserialize_with = "deserialize_page")]
    page: i64,
}

/// Body of both create and update. Every field is optional here so that a
/// `null` or a missing field is reported as 422 rather than a parse error.
#[derive(Deserialize)]
struct QuestionBody {
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    category: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_option_number_from_string")]
    difficulty: Option<i64>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SearchBody {
    search_term: String,
}

#[derive(Serialize)]
struct QuestionsPage {
    questions: Vec<Question>,
    total_questions: i64,
    categories: BTreeMap<i64, String>,
    current_category: Option<i64>,
}

#[derive(Serialize)]
struct SearchResults {
    questions: Vec<Question>,
    total_questions: usize,
}

#[derive(Serialize)]
struct Created {
    message: &'static str,
    created: i64,
}

#[derive(Serialize)]
struct Updated {
    message: &'static str,
    question: Question,
}

#[derive(Serialize)]
struct Deleted {
    message: &'static str,
    deleted: i64,
}

fn non_empty(field: &'static str, value: String) -> Result<String, ApiError> {
    if value.trim().is_empty() {
        return Err(ApiError::unprocessable(format!("{field} is empty")));
    }
    Ok(value)
}

impl QuestionBody {
    fn into_new_question(self) -> Result<NewQuestion, ApiError> {
        let (Some(question), Some(answer), Some(category), Some(difficulty)) =
            (self.question, self.answer, self.category, self.difficulty)
        else {
            return Err(ApiError::unprocessable("question fields are missing"));
        };
        Ok(NewQuestion {
            question: non_empty("question", question)?,
            answer: non_empty("answer", answer)?,
            category: category.to_string(),
            difficulty,
        })
    }

    fn apply_to(self, mut stored: Question) -> Result<Question, ApiError> {
        if let Some(question) = self.question {
            stored.question = non_empty("question", question)?;
        }
        if let Some(answer) = self.answer {
            stored.answer = non_empty("answer", answer)?;
        }
        if let Some(category) = self.category {
            stored.category = category.to_string();
        }
        if let Some(difficulty) = self.difficulty {
            stored.difficulty = difficulty;
        }
        Ok(stored)
    }
}

async fn list_questions(
    State(pool): State<SqlitePool>,
    Query(PageQuery { page }): Query<PageQuery>,
) -> ApiResponse<QuestionsPage> {
    let offset = (page - 1).saturating_mul(QUESTIONS_PER_PAGE);
    let mut tx = pool.begin().await?;
    let questions = questions::get_questions_page(&mut *tx, QUESTIONS_PER_PAGE, offset).await?;
    let total_questions = questions::count_questions(&mut *tx).await?;
    let categories = get_categories_map(&mut *tx).await?;
    tx.commit().await?;

    Ok(success(QuestionsPage {
        questions,
        total_questions,
        categories,
        current_category: None,
    }))
}

async fn create_question(
    State(pool): State<SqlitePool>,
    body: Result<Json<QuestionBody>, JsonRejection>,
) -> ApiResponse<Created> {
    let Json(body) = body.map_err(ApiError::unprocessable)?;
    let new_question = body.into_new_question()?;

    let mut tx = pool.begin().await.map_err(ApiError::unprocessable)?;
    let id = questions::create_question(&mut *tx, &new_question)
        .await
        .map_err(ApiError::unprocessable)?;
    tx.commit().await.map_err(ApiError::unprocessable)?;

    QUESTION_MUTATIONS_CNTR.with_label_values(&["create"]).inc();
    tracing::info!("Question {id} created");
    Ok(success(Created {
        message: "Question created successfully",
        created: id,
    }))
}

async fn update_question(
    State(pool): State<SqlitePool>,
    path: Result<Path<i64>, PathRejection>,
    body: Result<Json<QuestionBody>, JsonRejection>,
) -> ApiResponse<Updated> {
    let id = id_from_path(path)?;
    let Json(body) = body.map_err(ApiError::unprocessable)?;

    let mut tx = pool.begin().await.map_err(ApiError::unprocessable)?;
    let stored = questions::get_question_by_id(&mut *tx, id)
        .await
        .map_err(ApiError::unprocessable)?;
    let question = body.apply_to(stored)?;
    questions::update_question(&mut *tx, &question)
        .await
        .map_err(ApiError::unprocessable)?;
    tx.commit().await.map_err(ApiError::unprocessable)?;

    QUESTION_MUTATIONS_CNTR.with_label_values(&["update"]).inc();
    tracing::info!("Question {id} updated");
    Ok(success(Updated {
        message: "Question updated successfully",
        question,
    }))
}

async fn delete_question(
    State(pool): State<SqlitePool>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResponse<Deleted> {
    let id = id_from_path(path)?;

    let mut tx = pool.begin().await.map_err(ApiError::unprocessable)?;
    questions::delete_question(&mut *tx, id)
        .await
        .map_err(ApiError::unprocessable)?;
    tx.commit().await.map_err(ApiError::unprocessable)?;

    QUESTION_MUTATIONS_CNTR.with_label_values(&["delete"]).inc();
    tracing::info!("Question {id} deleted");
    Ok(success(Deleted {
        message: "Question deleted successfully",
        deleted: id,
    }))
}

async fn search_questions(
    State(pool): State<SqlitePool>,
    body: Result<Json<SearchBody>, JsonRejection>,
) -> ApiResponse<SearchResults> {
    let Json(SearchBody { search_term }) = body.map_err(ApiError::unprocessable)?;
    let questions = questions::search_questions(&pool, &search_term).await?;
    Ok(success(SearchResults {
        total_questions: questions.len(),
        questions,
    }))
}

pub fn questions_router() -> Router<AppState> {
    Router::new()
        .route("/questions", post(create_question).get(list_questions))
        .route("/questions/search", post(search_questions))
        .route(
            "/questions/{id}",
            patch(update_question).delete(delete_question),
        )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(json: &str) -> QuestionBody {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn category_accepts_numbers_and_numeric_strings() {
        let from_number = body(
            r#"{"question": "q", "answer": "a", "category": 3, "difficulty": 1}"#,
        )
        .into_new_question()
        .unwrap();
        let from_string = body(
            r#"{"question": "q", "answer": "a", "category": "3", "difficulty": "1"}"#,
        )
        .into_new_question()
        .unwrap();
        assert_eq!(from_number.category, "3");
        assert_eq!(from_string.category, "3");
        assert_eq!(from_string.difficulty, 1);
    }

    #[test]
    fn null_or_missing_fields_are_rejected() {
        assert!(body(r#"{"question": "q", "answer": null, "category": 1, "difficulty": 1}"#)
            .into_new_question()
            .is_err());
        assert!(body(r#"{"question": "q", "answer": "a", "category": 1}"#)
            .into_new_question()
            .is_err());
        assert!(body(r#"{"question": "  ", "answer": "a", "category": 1, "difficulty": 1}"#)
            .into_new_question()
            .is_err());
    }

    #[test]
    fn update_keeps_fields_that_are_not_sent() {
        let stored = Question {
            id: 4,
            question: "q".to_owned(),
            answer: "a".to_owned(),
            category: "1".to_owned(),
            difficulty: 2,
        };
        let updated = body(r#"{"difficulty": 5}"#).apply_to(stored).unwrap();
        assert_eq!(updated.question, "q");
        assert_eq!(updated.category, "1");
        assert_eq!(updated.difficulty, 5);
    }
}
