use std::collections::BTreeMap;

use axum::{
    extract::{rejection::PathRejection, Path, State},
    routing::get,
    Router,
};
use serde::Serialize;
use sqlx::SqlitePool;

use crate::{
    db::{
        queries::{categories::get_categories_map, questions::get_questions_for_category},
        Question,
    },
    server::app::AppState,
};

use super::{id_from_path, success, ApiResponse};

/// Reported as `current_category` when a category has nothing to list.
const NO_CATEGORY: i64 = 0;

#[derive(Serialize)]
struct CategoriesBody {
    categories: BTreeMap<i64, String>,
}

#[derive(Serialize)]
struct CategoryQuestions {
    questions: Vec<Question>,
    total_questions: usize,
    current_category: i64,
}

async fn get_categories(State(pool): State<SqlitePool>) -> ApiResponse<CategoriesBody> {
    let categories = get_categories_map(&pool).await?;
    Ok(success(CategoriesBody { categories }))
}

async fn questions_for_category(
    State(pool): State<SqlitePool>,
    path: Result<Path<i64>, PathRejection>,
) -> ApiResponse<CategoryQuestions> {
    let id = id_from_path(path)?;
    let questions = get_questions_for_category(&pool, id).await?;
    let current_category = if questions.is_empty() { NO_CATEGORY } else { id };
    Ok(success(CategoryQuestions {
        total_questions: questions.len(),
        questions,
        current_category,
    }))
}

pub fn category_router() -> Router<AppState> {
    Router::new()
        .route("/categories", get(get_categories))
        .route("/categories/{id}/questions", get(questions_for_category))
}
