mod categories;
mod questions;
mod quizzes;

pub use categories::category_router;
pub use questions::questions_router;
pub use quizzes::quizzes_router;

use axum::extract::{rejection::PathRejection, Path};
use axum::Json;
use serde::Serialize;

use super::error::ApiError;

pub type ApiResponse<T> = Result<Json<Success<T>>, ApiError>;

/// Every successful payload carries `"success": true` next to its own fields.
#[derive(Serialize)]
pub struct Success<T> {
    success: bool,
    #[serde(flatten)]
    body: T,
}

pub fn success<T: Serialize>(body: T) -> Json<Success<T>> {
    Json(Success {
        success: true,
        body,
    })
}

// ids that are not integers do not match any route
fn id_from_path(path: Result<Path<i64>, PathRejection>) -> Result<i64, ApiError> {
    path.map(|Path(id)| id).map_err(|_| ApiError::NotFound)
}
