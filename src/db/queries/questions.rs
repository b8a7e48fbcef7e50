use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnection, SqliteExecutor};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Question {
    pub id: i64,
    pub question: String,
    pub answer: String,
    pub category: String,
    pub difficulty: i64,
}

#[derive(Debug, Clone)]
pub struct NewQuestion {
    pub question: String,
    pub answer: String,
    pub category: String,
    pub difficulty: i64,
}

pub async fn count_questions<'c>(executor: impl SqliteExecutor<'c>) -> sqlx::Result<i64> {
    sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM questions
        "#,
    )
    .fetch_one(executor)
    .await
}

pub async fn get_all_questions<'c>(executor: impl SqliteExecutor<'c>) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions ORDER BY id
        "#,
    )
    .fetch_all(executor)
    .await
}

pub async fn get_questions_page<'c>(
    executor: impl SqliteExecutor<'c>,
    limit: i64,
    offset: i64,
) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions
        ORDER BY id
        LIMIT ?1 OFFSET ?2
        "#,
    )
    .bind(limit)
    .bind(offset)
    .fetch_all(executor)
    .await
}

pub async fn get_question_by_id<'c>(executor: impl SqliteExecutor<'c>, id: i64) -> sqlx::Result<Question> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .fetch_one(executor)
    .await
}

pub async fn get_questions_for_category<'c>(
    executor: impl SqliteExecutor<'c>,
    category_id: i64,
) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions
        WHERE questions.category = ?1
        ORDER BY id
        "#,
    )
    .bind(category_id.to_string())
    .fetch_all(executor)
    .await
}

/// Case-insensitive substring match on the question text. SQLite's `lower`
/// only folds ASCII letters.
pub async fn search_questions<'c>(
    executor: impl SqliteExecutor<'c>,
    term: &str,
) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions
        WHERE instr(lower(questions.question), lower(?1)) > 0
        ORDER BY id
        "#,
    )
    .bind(term)
    .fetch_all(executor)
    .await
}

/// Questions a quiz may draw from; `None` means every category.
pub async fn get_quiz_candidates<'c>(
    executor: impl SqliteExecutor<'c>,
    category_id: Option<i64>,
) -> sqlx::Result<Vec<Question>> {
    sqlx::query_as::<_, Question>(
        r#"
        SELECT id, question, answer, category, difficulty FROM questions
        WHERE ?1 IS NULL OR questions.category = ?1
        ORDER BY id
        "#,
    )
    .bind(category_id.map(|id| id.to_string()))
    .fetch_all(executor)
    .await
}

pub async fn create_question<'c>(
    executor: impl SqliteExecutor<'c>,
    question: &NewQuestion,
) -> sqlx::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO questions (question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4)
        "#,
    )
    .bind(&question.question)
    .bind(&question.answer)
    .bind(&question.category)
    .bind(question.difficulty)
    .execute(executor)
    .await?
    .last_insert_rowid();

    Ok(id)
}

async fn insert_question<'c>(executor: impl SqliteExecutor<'c>, question: &Question) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO questions (id, question, answer, category, difficulty) VALUES (?1, ?2, ?3, ?4, ?5)
        "#,
    )
    .bind(question.id)
    .bind(&question.question)
    .bind(&question.answer)
    .bind(&question.category)
    .bind(question.difficulty)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn update_question<'c>(executor: impl SqliteExecutor<'c>, question: &Question) -> sqlx::Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE questions SET question=?1, answer=?2, category=?3, difficulty=?4 WHERE questions.id = ?5
        "#,
    )
    .bind(&question.question)
    .bind(&question.answer)
    .bind(&question.category)
    .bind(question.difficulty)
    .bind(question.id)
    .execute(executor)
    .await?;
    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

pub async fn delete_question<'c>(executor: impl SqliteExecutor<'c>, id: i64) -> sqlx::Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM questions WHERE questions.id = ?1
        "#,
    )
    .bind(id)
    .execute(executor)
    .await?;
    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

/// Makes the questions table match `questions` exactly, keeping ids.
pub async fn import_questions(
    conn: &mut SqliteConnection,
    questions: Vec<Question>,
) -> sqlx::Result<()> {
    let existing_ids: HashSet<i64> = get_all_questions(&mut *conn)
        .await?
        .iter()
        .map(|q| q.id)
        .collect();
    let new_ids: HashSet<i64> = questions.iter().map(|q| q.id).collect();
    for id in existing_ids.difference(&new_ids) {
        delete_question(&mut *conn, *id).await?;
    }
    for question in questions {
        if existing_ids.contains(&question.id) {
            update_question(&mut *conn, &question).await?;
        } else {
            insert_question(&mut *conn, &question).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::tests::seeded_pool;

    fn new_question(text: &str, category: &str) -> NewQuestion {
        NewQuestion {
            question: text.to_owned(),
            answer: "answer".to_owned(),
            category: category.to_owned(),
            difficulty: 2,
        }
    }

    #[tokio::test]
    async fn create_assigns_next_id() {
        let pool = seeded_pool().await;
        let before = count_questions(&pool).await.unwrap();
        let id = create_question(&pool, &new_question("Test question", "1"))
            .await
            .unwrap();
        assert_eq!(id, 3);
        assert_eq!(count_questions(&pool).await.unwrap(), before + 1);

        let stored = get_question_by_id(&pool, id).await.unwrap();
        assert_eq!(stored.question, "Test question");
        assert_eq!(stored.category, "1");
        assert_eq!(stored.difficulty, 2);
    }

    #[tokio::test]
    async fn deleted_ids_are_not_reused() {
        let pool = seeded_pool().await;
        delete_question(&pool, 2).await.unwrap();
        let id = create_question(&pool, &new_question("Another", "2"))
            .await
            .unwrap();
        assert_eq!(id, 3);
    }

    #[tokio::test]
    async fn delete_twice_is_row_not_found() {
        let pool = seeded_pool().await;
        delete_question(&pool, 1).await.unwrap();
        assert!(matches!(
            delete_question(&pool, 1).await,
            Err(sqlx::Error::RowNotFound)
        ));
        assert_eq!(count_questions(&pool).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn pages_follow_id_order() {
        let pool = seeded_pool().await;
        for n in 0..11 {
            create_question(&pool, &new_question(&format!("Filler {n}"), "1"))
                .await
                .unwrap();
        }
        let first = get_questions_page(&pool, 10, 0).await.unwrap();
        let second = get_questions_page(&pool, 10, 10).await.unwrap();
        let third = get_questions_page(&pool, 10, 20).await.unwrap();

        assert_eq!(first.len(), 10);
        assert_eq!(first[0].id, 1);
        assert_eq!(second.len(), 3);
        assert_eq!(second.last().map(|q| q.id), Some(13));
        assert!(third.is_empty());
    }

    #[tokio::test]
    async fn search_ignores_case() {
        let pool = seeded_pool().await;
        let found = search_questions(&pool, "hEmAtOlOgY").await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].id, 2);

        let found = search_questions(&pool, "complex text").await.unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn search_treats_wildcards_literally() {
        let pool = seeded_pool().await;
        assert!(search_questions(&pool, "%").await.unwrap().is_empty());
        assert!(search_questions(&pool, "_").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn category_filter_matches_exact_id() {
        let pool = seeded_pool().await;
        create_question(&pool, &new_question("Eleven", "11"))
            .await
            .unwrap();

        let science = get_questions_for_category(&pool, 1).await.unwrap();
        assert_eq!(science.iter().map(|q| q.id).collect::<Vec<_>>(), vec![1]);
        assert!(get_questions_for_category(&pool, 10)
            .await
            .unwrap()
            .is_empty());
    }

    #[tokio::test]
    async fn quiz_candidates_without_category_are_everything() {
        let pool = seeded_pool().await;
        let all = get_quiz_candidates(&pool, None).await.unwrap();
        assert_eq!(all.len(), 2);
        let art = get_quiz_candidates(&pool, Some(2)).await.unwrap();
        assert_eq!(art.iter().map(|q| q.id).collect::<Vec<_>>(), vec![2]);
    }

    #[tokio::test]
    async fn update_missing_question_fails() {
        let pool = seeded_pool().await;
        let mut question = get_question_by_id(&pool, 1).await.unwrap();
        question.answer = "Fleming".to_owned();
        update_question(&pool, &question).await.unwrap();
        assert_eq!(
            get_question_by_id(&pool, 1).await.unwrap().answer,
            "Fleming"
        );

        question.id = 99;
        assert!(matches!(
            update_question(&pool, &question).await,
            Err(sqlx::Error::RowNotFound)
        ));
    }

    #[tokio::test]
    async fn failed_transaction_leaves_rows_untouched() {
        let pool = seeded_pool().await;
        {
            let mut tx = pool.begin().await.unwrap();
            delete_question(&mut *tx, 1).await.unwrap();
            assert!(delete_question(&mut *tx, 99).await.is_err());
        }
        assert_eq!(count_questions(&pool).await.unwrap(), 2);
    }
}
