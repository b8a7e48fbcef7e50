use std::collections::{BTreeMap, HashSet};

use serde::{Deserialize, Serialize};
use sqlx::sqlite::{SqliteConnection, SqliteExecutor};
use sqlx::FromRow;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Category {
    pub id: i64,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: String,
}

pub async fn get_all_categories<'c>(executor: impl SqliteExecutor<'c>) -> sqlx::Result<Vec<Category>> {
    sqlx::query_as::<_, Category>(
        r#"
        SELECT id, type FROM categories ORDER BY id
        "#,
    )
    .fetch_all(executor)
    .await
}

/// Categories keyed by id, the shape every listing endpoint returns.
pub async fn get_categories_map<'c>(
    executor: impl SqliteExecutor<'c>,
) -> sqlx::Result<BTreeMap<i64, String>> {
    let categories = get_all_categories(executor).await?;
    Ok(categories.into_iter().map(|c| (c.id, c.kind)).collect())
}

pub async fn create_category<'c>(executor: impl SqliteExecutor<'c>, kind: &str) -> sqlx::Result<i64> {
    let id = sqlx::query(
        r#"
        INSERT INTO categories (type) VALUES (?1)
        "#,
    )
    .bind(kind)
    .execute(executor)
    .await?
    .last_insert_rowid();

    Ok(id)
}

async fn insert_category<'c>(executor: impl SqliteExecutor<'c>, category: &Category) -> sqlx::Result<()> {
    sqlx::query(
        r#"
        INSERT INTO categories (id, type) VALUES (?1, ?2)
        "#,
    )
    .bind(category.id)
    .bind(&category.kind)
    .execute(executor)
    .await?;
    Ok(())
}

pub async fn update_category<'c>(executor: impl SqliteExecutor<'c>, category: &Category) -> sqlx::Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE categories SET type=?1 WHERE categories.id = ?2
        "#,
    )
    .bind(&category.kind)
    .bind(category.id)
    .execute(executor)
    .await?;
    if result.rows_affected() == 0 {
        return Err(sqlx::Error::RowNotFound);
    }
    Ok(())
}

pub async fn delete_category<'c>(executor: impl SqliteExecutor<'c>, id: i64) -> sqlx::Result<()> {
    let result = sqlx::query(
        r#"
        DELETE FROM categories WHERE categories.id = ?1
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

/// Makes the categories table match `categories` exactly, keeping ids.
pub async fn import_categories(
    conn: &mut SqliteConnection,
    categories: Vec<Category>,
) -> sqlx::Result<()> {
    let existing_ids: HashSet<i64> = get_all_categories(&mut *conn)
        .await?
        .iter()
        .map(|c| c.id)
        .collect();
    let new_ids: HashSet<i64> = categories.iter().map(|c| c.id).collect();
    for id in existing_ids.difference(&new_ids) {
        delete_category(&mut *conn, *id).await?;
    }
    for category in categories {
        if existing_ids.contains(&category.id) {
            update_category(&mut *conn, &category).await?;
        } else {
            insert_category(&mut *conn, &category).await?;
        }
    }
    Ok(())
}
