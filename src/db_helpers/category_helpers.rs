use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{
    errors::RequestError,
    models::{Category, CategoryCount},
    slugify,
};

use super::unique_slug;

pub async fn list_categories_in_db(pool: &SqlitePool) -> Result<Vec<Category>, RequestError> {
    let mut tx = pool.begin().await?;
    let result =
        sqlx::query_as::<Sqlite, Category>("SELECT id, name, slug FROM categories ORDER BY name")
            .fetch_all(&mut tx)
            .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn get_category_by_slug_in_db(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Option<Category>, RequestError> {
    let mut tx = pool.begin().await?;
    let result =
        sqlx::query_as::<Sqlite, Category>("SELECT id, name, slug FROM categories WHERE slug = ?1")
            .bind(slug)
            .fetch_optional(&mut tx)
            .await?;
    tx.commit().await?;
    Ok(result)
}

/// Every category with its live post count, plus the number of posts that
/// have no category. Counted fresh on each call.
pub async fn get_category_counts_in_db(
    pool: &SqlitePool,
) -> Result<(Vec<CategoryCount>, i64), RequestError> {
    let mut tx = pool.begin().await?;
    let categories = sqlx::query_as::<Sqlite, CategoryCount>(
        r#"
        SELECT categories.id   AS id,
               categories.name AS name,
               categories.slug AS slug,
               COUNT(posts.id) AS post_count
        FROM   categories
               LEFT JOIN posts
                      ON posts.category_id = categories.id
        GROUP  BY categories.id
        ORDER  BY categories.name
        "#,
    )
    .fetch_all(&mut tx)
    .await?;
    let (uncategorized,): (i64,) =
        sqlx::query_as("SELECT COUNT(*) FROM posts WHERE category_id IS NULL")
            .fetch_one(&mut tx)
            .await?;
    tx.commit().await?;
    Ok((categories, uncategorized))
}

pub async fn create_category_in_db(pool: &SqlitePool, name: &str) -> Result<Category, RequestError> {
    let mut tx = pool.begin().await?;
    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM categories WHERE name = ?1)")
        .bind(name)
        .fetch_one(&mut tx)
        .await?;
    if exists {
        return Err(RequestError::RunTimeError("A category with that name already exists."));
    }
    let slug = category_slug(&mut tx, name).await?;
    let category = sqlx::query_as::<Sqlite, Category>(
        "INSERT INTO categories (name, slug) VALUES (?1, ?2) RETURNING id, name, slug",
    )
    .bind(name)
    .bind(&slug)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;
    tracing::info!("Created category {} ({})", category.name, category.slug);
    Ok(category)
}

async fn category_slug(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<String, RequestError> {
    let base = match slugify(name) {
        slug if slug.is_empty() || slug == crate::NO_CATEGORY_SLUG => "category".to_owned(),
        slug => slug,
    };
    unique_slug(tx, "categories", &base).await
}
