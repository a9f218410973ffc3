use std::collections::HashMap;

use sqlx::{Sqlite, SqlitePool, Transaction};

use crate::{
    errors::RequestError,
    models::{PostTag, Tag},
    placeholders, slugify,
};

use super::unique_slug;

pub async fn get_tag_by_slug_in_db(
    pool: &SqlitePool,
    slug: &str,
) -> Result<Option<Tag>, RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query_as::<Sqlite, Tag>("SELECT id, name, slug FROM tags WHERE slug = ?1")
        .bind(slug)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

/// Tags of each listed post, keyed by post id. Posts without tags are absent.
pub async fn get_tags_for_posts_in_db(
    pool: &SqlitePool,
    post_ids: &[i64],
) -> Result<HashMap<i64, Vec<Tag>>, RequestError> {
    let mut tags: HashMap<i64, Vec<Tag>> = HashMap::new();
    if post_ids.is_empty() {
        return Ok(tags);
    }
    let mut tx = pool.begin().await?;
    let query = format!(
        r#"
        SELECT post_tags.post_id AS post_id,
               tags.id           AS id,
               tags.name         AS name,
               tags.slug         AS slug
        FROM   post_tags
               JOIN tags
                 ON tags.id = post_tags.tag_id
        WHERE  post_tags.post_id IN ({})
        ORDER  BY tags.name
        "#,
        placeholders(post_ids.len())
    );
    let mut rows = sqlx::query_as::<Sqlite, PostTag>(&query);
    for id in post_ids {
        rows = rows.bind(*id);
    }
    for row in rows.fetch_all(&mut tx).await? {
        tags.entry(row.post_id).or_default().push(row.into());
    }
    tx.commit().await?;
    Ok(tags)
}

pub async fn get_tags_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<Tag>, RequestError> {
    Ok(get_tags_for_posts_in_db(pool, &[post_id])
        .await?
        .remove(&post_id)
        .unwrap_or_default())
}

/// Replaces the post's tag set with `names`. Names are matched exactly, so
/// `Korean Tag` and `korean tag` are different tags; unknown names are created.
pub(super) async fn set_post_tags(
    tx: &mut Transaction<'_, Sqlite>,
    post_id: i64,
    names: &[String],
) -> Result<(), RequestError> {
    sqlx::query("DELETE FROM post_tags WHERE post_id = ?1")
        .bind(post_id)
        .execute(&mut *tx)
        .await?;
    for name in names {
        let tag_id = find_or_create_tag(tx, name).await?;
        sqlx::query("INSERT OR IGNORE INTO post_tags (post_id, tag_id) VALUES (?1, ?2)")
            .bind(post_id)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
    }
    Ok(())
}

async fn find_or_create_tag(
    tx: &mut Transaction<'_, Sqlite>,
    name: &str,
) -> Result<i64, RequestError> {
    let existing: Option<(i64,)> = sqlx::query_as("SELECT id FROM tags WHERE name = ?1")
        .bind(name)
        .fetch_optional(&mut *tx)
        .await?;
    if let Some((id,)) = existing {
        return Ok(id);
    }
    let base = match slugify(name) {
        slug if slug.is_empty() => "tag".to_owned(),
        slug => slug,
    };
    let slug = unique_slug(tx, "tags", &base).await?;
    let (id,): (i64,) = sqlx::query_as("INSERT INTO tags (name, slug) VALUES (?1, ?2) RETURNING id")
        .bind(name)
        .bind(&slug)
        .fetch_one(&mut *tx)
        .await?;
    tracing::debug!("Created tag {} ({})", name, slug);
    Ok(id)
}
