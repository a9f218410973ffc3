use sqlx::{Sqlite, SqlitePool};

use crate::data_formats::{PostFilter, PostInput};
use crate::errors::RequestError;
use crate::models::Post;

use super::tag_helpers::set_post_tags;

const POST_COLUMNS: &str = r#"
            SELECT posts.id                                 AS "id",
                   posts.title                              AS "title",
                   posts.content                            AS "content",
                   posts.category_id                        AS "category_id",
                   categories.name                          AS "category_name",
                   categories.slug                          AS "category_slug",
                   posts.author_id                          AS "author_id",
                   users.username                           AS "author_username",
                   (SELECT Count(comments.id)
                    FROM   comments
                    WHERE  comments.post_id = posts.id)     AS "comment_count",
                   posts.created_at                         AS "created_at",
                   posts.updated_at                         AS "updated_at"
            FROM   posts
                   JOIN users
                     ON users.id = posts.author_id
                   LEFT JOIN categories
                          ON categories.id = posts.category_id
"#;

const POST_FILTER: &str = r#"
            WHERE  ( categories.slug = ?1
                      OR ?1 IS NULL )
                   AND ( ?2 = 0
                          OR posts.category_id IS NULL )
                   AND ( ?3 IS NULL
                          OR EXISTS (SELECT 1
                                     FROM   post_tags
                                            JOIN tags
                                              ON tags.id = post_tags.tag_id
                                     WHERE  post_tags.post_id = posts.id
                                            AND tags.slug = ?3) )
            ORDER  BY posts.id DESC
            LIMIT  ?4
"#;

/// Posts matching every set field of `filter`, newest first.
pub async fn list_posts_in_db(
    pool: &SqlitePool,
    PostFilter {
        category,
        uncategorized,
        tag,
        search,
        limit,
    }: PostFilter,
) -> Result<Vec<Post>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!("{POST_COLUMNS}{POST_FILTER}");
    // SQLite's lower() only folds ASCII, so the search term is matched here
    let sql_limit = match search {
        Some(_) => None,
        None => limit,
    };
    let mut posts = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(category)
        .bind(uncategorized)
        .bind(tag)
        // a negative LIMIT means no limit in SQLite
        .bind(sql_limit.unwrap_or(-1))
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    if let Some(term) = search {
        let needle = term.to_lowercase();
        posts.retain(|post| post_matches(post, &needle));
        if let Some(limit) = limit.and_then(|limit| usize::try_from(limit).ok()) {
            posts.truncate(limit);
        }
    }
    Ok(posts)
}

/// `needle` must already be lowercased.
fn post_matches(post: &Post, needle: &str) -> bool {
    post.title.to_lowercase().contains(needle) || post.content.to_lowercase().contains(needle)
}

pub async fn get_post_by_id_in_db(pool: &SqlitePool, id: i64) -> Result<Option<Post>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!("{POST_COLUMNS} WHERE posts.id = ?1");
    let result = sqlx::query_as::<Sqlite, Post>(&query)
        .bind(id)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn create_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    PostInput {
        title,
        content,
        category_id,
        tag_names,
    }: PostInput,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;
    let (post_id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO posts (title, content, category_id, author_id)
        VALUES (?1, ?2, ?3, ?4)
        RETURNING id
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(category_id)
    .bind(author_id)
    .fetch_one(&mut tx)
    .await?;

    set_post_tags(&mut tx, post_id, &tag_names).await?;
    tx.commit().await?;
    tracing::info!("Post {} created by user {}", post_id, author_id);
    Ok(post_id)
}

/// Overwrites the post's fields and replaces its whole tag set. Only the
/// author's own post is touched; anything else is `Forbidden`.
pub async fn update_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    PostInput {
        title,
        content,
        category_id,
        tag_names,
    }: PostInput,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        UPDATE posts
        SET    title = ?1,
               content = ?2,
               category_id = ?3,
               updated_at = CURRENT_TIMESTAMP
        WHERE  id = ?4
               AND author_id = ?5
        "#,
    )
    .bind(title)
    .bind(content)
    .bind(category_id)
    .bind(post_id)
    .bind(author_id)
    .execute(&mut tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::Forbidden);
    }

    set_post_tags(&mut tx, post_id, &tag_names).await?;
    tx.commit().await?;
    tracing::info!("Post {} updated by user {}", post_id, author_id);
    Ok(())
}

/// Deletes the post; its comments and tag links go with it.
pub async fn delete_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM posts WHERE id = ?1 AND author_id = ?2")
        .bind(post_id)
        .bind(author_id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::Forbidden);
    }
    tx.commit().await?;
    tracing::info!("Post {} deleted by user {}", post_id, author_id);
    Ok(())
}
