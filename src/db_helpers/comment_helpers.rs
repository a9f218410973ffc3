use sqlx::{Sqlite, SqlitePool};

use crate::{errors::RequestError, models::Comment};

const COMMENT_QUERY: &str = r#"
            SELECT comments.id         AS "id",
                   comments.post_id    AS "post_id",
                   comments.author_id  AS "author_id",
                   users.username      AS "author_username",
                   comments.content    AS "content",
                   comments.created_at AS "created_at",
                   comments.updated_at AS "updated_at"
            FROM   comments
                   JOIN users
                     ON users.id = comments.author_id
"#;

pub async fn add_comment_to_post_in_db(
    pool: &SqlitePool,
    author_id: i64,
    post_id: i64,
    content: &str,
) -> Result<i64, RequestError> {
    let mut tx = pool.begin().await?;

    let (exists,): (bool,) = sqlx::query_as("SELECT EXISTS (SELECT 1 FROM posts WHERE id = ?1)")
        .bind(post_id)
        .fetch_one(&mut tx)
        .await?;
    if !exists {
        return Err(RequestError::NotFound("Post not found"));
    }

    let (id,): (i64,) = sqlx::query_as(
        r#"
        INSERT INTO comments (post_id, author_id, content)
        VALUES (?1, ?2, ?3)
        RETURNING id
        "#,
    )
    .bind(post_id)
    .bind(author_id)
    .bind(content)
    .fetch_one(&mut tx)
    .await?;
    tx.commit().await?;

    Ok(id)
}

pub async fn get_comment_by_id_in_db(
    pool: &SqlitePool,
    id: i64,
) -> Result<Option<Comment>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!("{COMMENT_QUERY} WHERE comments.id = ?1");
    let result = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(id)
        .fetch_optional(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

/// The post's thread, oldest comment first.
pub async fn get_comments_for_post_in_db(
    pool: &SqlitePool,
    post_id: i64,
) -> Result<Vec<Comment>, RequestError> {
    let mut tx = pool.begin().await?;
    let query = format!("{COMMENT_QUERY} WHERE comments.post_id = ?1 ORDER BY comments.id");
    let result = sqlx::query_as::<Sqlite, Comment>(&query)
        .bind(post_id)
        .fetch_all(&mut tx)
        .await?;
    tx.commit().await?;
    Ok(result)
}

pub async fn update_comment_in_db(
    pool: &SqlitePool,
    author_id: i64,
    comment_id: i64,
    content: &str,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query(
        r#"
        UPDATE comments
        SET    content = ?1,
               updated_at = CURRENT_TIMESTAMP
        WHERE  id = ?2
               AND author_id = ?3
        "#,
    )
    .bind(content)
    .bind(comment_id)
    .bind(author_id)
    .execute(&mut tx)
    .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::Forbidden);
    }
    tx.commit().await?;
    Ok(())
}

pub async fn delete_comment_in_db(
    pool: &SqlitePool,
    author_id: i64,
    comment_id: i64,
) -> Result<(), RequestError> {
    let mut tx = pool.begin().await?;
    let result = sqlx::query("DELETE FROM comments WHERE id = ?1 AND author_id = ?2")
        .bind(comment_id)
        .bind(author_id)
        .execute(&mut tx)
        .await?;
    if result.rows_affected() == 0 {
        return Err(RequestError::Forbidden);
    }
    tx.commit().await?;
    Ok(())
}
