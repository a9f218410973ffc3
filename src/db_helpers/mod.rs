use sqlx::{Sqlite, Transaction};

use crate::errors::RequestError;

mod category_helpers;
mod comment_helpers;
mod post_helpers;
mod tag_helpers;
mod user_helpers;

pub use category_helpers::*;
pub use comment_helpers::*;
pub use post_helpers::*;
pub use tag_helpers::*;
pub use user_helpers::*;

// ----------------- Helper Functions -----------------

/// `base`, or `base-2`, `base-3`, ... whichever is not yet taken in `table`.
async fn unique_slug(
    tx: &mut Transaction<'_, Sqlite>,
    table: &'static str,
    base: &str,
) -> Result<String, RequestError> {
    let query = format!("SELECT EXISTS (SELECT 1 FROM {table} WHERE slug = ?1)");
    let mut candidate = base.to_owned();
    let mut suffix = 2;
    loop {
        let (taken,): (bool,) = sqlx::query_as(&query)
            .bind(&candidate)
            .fetch_one(&mut *tx)
            .await?;
        if !taken {
            return Ok(candidate);
        }
        candidate = format!("{base}-{suffix}");
        suffix += 1;
    }
}

#[cfg(test)]
mod tests {
    use sqlx::SqlitePool;

    use super::*;
    use crate::data_formats::{PostFilter, PostInput};

    async fn test_pool() -> SqlitePool {
        let path = std::env::temp_dir().join(format!("board-helpers-{}.db", rand::random::<u64>()));
        crate::init_db(&format!("sqlite://{}", path.display()))
            .await
            .unwrap()
    }

    async fn user(pool: &SqlitePool, username: &str) -> i64 {
        insert_user(pool, username, "not-a-real-hash", true)
            .await
            .unwrap()
            .id
    }

    fn input(title: &str, content: &str, category_id: Option<i64>, tags: &str) -> PostInput {
        PostInput {
            title: title.to_owned(),
            content: content.to_owned(),
            category_id,
            tag_names: crate::parse_tag_names(tags),
        }
    }

    fn tag_names(tags: &[crate::models::Tag]) -> Vec<&str> {
        tags.iter().map(|tag| tag.name.as_str()).collect()
    }

    #[tokio::test]
    async fn creating_a_post_creates_missing_tags_once() {
        let pool = test_pool().await;
        let park = user(&pool, "park").await;

        let first = create_post_in_db(&pool, park, input("first", "body", None, "python"))
            .await
            .unwrap();
        let second = create_post_in_db(
            &pool,
            park,
            input("second", "body", None, "new tag; Korean Tag, python"),
        )
        .await
        .unwrap();

        let tags = get_tags_for_post_in_db(&pool, second).await.unwrap();
        assert_eq!(tag_names(&tags), vec!["Korean Tag", "new tag", "python"]);
        let python = get_tag_by_slug_in_db(&pool, "python").await.unwrap().unwrap();
        assert!(tags.contains(&python));
        assert_eq!(
            get_tags_for_post_in_db(&pool, first).await.unwrap(),
            vec![python]
        );
        let korean = get_tag_by_slug_in_db(&pool, "korean-tag").await.unwrap();
        assert_eq!(korean.unwrap().name, "Korean Tag");
    }

    #[tokio::test]
    async fn tag_names_that_differ_in_case_get_distinct_slugs() {
        let pool = test_pool().await;
        let park = user(&pool, "park").await;
        let post = create_post_in_db(&pool, park, input("t", "b", None, "Korean Tag; korean tag"))
            .await
            .unwrap();

        let tags = get_tags_for_post_in_db(&pool, post).await.unwrap();
        assert_eq!(tags.len(), 2);
        let mut slugs: Vec<_> = tags.iter().map(|tag| tag.slug.as_str()).collect();
        slugs.sort();
        assert_eq!(slugs, vec!["korean-tag", "korean-tag-2"]);
    }

    #[tokio::test]
    async fn updating_a_post_replaces_its_tags() {
        let pool = test_pool().await;
        let park = user(&pool, "park").await;
        let post = create_post_in_db(&pool, park, input("t", "b", None, "a, b"))
            .await
            .unwrap();

        update_post_in_db(&pool, park, post, input("t2", "b2", None, "b; c"))
            .await
            .unwrap();

        let tags = get_tags_for_post_in_db(&pool, post).await.unwrap();
        assert_eq!(tag_names(&tags), vec!["b", "c"]);
        assert_eq!(get_post_by_id_in_db(&pool, post).await.unwrap().unwrap().title, "t2");
        // the old tag itself is kept
        assert!(get_tag_by_slug_in_db(&pool, "a").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn only_the_author_can_change_a_post() {
        let pool = test_pool().await;
        let park = user(&pool, "park").await;
        let lee = user(&pool, "lee").await;
        let post = create_post_in_db(&pool, park, input("t", "b", None, ""))
            .await
            .unwrap();

        let result = update_post_in_db(&pool, lee, post, input("x", "y", None, "")).await;
        assert!(matches!(result, Err(RequestError::Forbidden)));
        let result = delete_post_in_db(&pool, lee, post).await;
        assert!(matches!(result, Err(RequestError::Forbidden)));
        assert!(get_post_by_id_in_db(&pool, post).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn deleting_a_post_removes_its_comments() {
        let pool = test_pool().await;
        let park = user(&pool, "park").await;
        let post = create_post_in_db(&pool, park, input("t", "b", None, "a"))
            .await
            .unwrap();
        let comment = add_comment_to_post_in_db(&pool, park, post, "hello")
            .await
            .unwrap();

        delete_post_in_db(&pool, park, post).await.unwrap();

        assert!(get_post_by_id_in_db(&pool, post).await.unwrap().is_none());
        assert!(get_comment_by_id_in_db(&pool, comment).await.unwrap().is_none());
        assert!(get_comments_for_post_in_db(&pool, post).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn comments_are_oldest_first_and_author_owned() {
        let pool = test_pool().await;
        let park = user(&pool, "park").await;
        let lee = user(&pool, "lee").await;
        let post = create_post_in_db(&pool, park, input("t", "b", None, ""))
            .await
            .unwrap();
        let first = add_comment_to_post_in_db(&pool, lee, post, "first").await.unwrap();
        add_comment_to_post_in_db(&pool, park, post, "second").await.unwrap();

        let thread = get_comments_for_post_in_db(&pool, post).await.unwrap();
        let contents: Vec<_> = thread.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["first", "second"]);
        assert_eq!(thread[0].author_username, "lee");

        let result = delete_comment_in_db(&pool, park, first).await;
        assert!(matches!(result, Err(RequestError::Forbidden)));
        update_comment_in_db(&pool, lee, first, "edited").await.unwrap();
        delete_comment_in_db(&pool, lee, first).await.unwrap();

        let post = get_post_by_id_in_db(&pool, post).await.unwrap().unwrap();
        assert_eq!(post.comment_count, 1);
    }

    #[tokio::test]
    async fn comments_need_a_live_post() {
        let pool = test_pool().await;
        let park = user(&pool, "park").await;
        let result = add_comment_to_post_in_db(&pool, park, 42, "hello").await;
        assert!(matches!(result, Err(RequestError::NotFound(_))));
    }

    #[tokio::test]
    async fn filters_and_category_counts() {
        let pool = test_pool().await;
        let park = user(&pool, "park").await;
        let programming = create_category_in_db(&pool, "programming").await.unwrap();
        let music = create_category_in_db(&pool, "Music Life").await.unwrap();
        assert_eq!(music.slug, "music-life");

        create_post_in_db(&pool, park, input("rust", "Ownership", Some(programming.id), "rust"))
            .await
            .unwrap();
        create_post_in_db(&pool, park, input("go", "goroutines", Some(programming.id), ""))
            .await
            .unwrap();
        create_post_in_db(&pool, park, input("diary", "nothing here", None, "rust"))
            .await
            .unwrap();

        let (counts, uncategorized) = get_category_counts_in_db(&pool).await.unwrap();
        let counts: Vec<_> = counts
            .iter()
            .map(|c| (c.name.as_str(), c.post_count))
            .collect();
        assert_eq!(counts, vec![("Music Life", 0), ("programming", 2)]);
        assert_eq!(uncategorized, 1);

        let all = list_posts_in_db(&pool, PostFilter::default()).await.unwrap();
        let titles: Vec<_> = all.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, vec!["diary", "go", "rust"]);

        let by_category = list_posts_in_db(&pool, PostFilter::category("programming"))
            .await
            .unwrap();
        assert_eq!(by_category.len(), 2);
        let none = list_posts_in_db(&pool, PostFilter::category("no_category"))
            .await
            .unwrap();
        assert_eq!(none.len(), 1);
        assert_eq!(none[0].category_name, None);

        let by_tag = list_posts_in_db(&pool, PostFilter::tag("rust")).await.unwrap();
        assert_eq!(by_tag.len(), 2);

        let found = list_posts_in_db(&pool, PostFilter::search("OWNERSHIP"))
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "rust");

        let recent = list_posts_in_db(&pool, PostFilter::recent(2)).await.unwrap();
        assert_eq!(recent.len(), 2);
    }

    #[tokio::test]
    async fn search_folds_non_ascii_case() {
        let pool = test_pool().await;
        let park = user(&pool, "park").await;
        create_post_in_db(&pool, park, input("Über alles", "body", None, ""))
            .await
            .unwrap();
        create_post_in_db(&pool, park, input("menu", "Café au lait", None, ""))
            .await
            .unwrap();
        create_post_in_db(&pool, park, input("other", "nothing", None, ""))
            .await
            .unwrap();

        for term in ["über", "ÜBER"] {
            let found = list_posts_in_db(&pool, PostFilter::search(term)).await.unwrap();
            assert_eq!(found.len(), 1, "{term}");
            assert_eq!(found[0].title, "Über alles");
        }
        let found = list_posts_in_db(&pool, PostFilter::search("CAFÉ")).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "menu");

        let filter = PostFilter {
            limit: Some(1),
            ..PostFilter::search("e")
        };
        let found = list_posts_in_db(&pool, filter).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].title, "other");
    }

    #[tokio::test]
    async fn duplicate_names_are_rejected() {
        let pool = test_pool().await;
        user(&pool, "park").await;
        let result = insert_user(&pool, "park", "hash", false).await;
        assert!(matches!(result, Err(RequestError::RunTimeError(_))));

        create_category_in_db(&pool, "programming").await.unwrap();
        let result = create_category_in_db(&pool, "programming").await;
        assert!(matches!(result, Err(RequestError::RunTimeError(_))));
    }

    #[tokio::test]
    async fn staff_can_be_granted_later() {
        let pool = test_pool().await;
        let id = insert_user(&pool, "lee", "hash", false).await.unwrap().id;
        set_staff_in_db(&pool, "lee").await.unwrap();
        assert!(get_user_by_id(&pool, id).await.unwrap().unwrap().is_staff);
        assert!(matches!(
            set_staff_in_db(&pool, "nobody").await,
            Err(RequestError::NotFound(_))
        ));
    }
}
