use std::sync::Arc;

use axum::{
    extract::Path,
    http::{header, StatusCode, Uri},
    response::{Html, IntoResponse, Redirect, Response},
    Extension, Form,
};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::{
    authentication::{
        expired_token_cookie, get_jwt_token, hash_password_argon2, require_owner, require_staff,
        require_staff_owner, require_user, token_cookie, verify_password_argon2, MaybeUser,
    },
    config::Config,
    data_formats::{
        CategoryForm, CommentForm, FieldErrors, ListHeading, LoginForm, PostDetail, PostFilter,
        PostForm, PostView, Sidebar, SignupForm, NO_CATEGORY_SLUG,
    },
    db_helpers::{
        add_comment_to_post_in_db, create_category_in_db, create_post_in_db,
        delete_comment_in_db, delete_post_in_db, get_category_by_slug_in_db,
        get_category_counts_in_db, get_comment_by_id_in_db, get_comments_for_post_in_db,
        get_post_by_id_in_db, get_tag_by_slug_in_db, get_tags_for_post_in_db,
        get_tags_for_posts_in_db, get_user_by_username, insert_user, list_categories_in_db,
        list_posts_in_db, set_staff_in_db, update_comment_in_db, update_post_in_db,
    },
    errors::RequestError,
    models::{Comment, Post},
    pages,
};

type Pool = Extension<Arc<SqlitePool>>;
type HtmlResult = Result<Html<String>, RequestError>;
type ResponseResult = Result<Response, RequestError>;

const LANDING_POST_COUNT: i64 = 3;

// ----------------- Helper Functions -----------------

async fn load_sidebar(pool: &SqlitePool) -> Result<Sidebar, RequestError> {
    let (categories, uncategorized) = get_category_counts_in_db(pool).await?;
    Ok(Sidebar {
        categories,
        uncategorized,
    })
}

async fn with_tags(pool: &SqlitePool, posts: Vec<Post>) -> Result<Vec<PostView>, RequestError> {
    let ids: Vec<i64> = posts.iter().map(|post| post.id).collect();
    let mut tags = get_tags_for_posts_in_db(pool, &ids).await?;
    Ok(posts
        .into_iter()
        .map(|post| {
            let post_tags = tags.remove(&post.id).unwrap_or_default();
            PostView::new(post, post_tags)
        })
        .collect())
}

/// Path ids that do not parse as an integer name no existing row.
fn parse_id(raw: &str, missing: &'static str) -> Result<i64, RequestError> {
    raw.parse().map_err(|_| RequestError::NotFound(missing))
}

async fn find_post(pool: &SqlitePool, id: i64) -> Result<Post, RequestError> {
    get_post_by_id_in_db(pool, id)
        .await?
        .ok_or(RequestError::NotFound("Post not found"))
}

async fn find_comment(pool: &SqlitePool, id: i64) -> Result<Comment, RequestError> {
    get_comment_by_id_in_db(pool, id)
        .await?
        .ok_or(RequestError::NotFound("Comment not found"))
}

async fn render_post_list(
    pool: &SqlitePool,
    user: &MaybeUser,
    heading: ListHeading,
    filter: PostFilter,
) -> HtmlResult {
    let posts = list_posts_in_db(pool, filter).await?;
    let posts = with_tags(pool, posts).await?;
    let sidebar = load_sidebar(pool).await?;
    Ok(Html(pages::post_list_page(
        user.0.as_ref(),
        &sidebar,
        &heading,
        &posts,
    )))
}

async fn render_post_detail(
    pool: &SqlitePool,
    user: &MaybeUser,
    post: Post,
    comment_form: &CommentForm,
    comment_errors: &FieldErrors,
) -> HtmlResult {
    let tags = get_tags_for_post_in_db(pool, post.id).await?;
    let comments = get_comments_for_post_in_db(pool, post.id).await?;
    let sidebar = load_sidebar(pool).await?;
    let detail = PostDetail {
        post: PostView::new(post, tags),
        comments,
    };
    Ok(Html(pages::post_detail_page(
        user.0.as_ref(),
        &sidebar,
        &detail,
        comment_form,
        comment_errors,
    )))
}

fn login_response(user_id: i64, config: &Config) -> ResponseResult {
    let token = get_jwt_token(user_id, &config.jwt_secret).map_err(|e| {
        warn!("Could not issue token: {:#}", e);
        RequestError::ServerError
    })?;
    Ok((
        [(header::SET_COOKIE, token_cookie(&token))],
        Redirect::to("/board/"),
    )
        .into_response())
}

// ----------------- Helper Handlers -----------------
pub async fn alive() -> &'static str {
    "alive"
}

pub async fn not_found(uri: Uri) -> (StatusCode, Html<String>) {
    let message = format!("URL {} provided was not found", uri);
    (
        StatusCode::NOT_FOUND,
        Html(pages::error_page(StatusCode::NOT_FOUND, &message)),
    )
}

// ----------------- Single Page Handlers -----------------
pub async fn landing(Extension(pool): Pool, user: MaybeUser) -> HtmlResult {
    let posts = list_posts_in_db(&pool, PostFilter::recent(LANDING_POST_COUNT)).await?;
    let posts = with_tags(&pool, posts).await?;
    Ok(Html(pages::landing_page(user.0.as_ref(), &posts)))
}

pub async fn about_site(user: MaybeUser) -> Html<String> {
    Html(pages::about_site_page(user.0.as_ref()))
}

// ----------------- Post List Handlers -----------------
pub async fn post_list(Extension(pool): Pool, user: MaybeUser) -> HtmlResult {
    render_post_list(&pool, &user, ListHeading::All, PostFilter::default()).await
}

pub async fn category_posts(
    Extension(pool): Pool,
    user: MaybeUser,
    Path(slug): Path<String>,
) -> HtmlResult {
    let heading = if slug == NO_CATEGORY_SLUG {
        ListHeading::Uncategorized
    } else {
        let category = get_category_by_slug_in_db(&pool, &slug)
            .await?
            .ok_or(RequestError::NotFound("Category not found"))?;
        ListHeading::Category(category)
    };
    render_post_list(&pool, &user, heading, PostFilter::category(&slug)).await
}

pub async fn tag_posts(
    Extension(pool): Pool,
    user: MaybeUser,
    Path(slug): Path<String>,
) -> HtmlResult {
    let tag = get_tag_by_slug_in_db(&pool, &slug)
        .await?
        .ok_or(RequestError::NotFound("Tag not found"))?;
    render_post_list(&pool, &user, ListHeading::Tag(tag), PostFilter::tag(&slug)).await
}

pub async fn search_posts(
    Extension(pool): Pool,
    user: MaybeUser,
    Path(term): Path<String>,
) -> HtmlResult {
    let filter = PostFilter::search(&term);
    render_post_list(&pool, &user, ListHeading::Search(term), filter).await
}

// ----------------- Post Handlers -----------------
pub async fn post_detail(
    Extension(pool): Pool,
    user: MaybeUser,
    Path(id): Path<String>,
) -> HtmlResult {
    let id = parse_id(&id, "Post not found")?;
    let post = find_post(&pool, id).await?;
    render_post_detail(&pool, &user, post, &CommentForm::default(), &FieldErrors::new()).await
}

pub async fn create_post_form(Extension(pool): Pool, MaybeUser(user): MaybeUser) -> HtmlResult {
    let user = require_staff(user)?;
    let categories = list_categories_in_db(&pool).await?;
    Ok(Html(pages::post_form_page(
        Some(&user),
        "Create Post",
        "/board/create_post/",
        &PostForm::default(),
        &categories,
        &FieldErrors::new(),
    )))
}

pub async fn create_post(
    Extension(pool): Pool,
    MaybeUser(user): MaybeUser,
    Form(form): Form<PostForm>,
) -> ResponseResult {
    let user = require_staff(user)?;
    let categories = list_categories_in_db(&pool).await?;
    let input = match form.validate(&categories) {
        Ok(input) => input,
        Err(errors) => {
            return Ok(Html(pages::post_form_page(
                Some(&user),
                "Create Post",
                "/board/create_post/",
                &form,
                &categories,
                &errors,
            ))
            .into_response())
        }
    };
    let post_id = create_post_in_db(&pool, user.id, input).await?;
    Ok(Redirect::to(&format!("/board/{post_id}/")).into_response())
}

pub async fn update_post_form(
    Extension(pool): Pool,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> HtmlResult {
    let id = parse_id(&id, "Post not found")?;
    let post = find_post(&pool, id).await?;
    let user = require_staff_owner(user, post.author_id)?;
    let categories = list_categories_in_db(&pool).await?;
    let tags = get_tags_for_post_in_db(&pool, post.id).await?;
    let view = PostView::new(post, tags);
    let form = PostForm {
        title: view.post.title.clone(),
        content: view.post.content.clone(),
        category: view
            .post
            .category_id
            .map(|id| id.to_string())
            .unwrap_or_default(),
        tags_str: view.tags_str(),
    };
    let action = format!("/board/update_post/{id}/");
    Ok(Html(pages::post_form_page(
        Some(&user),
        "Edit Post",
        &action,
        &form,
        &categories,
        &FieldErrors::new(),
    )))
}

pub async fn update_post(
    Extension(pool): Pool,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
    Form(form): Form<PostForm>,
) -> ResponseResult {
    let id = parse_id(&id, "Post not found")?;
    let post = find_post(&pool, id).await?;
    let user = require_staff_owner(user, post.author_id)?;
    let categories = list_categories_in_db(&pool).await?;
    let input = match form.validate(&categories) {
        Ok(input) => input,
        Err(errors) => {
            let action = format!("/board/update_post/{id}/");
            return Ok(Html(pages::post_form_page(
                Some(&user),
                "Edit Post",
                &action,
                &form,
                &categories,
                &errors,
            ))
            .into_response());
        }
    };
    update_post_in_db(&pool, user.id, id, input).await?;
    Ok(Redirect::to(&format!("/board/{id}/")).into_response())
}

pub async fn delete_post(
    Extension(pool): Pool,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Result<Redirect, RequestError> {
    let id = parse_id(&id, "Post not found")?;
    let post = find_post(&pool, id).await?;
    let user = require_owner(user, post.author_id)?;
    delete_post_in_db(&pool, user.id, id).await?;
    Ok(Redirect::to("/board/"))
}

// ----------------- Comment Handlers -----------------
pub async fn new_comment(
    Extension(pool): Pool,
    maybe_user: MaybeUser,
    Path(post_id): Path<String>,
    Form(form): Form<CommentForm>,
) -> ResponseResult {
    let post_id = parse_id(&post_id, "Post not found")?;
    let user = require_user(maybe_user.0.clone())?;
    let post = find_post(&pool, post_id).await?;
    let content = match form.validate() {
        Ok(content) => content,
        Err(errors) => {
            return Ok(render_post_detail(&pool, &maybe_user, post, &form, &errors)
                .await?
                .into_response())
        }
    };
    let comment_id = add_comment_to_post_in_db(&pool, user.id, post_id, &content).await?;
    Ok(Redirect::to(&format!("/board/{post_id}/#comment-{comment_id}")).into_response())
}

pub async fn update_comment_form(
    Extension(pool): Pool,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> HtmlResult {
    let id = parse_id(&id, "Comment not found")?;
    let comment = find_comment(&pool, id).await?;
    let user = require_owner(user, comment.author_id)?;
    let form = CommentForm {
        content: comment.content.clone(),
    };
    Ok(Html(pages::comment_form_page(
        Some(&user),
        &comment,
        &form,
        &FieldErrors::new(),
    )))
}

pub async fn update_comment(
    Extension(pool): Pool,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
    Form(form): Form<CommentForm>,
) -> ResponseResult {
    let id = parse_id(&id, "Comment not found")?;
    let comment = find_comment(&pool, id).await?;
    let user = require_owner(user, comment.author_id)?;
    let content = match form.validate() {
        Ok(content) => content,
        Err(errors) => {
            return Ok(
                Html(pages::comment_form_page(Some(&user), &comment, &form, &errors))
                    .into_response(),
            )
        }
    };
    update_comment_in_db(&pool, user.id, id, &content).await?;
    Ok(Redirect::to(&format!("/board/{}/#comment-{id}", comment.post_id)).into_response())
}

pub async fn delete_comment(
    Extension(pool): Pool,
    MaybeUser(user): MaybeUser,
    Path(id): Path<String>,
) -> Result<Redirect, RequestError> {
    let id = parse_id(&id, "Comment not found")?;
    let comment = find_comment(&pool, id).await?;
    let user = require_owner(user, comment.author_id)?;
    delete_comment_in_db(&pool, user.id, id).await?;
    Ok(Redirect::to(&format!("/board/{}/", comment.post_id)))
}

// ----------------- Category Handlers -----------------
pub async fn create_category_form(MaybeUser(user): MaybeUser) -> HtmlResult {
    let user = require_staff(user)?;
    Ok(Html(pages::category_form_page(
        Some(&user),
        &CategoryForm::default(),
        &FieldErrors::new(),
    )))
}

pub async fn create_category(
    Extension(pool): Pool,
    MaybeUser(user): MaybeUser,
    Form(form): Form<CategoryForm>,
) -> ResponseResult {
    let user = require_staff(user)?;
    let name = match form.validate() {
        Ok(name) => name,
        Err(errors) => {
            return Ok(Html(pages::category_form_page(Some(&user), &form, &errors)).into_response())
        }
    };
    match create_category_in_db(&pool, &name).await {
        Ok(category) => {
            Ok(Redirect::to(&format!("/board/category/{}/", category.slug)).into_response())
        }
        Err(RequestError::RunTimeError(message)) => {
            let errors = vec![("name", message.to_owned())];
            Ok(Html(pages::category_form_page(Some(&user), &form, &errors)).into_response())
        }
        Err(e) => Err(e),
    }
}

// ----------------- Account Handlers -----------------
pub async fn signup_form() -> Html<String> {
    Html(pages::signup_page(&SignupForm::default(), &FieldErrors::new()))
}

pub async fn signup(
    Extension(pool): Pool,
    Extension(config): Extension<Arc<Config>>,
    Form(form): Form<SignupForm>,
) -> ResponseResult {
    let errors = form.validate();
    if !errors.is_empty() {
        return Ok(Html(pages::signup_page(&form, &errors)).into_response());
    }
    let username = form.username.trim();
    let password = hash_password_argon2(form.password1.clone())
        .await
        .map_err(|e| {
            warn!("Could not hash password: {:#}", e);
            RequestError::ServerError
        })?;
    let is_staff = config.is_staff_username(username);
    let user = match insert_user(&pool, username, &password, is_staff).await {
        Ok(user) => user,
        Err(RequestError::RunTimeError(message)) => {
            let errors = vec![("username", message.to_owned())];
            return Ok(Html(pages::signup_page(&form, &errors)).into_response());
        }
        Err(e) => return Err(e),
    };
    info!("New user {} signed up (staff: {})", user.username, user.is_staff);
    login_response(user.id, &config)
}

pub async fn login_form() -> Html<String> {
    Html(pages::login_page(&LoginForm::default(), &FieldErrors::new()))
}

pub async fn login(
    Extension(pool): Pool,
    Extension(config): Extension<Arc<Config>>,
    Form(form): Form<LoginForm>,
) -> ResponseResult {
    let user = get_user_by_username(&pool, form.username.trim()).await?;
    let verified = match &user {
        Some(user) => verify_password_argon2(form.password.clone(), &user.password)
            .await
            .unwrap_or(false),
        None => false,
    };
    match user {
        Some(user) if verified => {
            info!("User {} logged in", user.username);
            login_response(user.id, &config)
        }
        _ => {
            let errors = vec![(
                "__all__",
                "Please enter a correct username and password.".to_owned(),
            )];
            Ok(Html(pages::login_page(&form, &errors)).into_response())
        }
    }
}

pub async fn logout() -> Response {
    (
        [(header::SET_COOKIE, expired_token_cookie())],
        Redirect::to("/"),
    )
        .into_response()
}

pub async fn grant_staff(
    Extension(pool): Pool,
    MaybeUser(user): MaybeUser,
    Path(username): Path<String>,
) -> Result<Redirect, RequestError> {
    let user = require_staff(user)?;
    set_staff_in_db(&pool, &username).await?;
    info!("{} granted staff to {}", user.username, username);
    Ok(Redirect::to("/board/"))
}
