use chrono::NaiveDateTime;

use crate::authentication::AuthUser;
use crate::data_formats::{
    CategoryForm, CommentForm, FieldErrors, ListHeading, PostDetail, PostForm, PostView, Sidebar,
    NO_CATEGORY_SLUG,
};
use crate::excerpt;
use crate::models::{Category, Comment, Post, Tag};

use super::{escape, field_error, layout, markdown, paragraphs, Layout};

const EXCERPT_CHARS: usize = 100;

fn format_time(time: &NaiveDateTime) -> String {
    time.format("%Y-%m-%d %H:%M").to_string()
}

pub fn category_badge(post: &Post) -> String {
    match (&post.category_name, &post.category_slug) {
        (Some(name), Some(slug)) => format!(
            r#"<a class="badge category" href="/board/category/{}/">{}</a>"#,
            escape(slug),
            escape(name)
        ),
        _ => format!(
            r#"<a class="badge category" href="/board/category/{NO_CATEGORY_SLUG}/">uncategorized</a>"#
        ),
    }
}

pub fn tag_links(tags: &[Tag]) -> String {
    tags.iter()
        .map(|tag| {
            format!(
                r#"<a class="badge tag" href="/board/tag/{}/">#{}</a>"#,
                escape(&tag.slug),
                escape(&tag.name)
            )
        })
        .collect::<Vec<_>>()
        .join(" ")
}

pub fn post_card(view: &PostView) -> String {
    let post = &view.post;
    format!(
        r#"<div class="card" id="post-{id}">
<h2 class="card-title"><a href="{url}">{title}</a></h2>
<p class="category">{category}</p>
<p class="tags">{tags}</p>
<p class="card-text">{excerpt}</p>
<p class="card-footer">Posted on {created} by <span class="author">{author}</span> &middot; <span class="comment-count">{comments} comments</span></p>
</div>"#,
        id = post.id,
        url = view.url(),
        title = escape(&post.title),
        category = category_badge(post),
        tags = tag_links(&view.tags),
        excerpt = escape(&excerpt(&post.content, EXCERPT_CHARS)),
        created = format_time(&post.created_at),
        author = escape(&post.author_username),
        comments = post.comment_count,
    )
}

pub fn post_list_page(
    user: Option<&AuthUser>,
    sidebar: &Sidebar,
    heading: &ListHeading,
    posts: &[PostView],
) -> String {
    let heading = heading.title(posts.len());
    let mut main = String::new();
    if user.map(|user| user.is_staff).unwrap_or(false) {
        main.push_str(
            r#"<a class="btn" id="new-post" href="/board/create_post/">New Post</a>
<a class="btn" id="new-category" href="/board/create_category/">New Category</a>
"#,
        );
    }
    main.push_str(&format!("<h1>{}</h1>\n", escape(&heading)));
    if posts.is_empty() {
        main.push_str(r#"<p class="empty">No posts yet.</p>"#);
    } else {
        for view in posts {
            main.push_str(&post_card(view));
            main.push('\n');
        }
    }
    layout(Layout::new("Board", user).with_sidebar(sidebar), &main)
}

fn render_comment(comment: &Comment, user: Option<&AuthUser>) -> String {
    let controls = match user {
        Some(user) if user.id == comment.author_id => format!(
            r#"<a class="btn" id="comment-{id}-update-btn" href="/board/update_comment/{id}/">edit</a> <a class="btn" id="comment-{id}-delete-btn" href="/board/delete_comment/{id}/">delete</a>"#,
            id = comment.id
        ),
        _ => String::new(),
    };
    let edited = if comment.updated_at > comment.created_at {
        format!(" (updated {})", format_time(&comment.updated_at))
    } else {
        String::new()
    };
    format!(
        r#"<div class="comment" id="comment-{id}">
<h5><span class="author">{author}</span> <small>{created}{edited}</small></h5>
<p>{content}</p>
{controls}
</div>"#,
        id = comment.id,
        author = escape(&comment.author_username),
        created = format_time(&comment.created_at),
        edited = edited,
        content = paragraphs(&comment.content),
        controls = controls,
    )
}

fn new_comment_form(post_id: i64, form: &CommentForm, errors: &FieldErrors) -> String {
    format!(
        r#"<form id="comment-form" method="post" action="/board/{post_id}/new_comment/">
<textarea name="content" rows="3">{content}</textarea>
{error}
<button type="submit">Submit</button>
</form>"#,
        content = escape(&form.content),
        error = field_error(errors, "content"),
    )
}

pub fn post_detail_page(
    user: Option<&AuthUser>,
    sidebar: &Sidebar,
    detail: &PostDetail,
    comment_form: &CommentForm,
    comment_errors: &FieldErrors,
) -> String {
    let post = &detail.post.post;
    let owner_controls = match user {
        Some(user) if user.id == post.author_id => format!(
            r#"<div id="post-controls"><a class="btn" id="post-update-btn" href="/board/update_post/{id}/">Edit Post</a>
<form method="post" action="/board/delete_post/{id}/"><button type="submit" id="post-delete-btn">Delete Post</button></form></div>"#,
            id = post.id
        ),
        _ => String::new(),
    };
    let comment_box = if user.is_some() {
        new_comment_form(post.id, comment_form, comment_errors)
    } else {
        r#"<a class="btn" href="/accounts/login/">Log in and leave a comment</a>"#.to_owned()
    };
    let thread: String = detail
        .comments
        .iter()
        .map(|comment| render_comment(comment, user))
        .collect::<Vec<_>>()
        .join("\n");
    let main = format!(
        r#"<div id="post-area">
<p class="category">{category}</p>
<h1>{title}</h1>
<h5 class="author">by {author}</h5>
<p class="date">Posted on {created} &middot; updated {updated}</p>
{owner_controls}
<div class="content">{content}</div>
<p class="tags">{tags}</p>
</div>
<div id="comment-area">
<h3>Comments (<span class="comment-count">{count}</span>)</h3>
{comment_box}
{thread}
</div>"#,
        category = category_badge(post),
        title = escape(&post.title),
        author = escape(&post.author_username),
        created = format_time(&post.created_at),
        updated = format_time(&post.updated_at),
        owner_controls = owner_controls,
        content = markdown(&post.content),
        tags = tag_links(&detail.post.tags),
        count = detail.comments.len(),
        comment_box = comment_box,
        thread = thread,
    );
    let title = format!("{} - Board", post.title);
    layout(Layout::new(&title, user).with_sidebar(sidebar), &main)
}

fn category_options(categories: &[Category], selected: &str) -> String {
    let mut options = String::from(r#"<option value="">---------</option>"#);
    for category in categories {
        let id = category.id.to_string();
        let selected = if id == selected.trim() { " selected" } else { "" };
        options.push_str(&format!(
            r#"<option value="{id}"{selected}>{}</option>"#,
            escape(&category.name)
        ));
    }
    options
}

/// Create and edit share this form; `action` is where it posts back to.
pub fn post_form_page(
    user: Option<&AuthUser>,
    heading: &str,
    action: &str,
    form: &PostForm,
    categories: &[Category],
    errors: &FieldErrors,
) -> String {
    let main = format!(
        r#"<h1>{heading}</h1>
<form id="post-form" method="post" action="{action}">
<label for="id_title">Title</label>
<input type="text" id="id_title" name="title" value="{title}">
{title_error}
<label for="id_content">Content</label>
<textarea id="id_content" name="content" rows="10">{content}</textarea>
{content_error}
<label for="id_category">Category</label>
<select id="id_category" name="category">{options}</select>
{category_error}
<label for="id_tags_str">Tags</label>
<input type="text" id="id_tags_str" name="tags_str" value="{tags}" placeholder="separate tags with ; or ,">
<button type="submit">Submit</button>
</form>"#,
        heading = escape(heading),
        action = escape(action),
        title = escape(&form.title),
        title_error = field_error(errors, "title"),
        content = escape(&form.content),
        content_error = field_error(errors, "content"),
        options = category_options(categories, &form.category),
        category_error = field_error(errors, "category"),
        tags = escape(&form.tags_str),
    );
    let title = format!("{heading} - Board");
    layout(Layout::new(&title, user), &main)
}

pub fn comment_form_page(
    user: Option<&AuthUser>,
    comment: &Comment,
    form: &CommentForm,
    errors: &FieldErrors,
) -> String {
    let main = format!(
        r#"<h1>Edit Comment</h1>
<p><a href="/board/{post_id}/">Back to post</a></p>
<form id="comment-form" method="post" action="/board/update_comment/{id}/">
<textarea name="content" rows="3">{content}</textarea>
{error}
<button type="submit">Submit</button>
</form>"#,
        post_id = comment.post_id,
        id = comment.id,
        content = escape(&form.content),
        error = field_error(errors, "content"),
    );
    layout(Layout::new("Edit Comment - Board", user), &main)
}

pub fn category_form_page(
    user: Option<&AuthUser>,
    form: &CategoryForm,
    errors: &FieldErrors,
) -> String {
    let main = format!(
        r#"<h1>New Category</h1>
<form id="category-form" method="post" action="/board/create_category/">
<label for="id_name">Name</label>
<input type="text" id="id_name" name="name" value="{name}">
{error}
<button type="submit">Submit</button>
</form>"#,
        name = escape(&form.name),
        error = field_error(errors, "name"),
    );
    layout(Layout::new("New Category - Board", user), &main)
}
