//! Server rendered HTML. Every page goes through [`layout`]; user supplied
//! text must pass through [`escape`] before it is interpolated.

use axum::http::StatusCode;
use pulldown_cmark::{html, CowStr, Event, Options, Parser, Tag};

use crate::authentication::AuthUser;
use crate::data_formats::{FieldErrors, Sidebar, NO_CATEGORY_SLUG};

mod accounts;
mod board;
mod single_pages;

pub use accounts::*;
pub use board::*;
pub use single_pages::*;

pub const SITE_NAME: &str = "Do It Board";

pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            c => escaped.push(c),
        }
    }
    escaped
}

/// Escapes `text` and keeps its line breaks.
pub fn paragraphs(text: &str) -> String {
    escape(text).replace("\r\n", "\n").replace('\n', "<br>\n")
}

/// Renders a Markdown post body. Raw HTML in the source comes out as
/// escaped text and script URLs are dropped from links and images.
pub fn markdown(text: &str) -> String {
    let options = Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TABLES;
    let events = Parser::new_ext(text, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Link {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Event::Start(Tag::Image {
            link_type,
            dest_url: safe_url(dest_url),
            title,
            id,
        }),
        event => event,
    });
    let mut rendered = String::with_capacity(text.len() * 3 / 2);
    html::push_html(&mut rendered, events);
    rendered
}

fn safe_url(url: CowStr<'_>) -> CowStr<'_> {
    let scheme = url
        .trim_start()
        .split(':')
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if url.contains(':') && matches!(scheme.as_str(), "javascript" | "vbscript" | "data") {
        CowStr::Borrowed("#")
    } else {
        url
    }
}

pub struct Layout<'a> {
    pub title: &'a str,
    pub user: Option<&'a AuthUser>,
    pub sidebar: Option<&'a Sidebar>,
}

impl<'a> Layout<'a> {
    pub fn new(title: &'a str, user: Option<&'a AuthUser>) -> Self {
        Layout {
            title,
            user,
            sidebar: None,
        }
    }

    pub fn with_sidebar(mut self, sidebar: &'a Sidebar) -> Self {
        self.sidebar = Some(sidebar);
        self
    }
}

pub fn layout(page: Layout<'_>, main: &str) -> String {
    let sidebar = page.sidebar.map(render_sidebar).unwrap_or_default();
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title}</title>
</head>
<body>
{navbar}
<div class="container">
<div id="main-area">
{main}
</div>
{sidebar}
</div>
<footer id="footer"><p>&copy; {site_name}</p></footer>
</body>
</html>
"#,
        title = escape(page.title),
        navbar = render_navbar(page.user),
        main = main,
        sidebar = sidebar,
        site_name = SITE_NAME,
    )
}

fn render_navbar(user: Option<&AuthUser>) -> String {
    let account = match user {
        Some(user) => format!(
            r#"<span id="current-user">{}</span> <a href="/accounts/logout/">Log Out</a>"#,
            escape(&user.username)
        ),
        None => {
            r#"<a href="/accounts/login/">Log In</a> <a href="/accounts/signup/">Sign Up</a>"#
                .to_owned()
        }
    };
    format!(
        r#"<nav id="navbar"><a href="/">{SITE_NAME}</a> <a href="/board/">Board</a> <a href="/about_site/">About Me</a> {account}</nav>"#
    )
}

fn render_sidebar(sidebar: &Sidebar) -> String {
    let mut items = String::new();
    for category in &sidebar.categories {
        items.push_str(&format!(
            r#"<li><a href="/board/category/{}/">{} ({})</a></li>"#,
            escape(&category.slug),
            escape(&category.name),
            category.post_count
        ));
        items.push('\n');
    }
    format!(
        r#"<div id="categories-card">
<h3>Categories</h3>
<ul>
{items}<li><a href="/board/category/{NO_CATEGORY_SLUG}/">uncategorized ({})</a></li>
</ul>
</div>"#,
        sidebar.uncategorized
    )
}

pub fn field_error(errors: &FieldErrors, field: &str) -> String {
    errors
        .iter()
        .filter(|(name, _)| *name == field)
        .map(|(_, message)| format!(r#"<p class="error">{}</p>"#, escape(message)))
        .collect()
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = format!(
        "{} {}",
        status.as_u16(),
        status.canonical_reason().unwrap_or("Error")
    );
    let main = format!("<h1>{}</h1>\n<p>{}</p>", escape(&title), escape(message));
    layout(Layout::new(&title, None), &main)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::CategoryCount;

    #[test]
    fn escape_neutralises_markup() {
        assert_eq!(
            escape(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#x27;y&#x27;"
        );
    }

    #[test]
    fn paragraphs_keep_line_breaks() {
        assert_eq!(paragraphs("a\r\nb<"), "a<br>\nb&lt;");
    }

    #[test]
    fn markdown_renders_formatting_but_not_raw_html() {
        let html = markdown("**bold** and *soft*\n\n<script>alert(1)</script>");
        assert!(html.contains("<strong>bold</strong>"));
        assert!(html.contains("<em>soft</em>"));
        assert!(html.contains("&lt;script&gt;alert(1)&lt;/script&gt;"));
        assert!(!html.contains("<script>"));

        let html = markdown("Hello <World> and <b onclick=\"x()\">hi</b>");
        assert!(html.contains("Hello &lt;World&gt;"));
        assert!(!html.contains("<b "));
    }

    #[test]
    fn markdown_drops_script_links() {
        let html = markdown("[click](javascript:alert(1)) [home](https://example.com/)");
        assert!(html.contains(r##"<a href="#">click</a>"##));
        assert!(html.contains(r#"<a href="https://example.com/">home</a>"#));
        assert!(!html.contains("javascript:"));
    }

    #[test]
    fn layout_has_navbar_and_main_area() {
        let html = layout(Layout::new("Board", None), "<p>hi</p>");
        assert!(html.contains("<title>Board</title>"));
        assert!(html.contains(r#"<a href="/about_site/">About Me</a>"#));
        assert!(html.contains(r#"<div id="main-area">"#));
        assert!(html.contains("Log In"));
        assert!(!html.contains("categories-card"));
    }

    #[test]
    fn sidebar_lists_counts() {
        let sidebar = Sidebar {
            categories: vec![CategoryCount {
                id: 1,
                name: "programming".to_owned(),
                slug: "programming".to_owned(),
                post_count: 2,
            }],
            uncategorized: 1,
        };
        let user = AuthUser {
            id: 1,
            username: "park".to_owned(),
            is_staff: true,
        };
        let html = layout(Layout::new("Board", Some(&user)).with_sidebar(&sidebar), "");
        assert!(html.contains(r#"<a href="/board/category/programming/">programming (2)</a>"#));
        assert!(html.contains(r#"<a href="/board/category/no_category/">uncategorized (1)</a>"#));
        assert!(html.contains("Log Out"));
    }

    #[test]
    fn error_page_names_the_status() {
        let html = error_page(StatusCode::FORBIDDEN, "nope");
        assert!(html.contains("<h1>403 Forbidden</h1>"));
    }
}
