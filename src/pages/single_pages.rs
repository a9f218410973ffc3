use crate::authentication::AuthUser;
use crate::data_formats::PostView;

use super::{escape, layout, post_card, Layout, SITE_NAME};

pub fn landing_page(user: Option<&AuthUser>, recent_posts: &[PostView]) -> String {
    let mut main = format!(
        "<h1>{SITE_NAME}</h1>\n<p>Share what you are working on.</p>\n<h2>Recent Posts</h2>\n"
    );
    if recent_posts.is_empty() {
        main.push_str(r#"<p class="empty">No posts yet.</p>"#);
    }
    for view in recent_posts {
        main.push_str(&post_card(view));
        main.push('\n');
    }
    layout(Layout::new(SITE_NAME, user), &main)
}

pub fn about_site_page(user: Option<&AuthUser>) -> String {
    let main = format!(
        r#"<h1>About {}</h1>
<p>A small community board. Staff members publish posts filed under categories and tags,
and every member can join the conversation in the comments.</p>"#,
        escape(SITE_NAME)
    );
    layout(Layout::new("About Me", user), &main)
}
