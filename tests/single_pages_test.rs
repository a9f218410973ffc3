mod common;

use common::spawn_app;

#[tokio::test]
async fn landing_shows_the_three_most_recent_posts() {
    let app = spawn_app(&["park"]).await;
    let park = app.user("park").await;
    for title in ["Post One", "Post Two", "Post Three", "Post Four"] {
        app.create_post(&park, title, "body", "", "").await;
    }

    let anonymous = app.client();
    let html = app.get_html(&anonymous, "/").await;
    assert!(!html.contains("Post One"));
    assert!(html.contains("Post Two"));
    assert!(html.contains("Post Three"));
    assert!(html.contains("Post Four"));
}

#[tokio::test]
async fn landing_without_posts() {
    let app = spawn_app(&[]).await;
    let html = app.get_html(&app.client(), "/").await;
    assert!(html.contains("No posts yet."));
}

#[tokio::test]
async fn about_page_has_the_navbar() {
    let app = spawn_app(&[]).await;
    let html = app.get_html(&app.client(), "/about_site/").await;
    assert!(html.contains("<title>About Me</title>"));
    assert!(html.contains(r#"<nav id="navbar">"#));
}
