#![allow(dead_code)]

use std::net::TcpListener;

use board::Config;
use reqwest::{redirect::Policy, Client, Response, StatusCode};

pub struct TestApp {
    pub address: String,
}

/// Starts the board on a random port with a fresh database. Usernames in
/// `staff` become staff when they sign up.
pub async fn spawn_app(staff: &[&str]) -> TestApp {
    let listener = TcpListener::bind("127.0.0.1:0").expect("Could not bind a free port");
    let local = listener.local_addr().unwrap();
    let path = std::env::temp_dir().join(format!("board-it-{}.db", rand::random::<u64>()));
    let config = Config {
        host: local.ip().to_string(),
        port: local.port(),
        database_url: format!("sqlite://{}", path.display()),
        jwt_secret: "test-secret".to_owned(),
        staff_usernames: staff.iter().map(|name| name.to_string()).collect(),
    };
    tokio::spawn(board::serve(listener, config, std::future::pending()));
    TestApp {
        address: format!("http://{}", local),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    /// A browser-like client: keeps cookies, does not follow redirects.
    pub fn client(&self) -> Client {
        Client::builder()
            .cookie_store(true)
            .redirect(Policy::none())
            .build()
            .unwrap()
    }

    pub async fn get(&self, client: &Client, path: &str) -> Response {
        client.get(self.url(path)).send().await.unwrap()
    }

    pub async fn get_html(&self, client: &Client, path: &str) -> String {
        let response = self.get(client, path).await;
        assert_eq!(response.status(), StatusCode::OK, "GET {path}");
        response.text().await.unwrap()
    }

    pub async fn post_form(&self, client: &Client, path: &str, form: &[(&str, &str)]) -> Response {
        client.post(self.url(path)).form(form).send().await.unwrap()
    }

    /// Signs up `username` and returns a client logged in as that user.
    pub async fn user(&self, username: &str) -> Client {
        let client = self.client();
        let response = self
            .post_form(
                &client,
                "/accounts/signup/",
                &[
                    ("username", username),
                    ("password1", "parkdjango"),
                    ("password2", "parkdjango"),
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "signup {username}");
        client
    }

    pub async fn create_category(&self, client: &Client, name: &str) {
        let response = self
            .post_form(client, "/board/create_category/", &[("name", name)])
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "category {name}");
    }

    /// Reads the id of category `name` off the post form's select box.
    pub async fn category_id(&self, client: &Client, name: &str) -> String {
        let html = self.get_html(client, "/board/create_post/").await;
        let end = html
            .find(&format!(">{name}</option>"))
            .expect("category option");
        let start = html[..end].rfind("value=\"").unwrap() + "value=\"".len();
        html[start..end]
            .trim_end_matches(" selected")
            .trim_end_matches('"')
            .to_owned()
    }

    /// Creates a post through the form and returns its id.
    pub async fn create_post(
        &self,
        client: &Client,
        title: &str,
        content: &str,
        category: &str,
        tags: &str,
    ) -> i64 {
        let response = self
            .post_form(
                client,
                "/board/create_post/",
                &[
                    ("title", title),
                    ("content", content),
                    ("category", category),
                    ("tags_str", tags),
                ],
            )
            .await;
        assert_eq!(response.status(), StatusCode::SEE_OTHER, "create {title}");
        id_from_location(&response, "/board/")
    }
}

pub fn location(response: &Response) -> String {
    response.headers()["location"].to_str().unwrap().to_owned()
}

/// Parses the number that follows `prefix` in the redirect target.
pub fn id_from_location(response: &Response, prefix: &str) -> i64 {
    let location = location(response);
    location
        .strip_prefix(prefix)
        .and_then(|rest| rest.split(|c: char| !c.is_ascii_digit()).next())
        .and_then(|id| id.parse().ok())
        .unwrap_or_else(|| panic!("no id in {location}"))
}
