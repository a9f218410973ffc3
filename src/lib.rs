mod authentication;
mod config;
mod data_formats;
mod db_helpers;
mod errors;
mod handlers;
mod models;
mod pages;
mod utils;

use std::{future::Future, net::TcpListener, str::FromStr, sync::Arc};

use anyhow::Context;
pub use anyhow::Result;
use axum::{routing::*, Extension, Router};
pub use config::Config;
pub use data_formats::*;
use handlers::*;
use sqlx::{
    migrate::MigrateDatabase,
    sqlite::{SqliteConnectOptions, SqlitePool},
    Sqlite,
};
use tower_http::trace::TraceLayer;
use tracing::info;
pub use utils::{excerpt, parse_tag_names, placeholders, slugify};

/// Binds the configured address and serves until Ctrl+C.
pub async fn run_app(config: Config) -> Result<()> {
    let address = config.address()?;
    let listener =
        TcpListener::bind(address).with_context(|| format!("Failed to bind {}", address))?;
    serve(listener, config, shutdown_signal()).await
}

/// Serves the board on an already bound listener until `shutdown` resolves.
pub async fn serve(
    listener: TcpListener,
    config: Config,
    shutdown: impl Future<Output = ()>,
) -> Result<()> {
    let db = init_db(&config.database_url).await?;
    let app = make_router()
        .layer(Extension(Arc::new(db)))
        .layer(Extension(Arc::new(config)))
        .layer(TraceLayer::new_for_http());
    info!("Server started on {}", listener.local_addr()?);
    axum::Server::from_tcp(listener)?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown)
        .await?;
    info!("Server shut down");
    Ok(())
}

pub async fn init_db(db_url: &str) -> Result<SqlitePool> {
    if !Sqlite::database_exists(db_url).await.unwrap_or(false) {
        info!("Creating database {}", db_url);
        Sqlite::create_database(db_url)
            .await
            .with_context(|| format!("Failed to create database {}", db_url))?;
    } else {
        info!("Database already exists");
    }
    let options = SqliteConnectOptions::from_str(db_url)
        .context("Invalid DATABASE_URL")?
        .foreign_keys(true);
    let pool = SqlitePool::connect_with(options).await?;
    info!("Running Migrations");
    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .context("Failed to run migrations")?;
    info!("Migrations completed");
    Ok(pool)
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to install Ctrl+C handler: {}", e);
        std::future::pending::<()>().await;
    }
    info!("Received Ctrl+C, shutting down");
}

pub fn make_router() -> Router {
    Router::new()
        .route("/", get(landing))
        .route("/about_site/", get(about_site))
        .route("/check_health", get(alive))
        .route("/board/", get(post_list))
        .route("/board/:id/", get(post_detail))
        .route("/board/create_post/", get(create_post_form).post(create_post))
        .route(
            "/board/update_post/:id/",
            get(update_post_form).post(update_post),
        )
        .route("/board/delete_post/:id/", post(delete_post))
        .route("/board/:id/new_comment/", post(new_comment))
        .route(
            "/board/update_comment/:id/",
            get(update_comment_form).post(update_comment),
        )
        .route("/board/delete_comment/:id/", get(delete_comment))
        .route("/board/search/:term/", get(search_posts))
        .route("/board/category/:slug/", get(category_posts))
        .route("/board/tag/:slug/", get(tag_posts))
        .route(
            "/board/create_category/",
            get(create_category_form).post(create_category),
        )
        .route("/accounts/signup/", get(signup_form).post(signup))
        .route("/accounts/login/", get(login_form).post(login))
        .route("/accounts/logout/", get(logout))
        .route("/accounts/grant_staff/:username/", post(grant_staff))
        .fallback(not_found)
}
