use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
};
use thiserror::Error;

use crate::pages;

pub const LOGIN_URL: &str = "/accounts/login/";

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("{0}")]
    NotFound(&'static str),
    #[error("Login required")]
    NotAuthorized,
    #[error("You do not have permission to do that")]
    Forbidden,
    #[error("{0}")]
    RunTimeError(&'static str),
    #[error("Internal Server Error")]
    ServerError,
    #[error("Internal Server Error")]
    DatabaseError(#[from] sqlx::Error),
}

impl RequestError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            RequestError::NotFound(_) => StatusCode::NOT_FOUND,
            RequestError::NotAuthorized => StatusCode::SEE_OTHER,
            RequestError::Forbidden => StatusCode::FORBIDDEN,
            RequestError::RunTimeError(_) => StatusCode::UNPROCESSABLE_ENTITY,
            RequestError::ServerError | RequestError::DatabaseError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn to_html_response(&self) -> (StatusCode, Html<String>) {
        let status = self.status_code();
        (status, Html(pages::error_page(status, &self.to_string())))
    }
}

impl IntoResponse for RequestError {
    fn into_response(self) -> Response {
        match &self {
            RequestError::NotAuthorized => return Redirect::to(LOGIN_URL).into_response(),
            RequestError::DatabaseError(e) => tracing::error!("Database error: {}", e),
            RequestError::ServerError => tracing::error!("Internal server error"),
            RequestError::Forbidden => tracing::debug!("Forbidden request"),
            _ => (),
        }
        self.to_html_response().into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_authorized_redirects_to_login() {
        let response = RequestError::NotAuthorized.into_response();
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()["location"], LOGIN_URL);
    }

    #[test]
    fn forbidden_is_403() {
        let response = RequestError::Forbidden.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn database_errors_hide_details() {
        let error = RequestError::from(sqlx::Error::RowNotFound);
        assert_eq!(error.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(error.to_string(), "Internal Server Error");
    }
}
