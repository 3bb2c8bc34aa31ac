use actix_web::http::StatusCode;
use actix_web::http::header::ContentType;
use actix_web::{HttpResponse, ResponseError};
use askama::Template;
use forecast::ForecastError;
use log::error;
use thiserror::Error;
use yahoo_api::ApiError;

#[derive(Debug, Error)]
pub enum DashboardError {
    #[error("market data unavailable: {0}")]
    Api(#[from] ApiError),

    #[error("forecast failed: {0}")]
    Forecast(#[from] ForecastError),

    #[error("could not render page: {0}")]
    Render(#[from] askama::Error),
}

#[derive(Template)]
#[template(path = "error.html")]
struct ErrorTemplate<'a> {
    status: u16,
    reason: &'a str,
    message: String,
}

impl ResponseError for DashboardError {
    fn status_code(&self) -> StatusCode {
        match self {
            DashboardError::Api(ApiError::InvalidRange { .. }) => StatusCode::BAD_REQUEST,
            DashboardError::Api(_) => StatusCode::BAD_GATEWAY,
            DashboardError::Forecast(_) | DashboardError::Render(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        error!("{} | {}", status, self);

        let page = ErrorTemplate {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or("Error"),
            message: self.to_string(),
        };
        match page.render() {
            Ok(body) => HttpResponse::build(status)
                .content_type(ContentType::html())
                .body(body),
            Err(_) => HttpResponse::build(status)
                .content_type(ContentType::plaintext())
                .body(self.to_string()),
        }
    }
}
