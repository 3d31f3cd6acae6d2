use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use log::error;

use crate::dto::ErrorBody;

/// Problems with the request itself. Reported back verbatim.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("No file provided. Send a file with key 'file'.")]
    MissingFile,
    #[error("Empty filename.")]
    EmptyFilename,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error("Transcription failed: {0:#}")]
    Processing(#[from] anyhow::Error),
}

impl ApiError {
    pub fn processing(err: impl Into<anyhow::Error>) -> Self {
        ApiError::Processing(err.into())
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::Processing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if let ApiError::Processing(e) = self {
            // backtrace stays in the log
            error!("Transcription failed: {e:?}");
        }
        HttpResponse::build(self.status_code()).json(ErrorBody {
            error: self.to_string(),
        })
    }
}
