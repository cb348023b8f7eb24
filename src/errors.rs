use axum::{extract::rejection::JsonRejection, http::StatusCode};
use thiserror::Error;

/// Failure to obtain a dataset. Scoped to the charts fed by that dataset.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DataError {
    #[error("failed to fetch {endpoint}: {cause}")]
    Fetch { endpoint: String, cause: String },

    #[error("unexpected payload from {endpoint}: {reason}")]
    Schema { endpoint: String, reason: String },
}

impl DataError {
    pub fn fetch(endpoint: impl Into<String>, cause: impl ToString) -> Self {
        Self::Fetch {
            endpoint: endpoint.into(),
            cause: cause.to_string(),
        }
    }

    pub fn schema(endpoint: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Schema {
            endpoint: endpoint.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Data(#[from] DataError),

    #[error("no data available to download")]
    Empty,

    #[error("unknown chart container `{0}`")]
    UnknownContainer(String),

    #[error("chart `{0}` has nothing rendered yet")]
    NotRendered(String),

    #[error("failed to encode export: {0}")]
    Encode(String),
}

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::BAD_REQUEST,
            message: message.into(),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::NOT_FOUND,
            message: message.into(),
        }
    }

}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::bad_request(rejection.body_text())
    }
}

impl From<ExportError> for AppError {
    fn from(err: ExportError) -> Self {
        let status = match &err {
            ExportError::UnknownContainer(_) => StatusCode::NOT_FOUND,
            ExportError::Empty | ExportError::NotRendered(_) => StatusCode::CONFLICT,
            ExportError::Data(_) => StatusCode::BAD_GATEWAY,
            ExportError::Encode(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self {
            status,
            message: err.to_string(),
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn export_errors_map_to_http_status() {
        let missing: AppError = ExportError::UnknownContainer("nope".into()).into();
        assert_eq!(missing.status, StatusCode::NOT_FOUND);

        let upstream: AppError = ExportError::from(DataError::fetch("searchbyyear", "HTTP 500")).into();
        assert_eq!(upstream.status, StatusCode::BAD_GATEWAY);
        assert!(upstream.message.contains("searchbyyear"));
    }

    #[test]
    fn bad_request_carries_message() {
        let err = AppError::bad_request("unknown variant `bogus`");
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "unknown variant `bogus`");
    }
}
