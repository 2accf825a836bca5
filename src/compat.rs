use crate::model::{self, network::ErrorBody};
use axum::response::IntoResponse;

impl From<serde_json::Error> for model::ApiError {
    fn from(value: serde_json::Error) -> Self {
        model::ApiError::InvalidJson(format!("{}", value))
    }
}

impl IntoResponse for model::ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let error = self.to_string();

        let body = match self {
            model::ApiError::Provider { body, .. } => ErrorBody {
                error,
                details: Some(body),
            },
            _ => ErrorBody {
                error,
                details: None,
            },
        };

        (status, axum::Json(body)).into_response()
    }
}
