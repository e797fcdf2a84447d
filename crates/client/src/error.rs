use reqwest::StatusCode;

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("invalid API base URL {0:?}")]
    InvalidBaseUrl(String),
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("server responded {status}: {body}")]
    Status { status: StatusCode, body: String },
    #[error("unexpected response body at {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    Core(#[from] telemed_core::CoreError),
}

impl ClientError {
    /// The `detail` message of an API error body, when there is one.
    pub fn detail(&self) -> Option<String> {
        let ClientError::Status { body, .. } = self else {
            return None;
        };
        let value: serde_json::Value = serde_json::from_str(body).ok()?;
        match &value["detail"] {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Null => None,
            other => Some(other.to_string()),
        }
    }
}

pub type ClientResult<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detail_extracts_message() {
        let err = ClientError::Status {
            status: StatusCode::NOT_FOUND,
            body: r#"{"detail":"Appointment not found"}"#.into(),
        };
        assert_eq!(err.detail().as_deref(), Some("Appointment not found"));
        assert!(err.to_string().contains("404"));
    }

    #[test]
    fn test_detail_of_field_errors_is_json() {
        let err = ClientError::Status {
            status: StatusCode::BAD_REQUEST,
            body: r#"{"detail":[{"field":"comment","message":"is required"}]}"#.into(),
        };
        assert!(err.detail().unwrap().contains("comment"));

        let plain = ClientError::Status {
            status: StatusCode::BAD_GATEWAY,
            body: "upstream down".into(),
        };
        assert!(plain.detail().is_none());
    }
}
