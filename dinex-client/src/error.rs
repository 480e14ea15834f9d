use thiserror::Error;

/// All errors generated in `dinex-client`.
///
/// Every variant is a transport-or-parse failure in the terminology of the
/// client's error taxonomy: the caller recovers by rendering placeholder
/// values and retrying on the next poll. Business-rule rejections are not
/// errors; they arrive as `success: false` payloads.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid exchange url: {0}")]
    Url(#[from] url::ParseError),

    #[error("http transport failure: {0}")]
    Http(#[from] reqwest::Error),

    #[error("failed to decode {endpoint} response: {detail}")]
    Decode {
        endpoint: &'static str,
        detail: String,
    },
}

impl ClientError {
    pub fn decode(endpoint: &'static str, err: serde_json::Error) -> Self {
        Self::Decode {
            endpoint,
            detail: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_error_names_endpoint() {
        let err = serde_json::from_str::<u32>("not json").unwrap_err();
        let err = ClientError::decode("market_summary", err);
        let msg = err.to_string();
        assert!(msg.contains("market_summary"), "got: {msg}");
    }
}
