// Request handlers.
// One handler per data source, sharing the response shape and error mapping.

pub mod news;
pub mod weather;

use serde::Serialize;
use tracing::error;

use crate::error::SmallTalkError;

pub use news::{NewsHandler, TOP_STORIES_KEY};
pub use weather::{WeatherEvent, WeatherHandler, weather_cache_key};

pub const UNEXPECTED_ERROR: &str = "An unexpected error occurred";

/// Error payload returned in place of data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Body<T> {
    Data(T),
    Error(ErrorBody),
}

/// What a handler hands back to the host platform.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response<T> {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    pub body: Body<T>,
}

impl<T> Response<T> {
    pub fn ok(data: T) -> Self {
        Self {
            status_code: 200,
            body: Body::Data(data),
        }
    }

    pub fn error(status_code: u16, message: impl Into<String>) -> Self {
        Self {
            status_code,
            body: Body::Error(ErrorBody {
                error: message.into(),
            }),
        }
    }

    /// Map a failed fetch to a 500. Upstream failures get `upstream_message`,
    /// everything else the generic message.
    pub fn from_error(err: &SmallTalkError, upstream_message: &str) -> Self {
        if err.is_upstream() {
            error!("Upstream fetch failed: {err}");
            Self::error(500, upstream_message)
        } else {
            error!("Unexpected error: {err}");
            Self::error(500, UNEXPECTED_ERROR)
        }
    }

    pub fn is_success(&self) -> bool {
        self.status_code == 200
    }

    pub fn data(&self) -> Option<&T> {
        match &self.body {
            Body::Data(data) => Some(data),
            Body::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.body {
            Body::Data(_) => None,
            Body::Error(body) => Some(&body.error),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_response_wire_shape() {
        let ok = serde_json::to_value(Response::ok(vec![1, 2])).unwrap();
        assert_eq!(ok, json!({"statusCode": 200, "body": [1, 2]}));

        let err = serde_json::to_value(Response::<Vec<u8>>::error(500, "boom")).unwrap();
        assert_eq!(err, json!({"statusCode": 500, "body": {"error": "boom"}}));
    }

    #[test]
    fn test_error_mapping() {
        let upstream = SmallTalkError::Upstream {
            service: "Hacker News",
            status: 500,
        };
        let response = Response::<()>::from_error(&upstream, "Failed to fetch");
        assert_eq!(response.status_code, 500);
        assert_eq!(response.error_message(), Some("Failed to fetch"));

        let other = SmallTalkError::Parse("bad".into());
        let response = Response::<()>::from_error(&other, "Failed to fetch");
        assert_eq!(response.error_message(), Some(UNEXPECTED_ERROR));
    }
}
