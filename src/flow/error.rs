use serde::{Serialize, Serializer};
use thiserror::Error;

/// An error that can occur when fetching, decoding or storing traffic flow data.
#[derive(Error, Debug)]
pub enum Error {
    /// A result lacks the fields needed to build a traffic record
    #[error("malformed record '{description}': {reason}")]
    MalformedRecord {
        /// Location description of the offending result, if it had one
        description: String,
        /// What was missing or could not be decoded
        reason: String,
    },
    /// The traffic API answered with a non-success status
    #[error("traffic API returned status {code}: {body}")]
    Upstream {
        /// HTTP status code of the response
        code: u16,
        /// Raw response body, usually an error document from the API
        body: String,
    },
    /// The request never produced a response
    #[error("request to traffic API failed: {0}")]
    Request(String),
    /// The response body could not be read
    #[error("impossible to read response body")]
    Payload(#[from] awc::error::PayloadError),
    /// The request url could not be built
    #[error("invalid url")]
    Url(#[from] url::ParseError),
    /// A setting or query parameter could not be parsed
    #[error("invalid configuration: {0}")]
    Config(String),
    /// Generic Input/Output error while writing a file
    #[error("impossible to read or write file")]
    IO(#[from] std::io::Error),
    #[error(transparent)]
    Serde(#[from] serde_json::Error),
    /// Error when querying sqlite
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),
    /// The HTML page could not be rendered
    #[error("impossible to render page")]
    Template(#[from] askama::Error),
}

impl Serialize for Error {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_as_message() {
        let err = Error::Upstream {
            code: 403,
            body: "forbidden".to_string(),
        };
        assert_eq!(
            serde_json::to_value(&err).unwrap(),
            serde_json::json!("traffic API returned status 403: forbidden")
        );
    }
}
