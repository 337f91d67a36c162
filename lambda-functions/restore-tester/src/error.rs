use lambda_runtime::Error as BoxError;
use thiserror::Error;

/// Failures while reading an inbound notification or a resource ARN.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("event is not an SNS envelope: {0}")]
    MalformedEnvelope(#[from] serde_json::Error),

    #[error("event contains no records")]
    NoRecords,

    #[error("notification has no message")]
    MissingMessage,

    #[error("no job type token after the last '.' in message {0:?}")]
    MissingJobType(String),

    #[error("no ':' separated job id after the last '.' in message {0:?}")]
    MissingJobId(String),

    #[error("job id is blank in message {0:?}")]
    EmptyJobId(String),

    #[error("malformed resource ARN {arn:?}: {reason}")]
    MalformedArn { arn: String, reason: &'static str },
}

/// A collaborator call that did not produce a usable answer.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{operation} failed: {source}")]
    Sdk {
        operation: &'static str,
        #[source]
        source: BoxError,
    },

    #[error("{operation} response has no {field}")]
    MissingField {
        operation: &'static str,
        field: &'static str,
    },
}

impl ServiceError {
    pub fn sdk(operation: &'static str, source: impl Into<BoxError>) -> Self {
        Self::Sdk {
            operation,
            source: source.into(),
        }
    }

    pub fn missing(operation: &'static str, field: &'static str) -> Self {
        Self::MissingField { operation, field }
    }
}

#[derive(Debug, Error)]
pub enum HandlerError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Service(#[from] ServiceError),

    #[error("restore metadata has no {key}")]
    MissingMetadata { key: &'static str },

    #[error("notification has no topic ARN to confirm on")]
    MissingTopic,
}
