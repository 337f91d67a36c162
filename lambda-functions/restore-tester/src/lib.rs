use bon::Builder;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod clients;
pub mod config;
pub mod error;
pub mod handler;
pub mod notification;
pub mod resource;

pub use clients::{
    AwsBackupService, AwsNotificationPublisher, AwsTableService, BackupJob, BackupService,
    NotificationPublisher, RestoreJob, RestoreMetadata, TableService,
};
pub use config::Config;
pub use error::{HandlerError, ParseError, ServiceError};
pub use handler::{BackupOutcome, RestoreTestReport, RestoreTester};
pub use notification::{classify, Classification, IgnoreReason, JobKind, Notification, SnsEvent};
pub use resource::RestoredResource;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    Ignored,
    JobFailed,
    RestoreStarted,
    ValidationFailed,
    RestoreTestCompleted,
    Aborted,
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ignored => write!(f, "ignored"),
            Self::JobFailed => write!(f, "job_failed"),
            Self::RestoreStarted => write!(f, "restore_started"),
            Self::ValidationFailed => write!(f, "validation_failed"),
            Self::RestoreTestCompleted => write!(f, "restore_test_completed"),
            Self::Aborted => write!(f, "aborted"),
        }
    }
}

/// Summary of one invocation. The SNS trigger discards it; it is kept for
/// log correlation and tests.
#[derive(Builder, Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "snake_case")]
pub struct Response {
    pub outcome: Outcome,
    pub job_id: Option<String>,
    pub detail: Option<String>,
    #[builder(default = Utc::now())]
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_serialization() {
        let response = Response::builder()
            .outcome(Outcome::RestoreStarted)
            .job_id("1b2c-3d4e".to_string())
            .detail("restore job 9f8e".to_string())
            .build();

        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["outcome"], "restore_started");
        assert_eq!(json["job_id"], "1b2c-3d4e");
        assert_eq!(json["detail"], "restore job 9f8e");
        assert!(json["timestamp"].is_string());
    }

    #[test]
    fn test_response_optional_fields() {
        let response = Response::builder().outcome(Outcome::Ignored).build();
        assert_eq!(response.job_id, None);
        assert_eq!(response.detail, None);

        let json = serde_json::to_string(&response).unwrap();
        assert!(json.contains("\"job_id\":null"));
    }

    #[test]
    fn test_outcome_display_matches_serde() {
        for outcome in [
            Outcome::Ignored,
            Outcome::JobFailed,
            Outcome::RestoreStarted,
            Outcome::ValidationFailed,
            Outcome::RestoreTestCompleted,
            Outcome::Aborted,
        ] {
            let json = serde_json::to_value(outcome).unwrap();
            assert_eq!(json, outcome.to_string());
        }
    }
}
