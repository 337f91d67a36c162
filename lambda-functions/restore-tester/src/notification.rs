//! Inbound AWS Backup job notifications delivered through SNS.
//!
//! AWS Backup publishes free text such as
//! `"An AWS Backup job was completed successfully. Backup job ID: 1b2c..."`.
//! The text is read positionally:
//!
//! ```text
//! tail     := message after its last '.'
//! job_type := tail split on ' ', token 1     ("Backup" | "Restore")
//! job_id   := tail split on ':', token 1, trimmed
//! ```
//!
//! A message containing `failed` anywhere is a failed job, whatever its job type.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::warn;

use crate::error::ParseError;

#[derive(Deserialize, Serialize, Debug, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct SnsEvent {
    pub records: Vec<SnsRecord>,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SnsRecord {
    #[serde(rename = "Sns")]
    pub sns: Notification,
}

#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "PascalCase")]
pub struct Notification {
    #[serde(deserialize_with = "nullable")]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub topic_arn: Option<String>,
}

/// The key must be present; its value may be `null`.
fn nullable<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::deserialize(deserializer)
}

impl SnsEvent {
    pub fn from_value(value: serde_json::Value) -> Result<Self, ParseError> {
        Ok(serde_json::from_value(value)?)
    }

    /// SNS delivers one record per invocation; anything past the first is skipped.
    pub fn first_notification(&self) -> Result<&Notification, ParseError> {
        if self.records.len() > 1 {
            warn!(
                "Event carries {} records, only the first is processed",
                self.records.len()
            );
        }

        self.records
            .first()
            .map(|record| &record.sns)
            .ok_or(ParseError::NoRecords)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobKind {
    Backup,
    Restore,
}

impl JobKind {
    fn from_token(token: &str) -> Option<Self> {
        match token {
            "Backup" => Some(Self::Backup),
            "Restore" => Some(Self::Restore),
            _ => None,
        }
    }
}

impl fmt::Display for JobKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Backup => write!(f, "Backup"),
            Self::Restore => write!(f, "Restore"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Our own confirmation published back onto the topic.
    StatusEcho,
    UnrecognisedJobType(String),
}

impl fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StatusEcho => write!(f, "restore test status echo"),
            Self::UnrecognisedJobType(token) => write!(f, "unrecognised job type {:?}", token),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    Ignore(IgnoreReason),
    JobFailed { job_id: String },
    BackupCompleted { job_id: String },
    RestoreCompleted { job_id: String },
}

/// Everything after the last '.', leading space included.
fn message_tail(message: &str) -> &str {
    message.rsplit('.').next().unwrap_or(message)
}

fn job_type_token(message: &str) -> Result<&str, ParseError> {
    message_tail(message)
        .split(' ')
        .nth(1)
        .ok_or_else(|| ParseError::MissingJobType(message.to_string()))
}

pub fn job_id(message: &str) -> Result<String, ParseError> {
    let id = message_tail(message)
        .split(':')
        .nth(1)
        .ok_or_else(|| ParseError::MissingJobId(message.to_string()))?
        .trim();

    if id.is_empty() {
        return Err(ParseError::EmptyJobId(message.to_string()));
    }

    Ok(id.to_string())
}

pub fn classify(
    notification: &Notification,
    status_subject: &str,
) -> Result<Classification, ParseError> {
    if notification.subject.as_deref() == Some(status_subject) {
        return Ok(Classification::Ignore(IgnoreReason::StatusEcho));
    }

    let message = notification
        .message
        .as_deref()
        .ok_or(ParseError::MissingMessage)?;

    let token = job_type_token(message)?;

    if message.contains("failed") {
        return Ok(Classification::JobFailed {
            job_id: job_id(message)?,
        });
    }

    match JobKind::from_token(token) {
        Some(JobKind::Backup) => Ok(Classification::BackupCompleted {
            job_id: job_id(message)?,
        }),
        Some(JobKind::Restore) => Ok(Classification::RestoreCompleted {
            job_id: job_id(message)?,
        }),
        None => Ok(Classification::Ignore(IgnoreReason::UnrecognisedJobType(
            token.to_string(),
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STATUS: &str = "Restore Test Status";

    fn notification(subject: Option<&str>, message: &str) -> Notification {
        Notification {
            subject: subject.map(str::to_string),
            message: Some(message.to_string()),
            topic_arn: Some("arn:aws:sns:us-east-1:123456789012:backup-events".to_string()),
        }
    }

    #[test]
    fn test_sns_event_deserialization() {
        let value = json!({
            "Records": [{
                "EventSource": "aws:sns",
                "Sns": {
                    "Type": "Notification",
                    "Subject": "Notification from AWS Backup",
                    "Message": "An AWS Backup job was completed successfully. Backup job ID: 1b2c-3d4e",
                    "TopicArn": "arn:aws:sns:us-east-1:123456789012:backup-events"
                }
            }]
        });

        let event = SnsEvent::from_value(value).unwrap();
        let sns = event.first_notification().unwrap();
        assert_eq!(sns.subject.as_deref(), Some("Notification from AWS Backup"));
        assert_eq!(
            sns.topic_arn.as_deref(),
            Some("arn:aws:sns:us-east-1:123456789012:backup-events")
        );
    }

    #[test]
    fn test_null_subject_is_accepted() {
        let value = json!({"Records": [{"Sns": {"Subject": null, "Message": "x"}}]});
        let event = SnsEvent::from_value(value).unwrap();
        assert_eq!(event.first_notification().unwrap().subject, None);
    }

    #[test]
    fn test_missing_subject_key_is_malformed() {
        let value = json!({"Records": [{"Sns": {"Message": "x", "TopicArn": "arn"}}]});
        assert!(matches!(
            SnsEvent::from_value(value),
            Err(ParseError::MalformedEnvelope(_))
        ));
    }

    #[test]
    fn test_only_first_record_is_processed() {
        let value = json!({
            "Records": [
                {"Sns": {"Subject": "first", "Message": "a"}},
                {"Sns": {"Subject": "second", "Message": "b"}}
            ]
        });

        let event = SnsEvent::from_value(value).unwrap();
        assert_eq!(event.records.len(), 2);

        let first = event.first_notification().unwrap();
        assert_eq!(first.subject.as_deref(), Some("first"));
        assert_eq!(first.message.as_deref(), Some("a"));
    }

    #[test]
    fn test_envelope_errors() {
        assert!(matches!(
            SnsEvent::from_value(json!({"detail": {}})),
            Err(ParseError::MalformedEnvelope(_))
        ));

        let empty = SnsEvent::from_value(json!({"Records": []})).unwrap();
        assert!(matches!(
            empty.first_notification(),
            Err(ParseError::NoRecords)
        ));
    }

    #[test]
    fn test_status_subject_is_ignored() {
        let n = notification(
            Some(STATUS),
            "Restore Restore job completed successfully for dynamodb.",
        );
        assert_eq!(
            classify(&n, STATUS).unwrap(),
            Classification::Ignore(IgnoreReason::StatusEcho)
        );
    }

    #[test]
    fn test_status_subject_wins_over_malformed_message() {
        let n = Notification {
            subject: Some(STATUS.to_string()),
            message: None,
            topic_arn: None,
        };
        assert!(classify(&n, STATUS).is_ok());
    }

    #[test]
    fn test_backup_completed() {
        let n = notification(
            Some("Notification from AWS Backup"),
            "An AWS Backup job was completed successfully. Backup job ID: 1b2c-3d4e",
        );
        assert_eq!(
            classify(&n, STATUS).unwrap(),
            Classification::BackupCompleted {
                job_id: "1b2c-3d4e".to_string()
            }
        );
    }

    #[test]
    fn test_restore_completed() {
        let n = notification(
            None,
            "An AWS Backup restore job was completed successfully. Restore job ID: 9f8e-7d6c",
        );
        assert_eq!(
            classify(&n, STATUS).unwrap(),
            Classification::RestoreCompleted {
                job_id: "9f8e-7d6c".to_string()
            }
        );
    }

    #[test]
    fn test_failed_takes_precedence_over_job_type() {
        let n = notification(None, "Backup job failed for vault Default. Job ID: abcd-1234");
        assert_eq!(
            classify(&n, STATUS).unwrap(),
            Classification::JobFailed {
                job_id: "abcd-1234".to_string()
            }
        );

        let n = notification(None, "Restore job failed. Restore job ID: ef01");
        assert_eq!(
            classify(&n, STATUS).unwrap(),
            Classification::JobFailed {
                job_id: "ef01".to_string()
            }
        );
    }

    #[test]
    fn test_failed_match_is_case_sensitive() {
        let n = notification(None, "Job FAILED to start. Backup job ID: 42");
        assert_eq!(
            classify(&n, STATUS).unwrap(),
            Classification::BackupCompleted {
                job_id: "42".to_string()
            }
        );
    }

    #[test]
    fn test_unrecognised_job_type_is_ignored() {
        let n = notification(None, "A copy job was completed. Copy job ID: 55");
        assert_eq!(
            classify(&n, STATUS).unwrap(),
            Classification::Ignore(IgnoreReason::UnrecognisedJobType("Copy".to_string()))
        );
    }

    #[test]
    fn test_missing_job_type_token() {
        let n = notification(None, "Something happened.Backup");
        assert!(matches!(
            classify(&n, STATUS),
            Err(ParseError::MissingJobType(_))
        ));
    }

    #[test]
    fn test_missing_job_id() {
        let n = notification(None, "Done. Backup job without id");
        assert!(matches!(
            classify(&n, STATUS),
            Err(ParseError::MissingJobId(_))
        ));

        let n = notification(None, "Done. Backup job ID:   ");
        assert!(matches!(classify(&n, STATUS), Err(ParseError::EmptyJobId(_))));
    }

    #[test]
    fn test_missing_message() {
        let n = Notification {
            subject: Some("Notification from AWS Backup".to_string()),
            message: None,
            topic_arn: None,
        };
        assert!(matches!(
            classify(&n, STATUS),
            Err(ParseError::MissingMessage)
        ));
    }

    #[test]
    fn test_job_id_uses_second_colon_token_only() {
        assert_eq!(job_id("Done. Backup job ID: a1:b2").unwrap(), "a1");
    }

    #[test]
    fn test_job_kind_display() {
        assert_eq!(JobKind::Backup.to_string(), "Backup");
        assert_eq!(JobKind::Restore.to_string(), "Restore");
    }
}
