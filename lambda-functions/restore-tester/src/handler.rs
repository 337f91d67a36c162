use aws_sdk_dynamodb::types::TableStatus;
use bon::Builder;
use serde_json::Value;
use tracing::{error, info, warn};

use crate::clients::{BackupService, NotificationPublisher, TableService};
use crate::config::Config;
use crate::error::HandlerError;
use crate::notification::{classify, Classification, JobKind, Notification, SnsEvent};
use crate::resource::RestoredResource;
use crate::{Outcome, Response};

/// AWS Backup resource type label for DynamoDB recovery points.
pub const DYNAMODB_RESOURCE_TYPE: &str = "DynamoDB";

pub const TARGET_TABLE_NAME: &str = "targetTableName";
pub const ORIGINAL_TABLE_NAME: &str = "originalTableName";

#[derive(Debug, Clone, PartialEq)]
pub enum BackupOutcome {
    RestoreStarted { restore_job_id: String },
    /// The backed-up table was missing or not ACTIVE, so no restore was started.
    ValidationFailed { table_name: String },
}

#[derive(Debug, Clone, PartialEq)]
pub struct RestoreTestReport {
    pub resource: RestoredResource,
    pub cleaned_up: bool,
    pub confirmation_id: Option<String>,
}

/// Routes AWS Backup job notifications through the restore test cycle:
/// a finished backup starts a restore into a scratch table, and a finished
/// restore deletes that table and publishes a confirmation.
#[derive(Builder)]
pub struct RestoreTester<B, T, N> {
    backup: B,
    tables: T,
    publisher: N,
    #[builder(default)]
    config: Config,
}

impl<B, T, N> RestoreTester<B, T, N>
where
    B: BackupService,
    T: TableService,
    N: NotificationPublisher,
{
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Handles one SNS delivery. Never fails: every error ends up in the log
    /// and in an `Aborted` response.
    pub async fn handle(&self, event: Value) -> Response {
        info!("Incoming event: {}", event);

        let notification = match SnsEvent::from_value(event)
            .and_then(|event| event.first_notification().cloned())
        {
            Ok(notification) => notification,
            Err(e) => {
                error!("Could not read notification: {}", e);
                return aborted(None, e.into());
            }
        };

        let classification = match classify(&notification, &self.config.status_subject) {
            Ok(classification) => classification,
            Err(e) => {
                error!("Could not classify notification: {}", e);
                return aborted(None, e.into());
            }
        };

        self.dispatch(&notification, classification).await
    }

    async fn dispatch(
        &self,
        notification: &Notification,
        classification: Classification,
    ) -> Response {
        match classification {
            Classification::Ignore(reason) => {
                info!("No action required: {}", reason);
                Response::builder()
                    .outcome(Outcome::Ignored)
                    .detail(reason.to_string())
                    .build()
            }
            Classification::JobFailed { job_id } => {
                error!(
                    "AWS Backup job {} failed. Review the job in the AWS Backup console.",
                    job_id
                );
                Response::builder()
                    .outcome(Outcome::JobFailed)
                    .job_id(job_id)
                    .build()
            }
            Classification::BackupCompleted { job_id } => {
                match self.handle_backup_completed(&job_id).await {
                    Ok(BackupOutcome::RestoreStarted { restore_job_id }) => Response::builder()
                        .outcome(Outcome::RestoreStarted)
                        .job_id(job_id)
                        .detail(format!("restore job {}", restore_job_id))
                        .build(),
                    Ok(BackupOutcome::ValidationFailed { table_name }) => Response::builder()
                        .outcome(Outcome::ValidationFailed)
                        .job_id(job_id)
                        .detail(format!("table {} failed validation", table_name))
                        .build(),
                    Err(e) => {
                        error!("Restore test for backup job {} aborted: {}", job_id, e);
                        aborted(Some(job_id), e)
                    }
                }
            }
            Classification::RestoreCompleted { job_id } => {
                match self
                    .handle_restore_completed(&job_id, notification.topic_arn.as_deref())
                    .await
                {
                    Ok(report) => Response::builder()
                        .outcome(Outcome::RestoreTestCompleted)
                        .job_id(job_id)
                        .detail(if report.cleaned_up {
                            format!("deleted {}", report.resource)
                        } else {
                            format!("no cleanup for {}", report.resource)
                        })
                        .build(),
                    Err(e) => {
                        error!("Cleanup for restore job {} aborted: {}", job_id, e);
                        aborted(Some(job_id), e)
                    }
                }
            }
        }
    }

    /// Starts a test restore from the recovery point a finished backup job produced.
    ///
    /// DynamoDB restores are redirected to `<originalTableName><suffix>` and only
    /// started when the table named by `targetTableName` is ACTIVE.
    pub async fn handle_backup_completed(
        &self,
        job_id: &str,
    ) -> Result<BackupOutcome, HandlerError> {
        let job = self.backup.describe_backup_job(job_id).await?;
        info!(
            "Backup job {} produced {} recovery point {} in vault {}",
            job_id, job.resource_type, job.recovery_point_arn, job.backup_vault_name
        );

        let mut metadata = self
            .backup
            .get_recovery_point_restore_metadata(&job.backup_vault_name, &job.recovery_point_arn)
            .await?;

        if job.resource_type == DYNAMODB_RESOURCE_TYPE {
            let table_name = metadata
                .get(TARGET_TABLE_NAME)
                .cloned()
                .ok_or(HandlerError::MissingMetadata {
                    key: TARGET_TABLE_NAME,
                })?;
            let original_table_name = metadata
                .get(ORIGINAL_TABLE_NAME)
                .ok_or(HandlerError::MissingMetadata {
                    key: ORIGINAL_TABLE_NAME,
                })?;

            let restore_table_name = self.config.restore_table_name(original_table_name);
            metadata.insert(TARGET_TABLE_NAME.to_string(), restore_table_name);

            // The validated table is the pre-rename target, usually the source table itself.
            if !self.validate_table(&table_name).await? {
                warn!("DynamoDB table validation failed for {}", table_name);
                return Ok(BackupOutcome::ValidationFailed { table_name });
            }

            info!("DynamoDB table validation succeeded for {}", table_name);
        }

        info!("Starting the restore job");
        let restore_job_id = self
            .backup
            .start_restore_job(&job.recovery_point_arn, &job.iam_role_arn, metadata)
            .await?;

        info!(
            "Started restore job {} from recovery point {}",
            restore_job_id, job.recovery_point_arn
        );

        Ok(BackupOutcome::RestoreStarted { restore_job_id })
    }

    /// Deletes the resource a finished restore job created and publishes the
    /// confirmation. Only DynamoDB tables are cleaned up; the confirmation
    /// reports success for every resource type, including ones left in place.
    pub async fn handle_restore_completed(
        &self,
        job_id: &str,
        topic_arn: Option<&str>,
    ) -> Result<RestoreTestReport, HandlerError> {
        let topic_arn = topic_arn.ok_or(HandlerError::MissingTopic)?;

        let job = self.backup.describe_restore_job(job_id).await?;
        let resource = RestoredResource::from_arn(&job.created_resource_arn)?;

        info!("Restore from the backup was successful. Deleting the newly created resource.");

        let cleaned_up = match &resource {
            RestoredResource::DynamoDbTable { table_name } => {
                info!("Deleting: {}", table_name);
                self.tables.delete_table(table_name).await?;
                true
            }
            RestoredResource::Ec2 => {
                // TODO: validate and terminate restored EC2 instances.
                warn!(
                    "No cleanup implemented for ec2, leaving {} in place",
                    job.created_resource_arn
                );
                false
            }
            RestoredResource::Other(service) => {
                warn!(
                    "No cleanup implemented for {}, leaving {} in place",
                    service, job.created_resource_arn
                );
                false
            }
        };

        let message = format!(
            "Restore {} job completed successfully for {}.",
            JobKind::Restore,
            resource.service()
        );

        info!("Sending final confirmation");
        let confirmation_id = self
            .publisher
            .publish(topic_arn, &self.config.status_subject, &message)
            .await?;
        info!("Published confirmation {:?}: {}", confirmation_id, message);

        Ok(RestoreTestReport {
            resource,
            cleaned_up,
            confirmation_id,
        })
    }

    /// True only for an ACTIVE table. A missing table is a failed validation,
    /// not an error.
    pub async fn validate_table(&self, table_name: &str) -> Result<bool, HandlerError> {
        match self.tables.describe_table_status(table_name).await? {
            Some(TableStatus::Active) => Ok(true),
            Some(status) => {
                warn!(
                    "DynamoDB table {} is not in an active state. Status: {}",
                    table_name,
                    status.as_str()
                );
                Ok(false)
            }
            None => {
                warn!("DynamoDB table {} not found.", table_name);
                Ok(false)
            }
        }
    }
}

fn aborted(job_id: Option<String>, error: HandlerError) -> Response {
    Response::builder()
        .outcome(Outcome::Aborted)
        .maybe_job_id(job_id)
        .detail(error.to_string())
        .build()
}
