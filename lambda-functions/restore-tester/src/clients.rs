use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_backup::Client as BackupClient;
use aws_sdk_dynamodb::{types::TableStatus, Client as DynamoClient};
use aws_sdk_sns::Client as SnsClient;
use serde::Serialize;
use std::collections::HashMap;
use tracing::debug;

use crate::error::ServiceError;

/// Key/value pairs replayed into `StartRestoreJob`, e.g. `targetTableName`.
pub type RestoreMetadata = HashMap<String, String>;

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BackupJob {
    pub job_id: String,
    pub recovery_point_arn: String,
    pub iam_role_arn: String,
    pub backup_vault_name: String,
    /// AWS Backup resource type label, e.g. `DynamoDB` or `EC2`.
    pub resource_type: String,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct RestoreJob {
    pub job_id: String,
    pub created_resource_arn: String,
}

#[async_trait]
pub trait BackupService: Send + Sync {
    async fn describe_backup_job(&self, job_id: &str) -> Result<BackupJob, ServiceError>;

    async fn describe_restore_job(&self, job_id: &str) -> Result<RestoreJob, ServiceError>;

    async fn get_recovery_point_restore_metadata(
        &self,
        backup_vault_name: &str,
        recovery_point_arn: &str,
    ) -> Result<RestoreMetadata, ServiceError>;

    /// Returns the id of the restore job that was started.
    async fn start_restore_job(
        &self,
        recovery_point_arn: &str,
        iam_role_arn: &str,
        metadata: RestoreMetadata,
    ) -> Result<String, ServiceError>;
}

#[async_trait]
pub trait TableService: Send + Sync {
    /// `Ok(None)` when the table does not exist.
    async fn describe_table_status(
        &self,
        table_name: &str,
    ) -> Result<Option<TableStatus>, ServiceError>;

    async fn delete_table(&self, table_name: &str) -> Result<(), ServiceError>;
}

#[async_trait]
pub trait NotificationPublisher: Send + Sync {
    /// Returns the SNS message id when the service reports one.
    async fn publish(
        &self,
        topic_arn: &str,
        subject: &str,
        message: &str,
    ) -> Result<Option<String>, ServiceError>;
}

pub struct AwsBackupService {
    client: BackupClient,
}

impl AwsBackupService {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: BackupClient::new(config),
        }
    }
}

#[async_trait]
impl BackupService for AwsBackupService {
    async fn describe_backup_job(&self, job_id: &str) -> Result<BackupJob, ServiceError> {
        const OP: &str = "DescribeBackupJob";

        let output = self
            .client
            .describe_backup_job()
            .backup_job_id(job_id)
            .send()
            .await
            .map_err(|e| ServiceError::sdk(OP, e))?;

        Ok(BackupJob {
            job_id: job_id.to_string(),
            recovery_point_arn: output
                .recovery_point_arn()
                .ok_or_else(|| ServiceError::missing(OP, "RecoveryPointArn"))?
                .to_string(),
            iam_role_arn: output
                .iam_role_arn()
                .ok_or_else(|| ServiceError::missing(OP, "IamRoleArn"))?
                .to_string(),
            backup_vault_name: output
                .backup_vault_name()
                .ok_or_else(|| ServiceError::missing(OP, "BackupVaultName"))?
                .to_string(),
            resource_type: output
                .resource_type()
                .ok_or_else(|| ServiceError::missing(OP, "ResourceType"))?
                .to_string(),
        })
    }

    async fn describe_restore_job(&self, job_id: &str) -> Result<RestoreJob, ServiceError> {
        const OP: &str = "DescribeRestoreJob";

        let output = self
            .client
            .describe_restore_job()
            .restore_job_id(job_id)
            .send()
            .await
            .map_err(|e| ServiceError::sdk(OP, e))?;

        let created_resource_arn = output
            .created_resource_arn()
            .ok_or_else(|| ServiceError::missing(OP, "CreatedResourceArn"))?;

        Ok(RestoreJob {
            job_id: job_id.to_string(),
            created_resource_arn: created_resource_arn.to_string(),
        })
    }

    async fn get_recovery_point_restore_metadata(
        &self,
        backup_vault_name: &str,
        recovery_point_arn: &str,
    ) -> Result<RestoreMetadata, ServiceError> {
        const OP: &str = "GetRecoveryPointRestoreMetadata";

        let output = self
            .client
            .get_recovery_point_restore_metadata()
            .backup_vault_name(backup_vault_name)
            .recovery_point_arn(recovery_point_arn)
            .send()
            .await
            .map_err(|e| ServiceError::sdk(OP, e))?;

        output
            .restore_metadata()
            .cloned()
            .ok_or_else(|| ServiceError::missing(OP, "RestoreMetadata"))
    }

    async fn start_restore_job(
        &self,
        recovery_point_arn: &str,
        iam_role_arn: &str,
        metadata: RestoreMetadata,
    ) -> Result<String, ServiceError> {
        const OP: &str = "StartRestoreJob";

        let output = self
            .client
            .start_restore_job()
            .recovery_point_arn(recovery_point_arn)
            .iam_role_arn(iam_role_arn)
            .set_metadata(Some(metadata))
            .send()
            .await
            .map_err(|e| ServiceError::sdk(OP, e))?;

        debug!("StartRestoreJob response: {:?}", output);

        output
            .restore_job_id()
            .map(str::to_string)
            .ok_or_else(|| ServiceError::missing(OP, "RestoreJobId"))
    }
}

pub struct AwsTableService {
    client: DynamoClient,
}

impl AwsTableService {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: DynamoClient::new(config),
        }
    }
}

#[async_trait]
impl TableService for AwsTableService {
    async fn describe_table_status(
        &self,
        table_name: &str,
    ) -> Result<Option<TableStatus>, ServiceError> {
        const OP: &str = "DescribeTable";

        match self
            .client
            .describe_table()
            .table_name(table_name)
            .send()
            .await
        {
            Ok(output) => output
                .table()
                .and_then(|table| table.table_status())
                .cloned()
                .map(Some)
                .ok_or_else(|| ServiceError::missing(OP, "TableStatus")),
            Err(err)
                if err
                    .as_service_error()
                    .is_some_and(|e| e.is_resource_not_found_exception()) =>
            {
                Ok(None)
            }
            Err(err) => Err(ServiceError::sdk(OP, err)),
        }
    }

    async fn delete_table(&self, table_name: &str) -> Result<(), ServiceError> {
        self.client
            .delete_table()
            .table_name(table_name)
            .send()
            .await
            .map_err(|e| ServiceError::sdk("DeleteTable", e))?;

        Ok(())
    }
}

pub struct AwsNotificationPublisher {
    client: SnsClient,
}

impl AwsNotificationPublisher {
    pub fn new(config: &SdkConfig) -> Self {
        Self {
            client: SnsClient::new(config),
        }
    }
}

#[async_trait]
impl NotificationPublisher for AwsNotificationPublisher {
    async fn publish(
        &self,
        topic_arn: &str,
        subject: &str,
        message: &str,
    ) -> Result<Option<String>, ServiceError> {
        let output = self
            .client
            .publish()
            .topic_arn(topic_arn)
            .subject(subject)
            .message(message)
            .send()
            .await
            .map_err(|e| ServiceError::sdk("Publish", e))?;

        Ok(output.message_id().map(str::to_string))
    }
}
