use aws_config::BehaviorVersion;
use lambda_runtime::{run, service_fn, Error, LambdaEvent};
use restore_tester::{
    AwsBackupService, AwsNotificationPublisher, AwsTableService, BackupService, Config,
    NotificationPublisher, Response, RestoreTester, TableService,
};
use serde_json::Value;

async fn function_handler<B, T, N>(
    tester: &RestoreTester<B, T, N>,
    event: LambdaEvent<Value>,
) -> Result<Response, Error>
where
    B: BackupService,
    T: TableService,
    N: NotificationPublisher,
{
    Ok(tester.handle(event.payload).await)
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .json()
        .init();

    let config = aws_config::defaults(BehaviorVersion::latest()).load().await;

    let tester = RestoreTester::builder()
        .backup(AwsBackupService::new(&config))
        .tables(AwsTableService::new(&config))
        .publisher(AwsNotificationPublisher::new(&config))
        .config(Config::from_env())
        .build();
    let tester = &tester;

    run(service_fn(move |event: LambdaEvent<Value>| async move {
        function_handler(tester, event).await
    }))
    .await
}
