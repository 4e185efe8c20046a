use crate::cli::InspectArgs;
use s3mirror::config::Config;
use s3mirror::envelope::Envelope;
use s3mirror::queue::{MemoryQueue, QueueMessage};
use s3mirror::aws;
use s3mirror::storage::S3Source;
use s3mirror::worker::{Fetcher, Worker, WorkerSettings};
use std::io::Read;
use std::sync::Arc;

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Print what a message body resolves to; with `--fetch`, push it through the
/// worker against a throwaway queue so nothing on the real queue is touched.
pub async fn run(args: InspectArgs) -> Result<(), AnyError> {
    let body = match &args.file {
        Some(path) => tokio::fs::read_to_string(path).await?,
        None => {
            let mut body = String::new();
            std::io::stdin().read_to_string(&mut body)?;
            body
        }
    };

    let envelope = Envelope::decode(body.trim())?;
    let objects = envelope.objects()?;

    println!("envelope: {}", envelope.kind());
    for object in &objects {
        println!("{}\t{}", object.bucket, object.key);
    }

    if !args.fetch {
        return Ok(());
    }

    let config = Config::load_with(args.config)?;
    let queue = Arc::new(MemoryQueue::new());
    queue
        .push(QueueMessage::new("inspect", "inspect", body.trim()))
        .await;

    let sdk_config = aws::load_sdk_config(&config.storage).await;
    let fetcher = Fetcher::new(
        Arc::new(S3Source::from_sdk_config(&sdk_config, &config.storage)),
        config.download.root.clone(),
    );
    let settings = WorkerSettings {
        wait_time_seconds: 0,
        ..WorkerSettings::from_config(&config)
    };
    let worker = Worker::new(queue, fetcher, settings);

    let report = worker.process_one_batch().await;
    let metrics = worker.metrics().snapshot();
    println!(
        "acknowledged: {}, failed: {}, fetched: {}, missing: {}, bytes: {}",
        report.acknowledged,
        report.failed,
        metrics.objects_fetched,
        metrics.objects_missing,
        metrics.bytes_written
    );

    Ok(())
}
