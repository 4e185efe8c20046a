use s3mirror::aws;
use s3mirror::config::Config;
use s3mirror::health::{self, HealthState};
use s3mirror::observability::Metrics;
use s3mirror::queue::SqsQueue;
use s3mirror::storage::S3Source;
use s3mirror::worker::{Fetcher, Worker, WorkerSettings};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::{JoinError, JoinHandle};
use tracing::{error, info};

type AnyError = Box<dyn std::error::Error + Send + Sync + 'static>;

enum Exit {
    Signal,
    Worker(Result<(), JoinError>),
    Health(Result<std::io::Result<()>, JoinError>),
}

/// Run the worker (and the health endpoint when configured) until a shutdown
/// signal arrives.
///
/// Both run as tasks under a guard: if either ends on its own, by panic or
/// error, the process logs the fault, waits `worker.restart_delay_ms` and
/// exits with status 1 so the supervisor starts a fresh instance.
pub async fn run(config: Config) -> Result<(), AnyError> {
    let restart_delay = config.worker.restart_delay();

    tokio::fs::create_dir_all(&config.download.root).await?;

    let sdk_config = aws::load_sdk_config(&config.storage).await;
    let queue = Arc::new(SqsQueue::from_sdk_config(&sdk_config, &config.queue));
    let source = Arc::new(S3Source::from_sdk_config(&sdk_config, &config.storage));
    let fetcher = Fetcher::new(source, config.download.root.clone());
    let metrics = Arc::new(Metrics::new());

    let worker = Arc::new(
        Worker::new(queue, fetcher, WorkerSettings::from_config(&config))
            .with_metrics(metrics.clone()),
    );

    info!(
        worker_id = %worker.id(),
        queue_url = %config.queue.url,
        root = %config.download.root.display(),
        "Starting s3mirror"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);

    let mut worker_task = tokio::spawn({
        let worker = worker.clone();
        let shutdown = shutdown_rx.clone();
        async move { worker.run(shutdown).await }
    });

    let mut health_task = config.health.bind_addr.map(|address| {
        let state = HealthState::new(worker.id(), metrics.clone());
        tokio::spawn(health::serve(address, state, shutdown_rx.clone()))
    });

    let exit = wait_for_exit(shutdown_signal(), &mut worker_task, &mut health_task).await;

    match fault_reason(&exit) {
        None => {
            info!("Shutdown requested, finishing in-flight batch");
            let _ = shutdown_tx.send(true);

            if let Err(e) = worker_task.await {
                error!(error = %e, "Worker task ended abnormally during shutdown");
            }
            if let Some(task) = health_task {
                if let Ok(Err(e)) = task.await {
                    error!(error = %e, "Health endpoint ended with error during shutdown");
                }
            }

            info!("Shutdown complete");
            Ok(())
        }
        Some(reason) => restart(&reason, restart_delay).await,
    }
}

/// Whichever comes first: the shutdown signal or either task ending on its own
async fn wait_for_exit(
    signal: impl Future<Output = ()>,
    worker_task: &mut JoinHandle<()>,
    health_task: &mut Option<JoinHandle<std::io::Result<()>>>,
) -> Exit {
    let health_exit = async {
        match health_task.as_mut() {
            Some(task) => task.await,
            None => std::future::pending().await,
        }
    };

    tokio::select! {
        _ = signal => Exit::Signal,
        result = worker_task => Exit::Worker(result),
        result = health_exit => Exit::Health(result),
    }
}

/// `None` for an orderly shutdown, otherwise why the process must restart.
/// The worker loop only returns once shutdown is requested, so any worker exit
/// is a fault.
fn fault_reason(exit: &Exit) -> Option<String> {
    match exit {
        Exit::Signal => None,
        Exit::Worker(Ok(())) => Some("worker loop returned unexpectedly".to_string()),
        Exit::Worker(Err(e)) => Some(format!("worker task failed: {e}")),
        Exit::Health(Ok(Ok(()))) => Some("health endpoint stopped unexpectedly".to_string()),
        Exit::Health(Ok(Err(e))) => Some(format!("health endpoint failed: {e}")),
        Exit::Health(Err(e)) => Some(format!("health task failed: {e}")),
    }
}

async fn restart(reason: &str, delay: Duration) -> Result<(), AnyError> {
    error!(
        reason,
        delay_ms = delay.as_millis() as u64,
        "Unrecoverable fault, exiting for restart"
    );
    tokio::time::sleep(delay).await;
    std::process::exit(1)
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        let mut sigterm = signal(SignalKind::terminate())
            .expect("failed to install signal handler");
        sigterm.recv().await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("Shutdown signal received");
}
