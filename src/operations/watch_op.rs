use crate::camera::{IsapiEventSource, WorkerSettings};
use crate::common::{file_utils, timestamp_utils};
use crate::config_loader::MasterConfig;
use crate::core::event_processor::EventProcessor;
use crate::core::event_source::{EventSource, FileCallback, LogCallback};
use crate::core::file_event::FileEvent;
use crate::operations::op_helper;
use crate::store::counts_log::JsonlCountsLog;
use crate::store::image_store::LocalImageStore;
use anyhow::{Context, Result};
use chrono::Utc;
use clap::ArgMatches;
use log::{debug, error, info, warn};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Drains worker detections into the processor until every sender is gone.
pub fn spawn_aggregator(
    mut processor: EventProcessor,
    mut events: mpsc::UnboundedReceiver<FileEvent>,
    on_log: LogCallback,
) -> JoinHandle<EventProcessor> {
    tokio::spawn(async move {
        while let Some(event) = events.recv().await {
            match processor.handle(&event).await {
                Ok(outcome) => {
                    let tally = processor.tally(&event.camera_ip);
                    info!(
                        "🚶 {} {} [{}] (in {} / out {})",
                        event.camera_ip,
                        outcome.direction,
                        event.raw_name,
                        tally.in_count,
                        tally.out_count
                    );
                    if !outcome.new_tokens.is_empty() {
                        on_log(format!("Filename tokens seen: {}", outcome.new_tokens.join(", ")));
                    }
                }
                Err(e) => error!("❌ Failed to record event from {}: {:#}", event.camera_ip, e),
            }
        }
        processor
    })
}

/// Writes every log-sink line to `path`, timestamped, and mirrors it at info level.
pub fn spawn_log_writer(path: PathBuf, mut lines: mpsc::UnboundedReceiver<String>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut file = match OpenOptions::new().create(true).append(true).open(&path).await {
            Ok(f) => Some(f),
            Err(e) => {
                warn!("⚠️ Event log '{}' unavailable, logging to console only: {}", path.display(), e);
                None
            }
        };
        while let Some(line) = lines.recv().await {
            info!("{}", line);
            if let Some(f) = file.as_mut() {
                let stamped = format!(
                    "{} {}\n",
                    timestamp_utils::current_local_timestamp_str("%Y-%m-%d %H:%M:%S"),
                    line
                );
                if let Err(e) = f.write_all(stamped.as_bytes()).await {
                    warn!("⚠️ Failed to append to event log '{}': {}", path.display(), e);
                }
            }
        }
        if let Some(mut f) = file {
            let _ = f.flush().await;
        }
    })
}

fn spawn_purger(store: LocalImageStore, retention: Duration, every: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(every);
        loop {
            ticker.tick().await;
            if let Err(e) = store.purge_older_than(retention).await {
                warn!("⚠️ Image purge failed: {}", e);
            }
        }
    })
}

pub async fn handle_watch_cli(master_config: &MasterConfig, args: &ArgMatches) -> Result<()> {
    let op_start_time = Instant::now();
    let session_start = timestamp_utils::epoch_seconds(&Utc::now());
    let app = &master_config.app_settings;

    let data_dir = file_utils::ensure_output_directory(&PathBuf::from(&app.data_directory))
        .context("Failed to prepare data directory")?;
    debug!("Data directory: {}", data_dir.display());
    let image_store = LocalImageStore::new(app.events_dir()).context("Failed to prepare image store")?;

    let registry = op_helper::determine_registry(master_config, args, "Watch")?;
    let enabled = op_helper::enabled_cameras(registry.as_ref())?.len();
    if enabled == 0 {
        warn!("⚠️ No enabled cameras to watch.");
        return Ok(());
    }

    let (event_tx, event_rx) = mpsc::unbounded_channel::<FileEvent>();
    let (log_tx, log_rx) = mpsc::unbounded_channel::<String>();
    let on_file: FileCallback = Arc::new(move |event| {
        let _ = event_tx.send(event);
    });
    let on_log: LogCallback = Arc::new(move |line| {
        let _ = log_tx.send(line);
    });

    let log_writer = spawn_log_writer(app.event_log_path(), log_rx);
    let counts_log = JsonlCountsLog::new(app.counts_log_path());
    let processor = EventProcessor::new(Arc::clone(&registry), counts_log.clone());
    let aggregator = spawn_aggregator(processor, event_rx, Arc::clone(&on_log));
    let purger = spawn_purger(
        image_store.clone(),
        app.image_retention(),
        Duration::from_secs(app.purge_interval_secs.max(1)),
    );

    let stop_wait = Duration::from_millis(app.stop_timeout_ms);
    let mut source = IsapiEventSource::new(
        registry,
        Arc::new(image_store),
        WorkerSettings::from_app_config(app),
    )
    .with_stop_wait(stop_wait);

    source.start(Arc::clone(&on_file), Arc::clone(&on_log)).await;
    info!("👀 Watching {} camera(s) via {}. Press Ctrl-C to stop.", source.worker_count(), source.get_type());

    tokio::signal::ctrl_c().await.context("Failed to listen for Ctrl-C")?;
    info!("🛑 Stop requested, shutting down workers...");
    for (ip, state) in source.worker_states() {
        debug!("ISAPI [{}]: {:?} at shutdown", ip, state);
    }
    source.stop().await;
    purger.abort();

    // The channels close once the last worker-held callback clone is dropped.
    drop(on_file);
    drop(on_log);
    drop(source);

    match tokio::time::timeout(stop_wait * 2, aggregator).await {
        Ok(Ok(processor)) => {
            for (ip, tally) in processor.tallies() {
                info!("📊 {}: IN {} / OUT {} / TOTAL {}", ip, tally.in_count, tally.out_count, tally.total());
            }
            let totals = processor.totals();
            info!("📊 All cameras: IN {} / OUT {} / TOTAL {}", totals.in_count, totals.out_count, totals.total());
            let tokens: Vec<&str> = processor.tokens_seen().iter().map(String::as_str).collect();
            debug!("Filename tokens this session: {}", tokens.join(", "));
        }
        Ok(Err(e)) => error!("💀 Aggregator task failed: {}", e),
        Err(_) => warn!("⚠️ Aggregator did not drain in time; totals not shown."),
    }
    match counts_log
        .read_range(session_start, timestamp_utils::epoch_seconds(&Utc::now()))
        .await
    {
        Ok(records) => info!(
            "📒 {} count record(s) written to {} since {}.",
            records.len(),
            counts_log.path().display(),
            timestamp_utils::format_epoch_local(session_start)
        ),
        Err(e) => warn!("⚠️ Could not read back the counts log: {:#}", e),
    }
    if tokio::time::timeout(stop_wait, log_writer).await.is_err() {
        warn!("⚠️ Event log writer did not finish in time.");
    }

    info!("🏁 Watch finished after {:?}.", op_start_time.elapsed());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_config::{CameraConfig, Relation};
    use crate::core::camera_registry::StaticRegistry;
    use std::sync::Mutex;

    fn detection(ip: &str, raw: &str) -> FileEvent {
        FileEvent {
            path: None,
            camera_ip: ip.to_string(),
            raw_name: raw.to_string(),
            when: Utc::now(),
        }
    }

    #[tokio::test]
    async fn aggregator_counts_until_senders_close() {
        let dir = tempfile::tempdir().unwrap();
        let mut exit = CameraConfig::new("exit", "10.0.0.2");
        exit.direction = Relation::BToA;
        let registry = Arc::new(StaticRegistry::new(vec![CameraConfig::new("door", "10.0.0.1"), exit]));
        let processor = EventProcessor::new(registry, JsonlCountsLog::new(dir.path().join("counts.jsonl")));

        let lines = Arc::new(Mutex::new(Vec::<String>::new()));
        let captured = Arc::clone(&lines);
        let on_log: LogCallback = Arc::new(move |l| captured.lock().unwrap().push(l));
        let (tx, rx) = mpsc::unbounded_channel();
        let aggregator = spawn_aggregator(processor, rx, on_log);

        tx.send(detection("10.0.0.1", "LINE_CROSSING_DETECTION.jpg")).unwrap();
        tx.send(detection("10.0.0.2", "LINE_CROSSING_DETECTION.jpg")).unwrap();
        tx.send(detection("10.0.0.2", "LINE_CROSSING_DETECTION.jpg")).unwrap();
        drop(tx);

        let processor = aggregator.await.unwrap();
        assert_eq!(processor.tally("10.0.0.1").in_count, 1);
        assert_eq!(processor.tally("10.0.0.2").out_count, 2);
        assert_eq!(processor.totals().total(), 3);
        // Tokens are announced only the first time they show up.
        let lines = lines.lock().unwrap();
        assert_eq!(lines.iter().filter(|l| l.starts_with("Filename tokens seen")).count(), 1);
    }

    #[tokio::test]
    async fn log_writer_appends_stamped_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("events.log");
        let (tx, rx) = mpsc::unbounded_channel();
        let writer = spawn_log_writer(path.clone(), rx);
        tx.send("ISAPI started for 1 cameras".to_string()).unwrap();
        drop(tx);
        writer.await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        assert!(content.trim_end().ends_with(" ISAPI started for 1 cameras"));
    }
}
