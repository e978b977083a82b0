use crate::core::camera_registry::CameraRegistry;
use crate::core::file_event::{Direction, FileEvent};
use crate::core::heuristics;
use crate::common::timestamp_utils;
use crate::store::counts_log::{CountRecord, JsonlCountsLog};
use anyhow::Result;
use log::{debug, warn};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Tally {
    pub in_count: u64,
    pub out_count: u64,
}

impl Tally {
    pub fn total(&self) -> u64 {
        self.in_count + self.out_count
    }

    fn add(&mut self, direction: Direction) {
        match direction {
            Direction::In => self.in_count += 1,
            Direction::Out => self.out_count += 1,
            Direction::Unknown => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EventOutcome {
    pub direction: Direction,
    /// Filename tokens never seen before this event, sorted.
    pub new_tokens: Vec<String>,
}

/// Turns worker output into counts: classifies, persists, and tallies per camera.
///
/// Meant to be driven by a single task draining the workers' channel, so it needs
/// no internal locking.
pub struct EventProcessor {
    registry: Arc<dyn CameraRegistry>,
    counts_log: JsonlCountsLog,
    tallies: BTreeMap<String, Tally>,
    tokens_seen: BTreeSet<String>,
}

impl EventProcessor {
    pub fn new(registry: Arc<dyn CameraRegistry>, counts_log: JsonlCountsLog) -> Self {
        EventProcessor {
            registry,
            counts_log,
            tallies: BTreeMap::new(),
            tokens_seen: BTreeSet::new(),
        }
    }

    pub async fn handle(&mut self, event: &FileEvent) -> Result<EventOutcome> {
        let camera = match self.registry.find_by_ip(&event.camera_ip) {
            Ok(camera) => camera,
            Err(e) => {
                warn!("⚠️ Camera lookup for {} failed, classifying without it: {:#}", event.camera_ip, e);
                None
            }
        };

        let mut new_tokens: Vec<String> = heuristics::tokenize(&event.raw_name)
            .into_iter()
            .filter(|t| !self.tokens_seen.contains(t))
            .collect();
        new_tokens.sort();
        self.tokens_seen.extend(new_tokens.iter().cloned());

        let direction = heuristics::decide_direction(camera.as_ref(), &event.raw_name);
        self.tallies.entry(event.camera_ip.clone()).or_default().add(direction);

        let camera_name = camera
            .as_ref()
            .filter(|c| !c.name.is_empty())
            .map(|c| c.name.clone())
            .unwrap_or_else(|| event.camera_ip.clone());
        let record = CountRecord {
            ts: timestamp_utils::epoch_seconds(&event.when),
            camera_ip: event.camera_ip.clone(),
            camera_name,
            direction,
            file: event.path_str(),
            raw: event.raw_name.clone(),
        };
        debug!("Counted {} for {} ({})", direction, record.camera_name, record.raw);
        self.counts_log.append(&record).await?;

        Ok(EventOutcome { direction, new_tokens })
    }

    pub fn tally(&self, camera_ip: &str) -> Tally {
        self.tallies.get(camera_ip).copied().unwrap_or_default()
    }

    pub fn tallies(&self) -> &BTreeMap<String, Tally> {
        &self.tallies
    }

    pub fn totals(&self) -> Tally {
        self.tallies.values().fold(Tally::default(), |acc, t| Tally {
            in_count: acc.in_count + t.in_count,
            out_count: acc.out_count + t.out_count,
        })
    }

    pub fn tokens_seen(&self) -> &BTreeSet<String> {
        &self.tokens_seen
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_config::{CameraConfig, Relation};
    use crate::core::camera_registry::StaticRegistry;
    use chrono::Utc;
    use std::path::PathBuf;

    fn event(ip: &str, raw: &str, path: Option<&str>) -> FileEvent {
        FileEvent {
            path: path.map(PathBuf::from),
            camera_ip: ip.to_string(),
            raw_name: raw.to_string(),
            when: Utc::now(),
        }
    }

    #[tokio::test]
    async fn classifies_tallies_and_persists() {
        let dir = tempfile::tempdir().unwrap();
        let mut exit = CameraConfig::new("exit", "10.0.0.2");
        exit.direction = Relation::BToA;
        let registry = Arc::new(StaticRegistry::new(vec![CameraConfig::new("", "10.0.0.1"), exit]));
        let log = JsonlCountsLog::new(dir.path().join("counts.jsonl"));
        let mut processor = EventProcessor::new(registry, log.clone());

        let first = processor
            .handle(&event("10.0.0.1", "LINE_CROSSING_DETECTION.jpg", Some("/x/a.jpg")))
            .await
            .unwrap();
        assert_eq!(first.direction, Direction::In);
        assert_eq!(first.new_tokens, vec!["CROSSING", "DETECTION", "JPG", "LINE"]);

        let second = processor
            .handle(&event("10.0.0.2", "LINE_CROSSING_DETECTION", None))
            .await
            .unwrap();
        assert_eq!(second.direction, Direction::Out);
        assert!(second.new_tokens.is_empty());

        // Unknown camera: no relation to fall back on.
        processor.handle(&event("10.9.9.9", "intrusion", None)).await.unwrap();

        assert_eq!(processor.tally("10.0.0.1"), Tally { in_count: 1, out_count: 0 });
        assert_eq!(processor.tally("10.0.0.2").out_count, 1);
        assert_eq!(processor.totals().total(), 3);
        let seen: Vec<&str> = processor.tokens_seen().iter().map(String::as_str).collect();
        assert_eq!(seen, vec!["CROSSING", "DETECTION", "INTRUSION", "JPG", "LINE"]);

        let rows = log.read_range(0.0, f64::MAX).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].camera_name, "10.0.0.1");
        assert_eq!(rows[0].file, "/x/a.jpg");
        assert_eq!(rows[1].camera_name, "exit");
        assert_eq!(rows[1].file, "");
        assert_eq!(rows[2].direction, Direction::In);
    }
}
