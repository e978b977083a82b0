//! Incremental extraction of `<EventNotificationAlert>` blocks from an ISAPI alert stream.
//!
//! The camera keeps one HTTP response open and writes multipart sections into it, each
//! carrying one XML alert. Chunks arrive at arbitrary boundaries, so the parser owns a
//! buffer and only hands out blocks whose closing tag has been seen.

use log::{debug, warn};
use regex::bytes::Regex;
use std::sync::LazyLock;
use std::time::Instant;

/// Anything beyond this without a complete block is treated as garbage and dropped.
pub const MAX_BUFFER_BYTES: usize = 1 << 20;

const BLOCK_START_TAG: &str = "<EventNotificationAlert";

static EVENT_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<EventNotificationAlert.*?</EventNotificationAlert>").unwrap()
});
static BLOCK_START: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<EventNotificationAlert").unwrap());
static EVENT_TYPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<eventType>([^<]+)</eventType>").unwrap());
static EVENT_STATE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<eventState>([^<]+)</eventState>").unwrap());
static CHANNEL_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)<channelID>([^<]+)</channelID>").unwrap());

/// One alert as read off the wire, before any filtering.
#[derive(Debug, Clone, PartialEq)]
pub struct RawEventRecord {
    /// Trimmed and lowercased.
    pub event_type: String,
    /// Trimmed and lowercased; `"active"` when the block has no state.
    pub event_state: String,
    pub channel_id: Option<u32>,
    pub arrived: Instant,
}

impl RawEventRecord {
    pub fn token(&self) -> String {
        normalize_event_type(&self.event_type)
    }

    pub fn is_active(&self) -> bool {
        self.event_state == "active"
    }
}

/// Collapses vendor event names onto the few tokens the counter cares about.
pub fn normalize_event_type(event_type: &str) -> String {
    let e = event_type.to_lowercase();
    if e.contains("line") && (e.contains("cross") || e.contains("detect")) {
        "LINE_CROSSING_DETECTION".to_string()
    } else if e.contains("regionentrance") || (e.contains("region") && e.contains("entrance")) {
        "REGION_ENTRANCE".to_string()
    } else if e.contains("intrusion") {
        "INTRUSION".to_string()
    } else if e.contains("motion") || e.contains("vmd") {
        "MOTION".to_string()
    } else {
        e.to_uppercase()
    }
}

fn scalar(re: &Regex, block: &[u8]) -> Option<String> {
    re.captures(block)
        .and_then(|caps| caps.get(1))
        .map(|m| String::from_utf8_lossy(m.as_bytes()).trim().to_lowercase())
}

fn parse_block(block: &[u8], arrived: Instant) -> Option<RawEventRecord> {
    let event_type = scalar(&EVENT_TYPE, block).filter(|t| !t.is_empty())?;
    let event_state = scalar(&EVENT_STATE, block).unwrap_or_else(|| "active".to_string());
    let channel_id = scalar(&CHANNEL_ID, block)
        .and_then(|c| c.parse::<u32>().ok())
        .filter(|c| *c > 0);
    Some(RawEventRecord {
        event_type,
        event_state,
        channel_id,
        arrived,
    })
}

#[derive(Debug, Default)]
pub struct AlertStreamParser {
    buf: Vec<u8>,
}

impl AlertStreamParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes held back waiting for the rest of a block.
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Appends `chunk` and returns every record completed by it, in stream order.
    pub fn feed(&mut self, chunk: &[u8]) -> Vec<RawEventRecord> {
        self.buf.extend_from_slice(chunk);
        let arrived = Instant::now();

        let mut records = Vec::new();
        let mut keep_from = 0;
        for m in EVENT_BLOCK.find_iter(&self.buf) {
            keep_from = m.end();
            match parse_block(m.as_bytes(), arrived) {
                Some(record) => records.push(record),
                None => debug!("Skipping alert block without eventType ({} bytes)", m.len()),
            }
        }
        if keep_from > 0 {
            self.buf.drain(..keep_from);
        }
        self.discard_leading_noise();
        records
    }

    // Multipart boundaries and headers sit between blocks; only bytes from the next
    // start tag onwards can ever become part of a block.
    fn discard_leading_noise(&mut self) {
        match BLOCK_START.find(&self.buf) {
            Some(m) if m.start() > 0 => {
                self.buf.drain(..m.start());
            }
            Some(_) => {}
            None => {
                // A start tag may be split across chunks; keep just enough for it.
                let keep = BLOCK_START_TAG.len() - 1;
                if self.buf.len() > keep {
                    self.buf.drain(..self.buf.len() - keep);
                }
            }
        }
        if self.buf.len() > MAX_BUFFER_BYTES {
            warn!(
                "⚠️ Alert stream buffer exceeded {} bytes without a complete block; discarding.",
                MAX_BUFFER_BYTES
            );
            self.buf.clear();
        }
    }
}
