use serde::{Deserialize, Serialize};
use std::fmt;

/// Snapshot channel used when neither the event nor the config names one.
pub const DEFAULT_SNAPSHOT_CHANNEL: u32 = 101;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scheme {
    #[default]
    Http,
    Https,
}

impl Scheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            Scheme::Http => "http",
            Scheme::Https => "https",
        }
    }
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the camera's A/B sides map onto the counted directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
pub enum Relation {
    #[default]
    #[serde(rename = "A->B")]
    AToB,
    #[serde(rename = "A<-B")]
    BToA,
    #[serde(rename = "A<->B")]
    Both,
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Relation::AToB => "A->B",
            Relation::BToA => "A<-B",
            Relation::Both => "A<->B",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AuthMode {
    #[default]
    Digest,
    Basic,
}

/// One camera as handed to a worker. Never mutated once a worker owns a copy.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(from = "CameraConfigRecord")]
pub struct CameraConfig {
    pub name: String,
    pub ip: String,
    pub brand: String,
    pub login: String,
    pub password: String,
    pub scheme: Scheme,
    pub auth: AuthMode,
    pub direction: Relation,
    pub pattern_hint: String,
    pub snap_channel: u32,
    pub enabled: bool,
}

impl CameraConfig {
    pub fn new(name: &str, ip: &str) -> Self {
        CameraConfigRecord {
            name: name.to_string(),
            ip: ip.to_string(),
            ..CameraConfigRecord::default()
        }
        .into()
    }

    /// Display label: the name when set, the address otherwise.
    pub fn label(&self) -> &str {
        if self.name.is_empty() {
            &self.ip
        } else {
            &self.name
        }
    }

    pub fn base_url(&self) -> String {
        format!("{}://{}", self.scheme, self.ip.trim_end_matches('/'))
    }
}

/// On-disk shape of a camera entry. Every field older configs may lack carries its
/// default here so that read sites never need to fall back themselves.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
struct CameraConfigRecord {
    name: String,
    #[serde(alias = "address")]
    ip: String,
    brand: String,
    #[serde(alias = "username")]
    login: String,
    password: String,
    scheme: Option<Scheme>,
    // Written by early builds before `scheme` existed.
    use_https: Option<bool>,
    auth: AuthMode,
    direction: Relation,
    pattern_hint: String,
    snap_channel: Option<u32>,
    enabled: bool,
}

impl Default for CameraConfigRecord {
    fn default() -> Self {
        CameraConfigRecord {
            name: String::new(),
            ip: String::new(),
            brand: "Hikvision".to_string(),
            login: "admin".to_string(),
            password: String::new(),
            scheme: None,
            use_https: None,
            auth: AuthMode::Digest,
            direction: Relation::AToB,
            pattern_hint: "LINE_CROSSING_DETECTION".to_string(),
            snap_channel: None,
            enabled: true,
        }
    }
}

impl From<CameraConfigRecord> for CameraConfig {
    fn from(r: CameraConfigRecord) -> Self {
        let scheme = match (r.scheme, r.use_https) {
            (Some(s), _) => s,
            (None, Some(true)) => Scheme::Https,
            _ => Scheme::Http,
        };
        CameraConfig {
            name: r.name,
            ip: r.ip,
            brand: r.brand,
            login: r.login,
            password: r.password,
            scheme,
            auth: r.auth,
            direction: r.direction,
            pattern_hint: r.pattern_hint,
            snap_channel: r.snap_channel.filter(|c| *c > 0).unwrap_or(DEFAULT_SNAPSHOT_CHANNEL),
            enabled: r.enabled,
        }
    }
}
