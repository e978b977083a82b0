use crate::camera::isapi_client::{HttpTimeouts, IsapiClient};
use crate::config_loader::MasterConfig;
use crate::errors::AppError;
use crate::operations::op_helper;
use anyhow::Result;
use clap::ArgMatches;
use futures::future::join_all;
use log::{debug, error, info, warn};
use reqwest::StatusCode;
use std::time::{Duration, Instant};

pub const PROBE_TIMEOUT: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeResult {
    Reachable(String),
    Issue(String),
}

/// 200 is fine, 401/403 still proves the camera is there, anything else is an issue.
pub fn classify_probe(ip: &str, result: Result<StatusCode, AppError>) -> ProbeResult {
    match result {
        Ok(status) if status.is_success() => ProbeResult::Reachable(ip.to_string()),
        Ok(status) if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN => {
            ProbeResult::Reachable(format!("{} (auth?)", ip))
        }
        Ok(status) => ProbeResult::Issue(format!("{} (HTTP {})", ip, status.as_u16())),
        Err(e) => ProbeResult::Issue(format!("{} ({})", ip, e)),
    }
}

pub async fn handle_diagnostic_cli(master_config: &MasterConfig, args: &ArgMatches) -> Result<()> {
    let overall_diag_start_time = Instant::now();
    info!("🩺 Probing camera alert streams...");

    let registry = op_helper::determine_registry(master_config, args, "Test")?;
    let cameras = op_helper::enabled_cameras(registry.as_ref())?;
    if cameras.is_empty() {
        warn!("⚠️ DIAGNOSTIC: No enabled cameras configured.");
        return Ok(());
    }

    let timeouts = HttpTimeouts::from_app_config(&master_config.app_settings);
    let accept_invalid_certs = master_config.app_settings.accept_invalid_certs;
    let tasks = cameras.into_iter().map(|camera| {
        tokio::spawn(async move {
            let ip = camera.ip.clone();
            let result = match IsapiClient::new(camera, timeouts, accept_invalid_certs) {
                Ok(client) => client.probe_alert_stream(PROBE_TIMEOUT).await,
                Err(e) => Err(e),
            };
            debug!("  DIAGNOSTIC [{}]: {:?}", ip, result);
            classify_probe(&ip, result)
        })
    });

    let mut reachable = Vec::new();
    let mut issues = Vec::new();
    for joined in join_all(tasks).await {
        match joined {
            Ok(ProbeResult::Reachable(s)) => reachable.push(s),
            Ok(ProbeResult::Issue(s)) => issues.push(s),
            Err(join_err) => {
                error!("💀 Probe task failed: {:#}", join_err);
                issues.push(format!("probe task failed ({})", join_err));
            }
        }
    }

    let dash = |v: &Vec<String>| if v.is_empty() { "—".to_string() } else { v.join(", ") };
    info!("✅ Reachable: {}", dash(&reachable));
    if issues.is_empty() {
        info!("Issues: —");
    } else {
        warn!("❌ Issues: {}", dash(&issues));
    }
    info!("🏁 Probe finished in {:?}.", overall_diag_start_time.elapsed());
    Ok(())
}
