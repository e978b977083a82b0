use crate::camera_config::CameraConfig;
use crate::config_loader::MasterConfig;
use crate::core::camera_registry::{parse_camera_names_arg, CameraRegistry, JsonlCameraRegistry, StaticRegistry};
use anyhow::{Context, Result};
use clap::ArgMatches;
use log::{debug, info, warn};
use std::sync::Arc;
use std::time::Instant;

/// Builds the camera registry an operation should run against.
///
/// Cameras come from `--cameras-file` when the subcommand has it and it is set, from the
/// config otherwise. `--cameras` then narrows the list by name or address.
pub fn determine_registry(
    master_config: &MasterConfig,
    args: &ArgMatches,
    operation_display_name: &str,
) -> Result<Arc<dyn CameraRegistry>> {
    let start_time = Instant::now();
    let cameras_file = args
        .try_get_one::<String>("cameras-file")
        .ok()
        .flatten();

    let base = match cameras_file {
        Some(path) => {
            info!("📂 Using legacy camera list '{}' for '{}'.", path, operation_display_name);
            let cameras = JsonlCameraRegistry::new(path)
                .load_all()
                .with_context(|| format!("Failed to load cameras for '{}'", operation_display_name))?;
            StaticRegistry::new(cameras)
        }
        None => StaticRegistry::new(master_config.cameras.clone()),
    };

    let registry = match parse_camera_names_arg(args.get_one::<String>("cameras")) {
        Some(names) => {
            let narrowed = base.filtered(&names);
            if narrowed.load_all()?.len() < names.len() {
                warn!("⚠️ Some of {:?} did not match any configured camera for '{}'.", names, operation_display_name);
            }
            narrowed
        }
        None => base,
    };
    debug!("Determined camera registry for '{}' in {:?}.", operation_display_name, start_time.elapsed());
    Ok(Arc::new(registry))
}

/// Enabled cameras of `registry`, in order.
pub fn enabled_cameras(registry: &dyn CameraRegistry) -> Result<Vec<CameraConfig>> {
    Ok(registry.load_all()?.into_iter().filter(|c| c.enabled).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::build_cli;
    use crate::config_loader::parse_config;

    #[test]
    fn narrows_by_cameras_arg() {
        let cfg = parse_config(
            "cameras:\n  - {name: a, ip: 10.0.0.1}\n  - {name: b, ip: 10.0.0.2, enabled: false}\n  - {name: c, ip: 10.0.0.3}\n",
        )
        .unwrap();
        let matches = build_cli()
            .try_get_matches_from(["rcount", "watch", "--cameras", "b,c"])
            .unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let registry = determine_registry(&cfg, sub, "Watch").unwrap();
        assert_eq!(registry.load_all().unwrap().len(), 2);
        let enabled = enabled_cameras(registry.as_ref()).unwrap();
        assert_eq!(enabled.len(), 1);
        assert_eq!(enabled[0].name, "c");
    }

    #[test]
    fn subcommand_without_cameras_file_uses_config() {
        let cfg = parse_config("cameras:\n  - {name: a, ip: 10.0.0.1}\n").unwrap();
        let matches = build_cli().try_get_matches_from(["rcount", "test"]).unwrap();
        let (_, sub) = matches.subcommand().unwrap();
        let registry = determine_registry(&cfg, sub, "Test").unwrap();
        assert_eq!(registry.load_all().unwrap()[0].name, "a");
    }
}
