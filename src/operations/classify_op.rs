use crate::config_loader::MasterConfig;
use crate::core::file_event::Direction;
use crate::core::heuristics::{decide_direction, tokenize};
use anyhow::{anyhow, Result};
use clap::ArgMatches;
use log::info;

pub fn handle_classify_cli(master_config: &MasterConfig, args: &ArgMatches) -> Result<Direction> {
    let raw_name = args
        .get_one::<String>("raw_name")
        .ok_or_else(|| anyhow!("RAW_NAME is required"))?;

    let camera = match args.get_one::<String>("camera") {
        Some(wanted) => Some(
            master_config
                .cameras
                .iter()
                .find(|c| &c.name == wanted || &c.ip == wanted)
                .ok_or_else(|| anyhow!("No camera named '{}' in the configuration", wanted))?,
        ),
        None => None,
    };

    let mut tokens: Vec<String> = tokenize(raw_name).into_iter().collect();
    tokens.sort();
    let direction = decide_direction(camera, raw_name);

    match camera {
        Some(cam) => info!(
            "🔎 '{}' on '{}' (hint {}, {}): tokens [{}] -> {}",
            raw_name,
            cam.label(),
            cam.pattern_hint,
            cam.direction,
            tokens.join(", "),
            direction
        ),
        None => info!("🔎 '{}': tokens [{}] -> {}", raw_name, tokens.join(", "), direction),
    }
    Ok(direction)
}
