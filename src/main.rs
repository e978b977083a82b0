use rcount::common::logging_setup;
use rcount::{cli, config_loader, operations};
use log::{info, error, debug};
use anyhow::{Context, Result, bail};
use std::time::Instant;

#[tokio::main]
async fn main() -> Result<()> {
    let main_start_time = Instant::now();
    // Parse CLI arguments early for potential use in logging or config path
    let matches = cli::build_cli().get_matches();

    let config_path = matches.get_one::<String>("config").map(|s| s.as_str()).unwrap_or("config/rcount.yaml");

    let master_config = match config_loader::load_config(config_path) {
        Ok(cfg) => {
            logging_setup::initialize_logging(Some(&cfg), &matches);
            info!("✅ Configuration loaded from: {}", config_path);
            cfg
        }
        Err(e) => {
            logging_setup::initialize_logging(None, &matches);
            error!("❌ Failed to load master configuration from '{}': {:#}. Exiting.", config_path, e);
            return Err(e.context(format!("Failed to load master configuration from '{}'", config_path)));
        }
    };

    info!("🚀 RCount starting with {} cameras configured.", master_config.cameras.len());

    if let Some((operation_name, sub_matches)) = matches.subcommand() {
        debug!("🎬 Dispatching to subcommand: {}", operation_name);
        let op_start_time = Instant::now();

        let op_result: Result<()> = match operation_name {
            "watch" => operations::watch_op::handle_watch_cli(&master_config, sub_matches).await,
            "test" => operations::diagnostic_op::handle_diagnostic_cli(&master_config, sub_matches).await,
            "classify" => operations::classify_op::handle_classify_cli(&master_config, sub_matches)
                .map(|direction| println!("{}", direction)),
            other => bail!("Subcommand '{}' not implemented.", other),
        };

        if let Err(e) = op_result {
            error!("❌ Operation '{}' failed after {:?}: {:#}", operation_name, op_start_time.elapsed(), e);
            return Err(e).context(format!("Operation '{}' failed", operation_name));
        }
        info!("✅ Operation '{}' completed successfully in {:?}.", operation_name, op_start_time.elapsed());
    } else {
        info!("🤔 No subcommand provided. Try `rcount watch` or `rcount --help`.");
    }

    info!("🏁 RCount finished in {:?}.", main_start_time.elapsed());
    Ok(())
}
