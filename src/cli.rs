use clap::{Arg, Command, ArgAction};

pub fn build_cli() -> Command {
    Command::new("rcount")
        .version("0.1.0")
        .author("RCount Developers")
        .about("Counts people crossing IP camera detection lines from ISAPI alert streams.")
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .value_name("FILE")
                .help("Sets a custom configuration file")
                .action(ArgAction::Set)
        )
        .arg(
            Arg::new("debug")
                .short('d')
                .long("debug")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue)
        )
        .subcommand(
            Command::new("watch")
                .about("Streams events from all enabled cameras and records counts until Ctrl-C")
                .arg(Arg::new("cameras").long("cameras").value_name("CAM_NAMES").help("Comma-separated list of camera names or addresses to watch (default: all)").action(ArgAction::Set))
                .arg(Arg::new("cameras-file").long("cameras-file").value_name("FILE").help("Read cameras from a legacy JSON-lines file instead of the config").action(ArgAction::Set))
        )
        .subcommand(
            Command::new("test")
                .about("Checks that every enabled camera answers on its alert stream")
                .arg(Arg::new("cameras").long("cameras").value_name("CAM_NAMES").help("Comma-separated list of camera names or addresses to test (default: all)").action(ArgAction::Set))
        )
        .subcommand(
            Command::new("classify")
                .about("Prints the direction a raw event name would be counted as")
                .arg(Arg::new("raw_name").value_name("RAW_NAME").required(true).help("Event token or stored filename, e.g. LINE_CROSSING_DETECTION.jpg").action(ArgAction::Set))
                .arg(Arg::new("camera").long("camera").value_name("CAM_NAME").help("Apply this camera's hint and relation").action(ArgAction::Set))
        )
}
