use anyhow::Result;
use clap::Parser;
use efilabel::boot::{self, RenameCli};
use efilabel::config::{AppConfig, CONFIG_FILE};
use log::{error, info};

#[derive(Parser)]
#[command(name = "efilabel")]
#[command(about = "Rename a UEFI boot entry", long_about = None)]
struct Cli {
    #[command(flatten)]
    rename: RenameCli,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,

    /// Generate configuration file (.efilabel.toml) in current directory
    #[arg(long)]
    gen_config: bool,

    /// Force overwrite existing configuration file
    #[arg(long, requires = "gen_config")]
    force: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Default info level (debug with --debug), display file line number and time
    let default_level = if cli.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .format(|buf, record| {
            use std::io::Write;
            let level_style = buf.default_level_style(record.level());
            writeln!(
                buf,
                "[{} {level_style}{}{level_style:#} {}:{}] {level_style}{}{level_style:#}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                record.target(),
                record.line().unwrap_or(0),
                record.args()
            )
        })
        .init();

    if cli.gen_config {
        return AppConfig::generate_config_file(CONFIG_FILE, cli.force);
    }

    let app_config = if std::path::Path::new(CONFIG_FILE).exists() {
        match AppConfig::load_from_file(CONFIG_FILE) {
            Ok(cfg) => {
                let abs_path = std::fs::canonicalize(CONFIG_FILE)
                    .unwrap_or_else(|_| std::path::PathBuf::from(CONFIG_FILE));
                info!("Using configuration file: {}", abs_path.display());
                Some(cfg)
            }
            Err(e) => {
                error!("Failed to load configuration file: {}, using defaults", e);
                None
            }
        }
    } else {
        None
    };

    boot::run(cli.rename, app_config)
}
