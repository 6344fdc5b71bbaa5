use std::fs::OpenOptions;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::Level;

use mail2tg::config::*;
use mail2tg::server::Server;

#[derive(Parser, Debug)]
#[clap(author, version, about, long_about = None)]
struct Args {
    #[clap(
        short,
        long,
        env = "MAIL2TG_CONFIG",
        default_value = "mail2tg.toml"
    )]
    /// Path to the mail2tg configuration file
    config_file: PathBuf,
}

fn tracer(logging: &LoggingConfig) -> Result<()> {
    let level = if logging.debug {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = tracing_subscriber::fmt().with_max_level(level);

    match logging.file() {
        None => {
            subscriber.init();
            tracing::info!("No logging.file defined in config, outputting to stdout");
        }
        Some(path) => {
            let file = OpenOptions::new()
                .append(true)
                .create(true)
                .open(path)
                .with_context(|| format!("unable to open log file {:?}", path))?;
            subscriber
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Abort on panic
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("{}", panic_info);
        eprintln!("{:?}", backtrace::Backtrace::new());
        std::process::abort();
    }));

    let args = Args::parse();
    let config = read_config(args.config_file)?;
    tracer(&config.logging)?;

    let server = Server::from_config(config).await?;
    server.run().await?;

    Ok(())
}
