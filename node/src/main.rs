use std::env;

use anyhow::Context;
use log::info;
use orchestrator::RunConfig;

const BANNER: &str = "=========================================================";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();

    let path = env::args().nth(1).or_else(|| env::var("CONFIG").ok());
    let config = match path {
        Some(path) => {
            info!("loading config from {path}");
            RunConfig::from_json_file(&path).with_context(|| format!("reading config {path}"))?
        }
        None => {
            info!("no config given, running the defaults");
            RunConfig::default()
        }
    };

    let outcome = orchestrator::run(config).await.context("run failed")?;

    println!("{BANNER}");
    print!("{outcome}");
    println!("{BANNER}");
    Ok(())
}
