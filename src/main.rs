use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use loan_desk_rs::api::HttpLendingApi;
use loan_desk_rs::config::FrontendConfig;
use loan_desk_rs::shell::{App, Command, Flow, View, HELP};
use loan_desk_rs::{SafeTimeProvider, TimeSource};

#[derive(Parser, Debug)]
#[command(name = "loan-desk", version, about = "Terminal frontend for the lending api")]
struct Cli {
    /// JSON config file; keys missing from it keep their defaults
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Root url of the lending api
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Quiet period before a typed customer id is looked up
    #[arg(long, value_name = "MS")]
    debounce_ms: Option<u64>,

    /// Per-request timeout
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Customer id to open with
    #[arg(long)]
    customer: Option<String>,
}

impl Cli {
    /// defaults, then the config file, then the environment, then flags
    fn resolve_config(&self) -> Result<FrontendConfig> {
        let mut config = match &self.config {
            Some(path) => FrontendConfig::from_json_file(path)?,
            None => FrontendConfig::default(),
        };
        config = config.apply_env()?;
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(ms) = self.debounce_ms {
            config.debounce_ms = ms;
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = Some(secs);
        }
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("loan_desk=info,loan_desk_rs=info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = cli.resolve_config().context("invalid configuration")?;
    let api = HttpLendingApi::new(&config).context("failed to build http client")?;
    tracing::info!(base_url = %api.base_url(), debounce_ms = config.debounce_ms, "loan desk starting");

    let time = Arc::new(SafeTimeProvider::new(TimeSource::System));
    let mut app = App::new(&config, Arc::new(api), time);
    let mut overview = app.subscribe_overview();

    println!("{}", HELP);
    if let Some(customer) = cli.customer.clone() {
        app.handle(Command::Customer(customer)).await;
    }
    prompt()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("failed to read stdin")? else {
                    break;
                };
                match Command::parse(&line) {
                    Ok(command) => match app.handle(command).await {
                        Flow::Quit => break,
                        Flow::Continue(output) => println!("{}", output),
                    },
                    Err(message) => println!("{}", message),
                }
                // the command already printed whatever changed
                overview.borrow_and_update();
                prompt()?;
            }
            changed = overview.changed() => {
                if changed.is_err() {
                    break;
                }
                overview.borrow_and_update();
                if app.view() == View::Overview {
                    println!("\n{}", app.render());
                    prompt()?;
                }
            }
        }
    }

    app.shutdown();
    tracing::info!("loan desk stopped");
    Ok(())
}

fn prompt() -> Result<()> {
    print!("> ");
    std::io::stdout().flush()?;
    Ok(())
}
