use std::path::Path;

use anyhow::Result;
use clap::{Parser, Subcommand};
use dingtalk_client::config::loader::file_to_config;
use dingtalk_client::server;
use dingtalk_client::utils::logging::{self, LogLevel};
use dingtalk_client::DingTalkClient;
use tracing::info;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, env = "CONFIG", default_value = "dingtalk.yaml")]
    config: String,
    #[arg(long, env = "LOG_LEVEL", value_enum)]
    log_level: Option<LogLevel>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print a valid access token
    Token,
    /// Print a valid JS-API ticket
    Ticket,
    /// Print the JS-API handshake mapping as JSON
    JsConfig {
        #[arg(long)]
        nonce: String,
        #[arg(long)]
        timestamp: String,
        #[arg(long)]
        url: String,
    },
    /// Inspect or remove the registered event callback
    Callbacks {
        #[command(subcommand)]
        action: CallbackAction,
    },
    /// Serve /jsapi/config, /healthz and metrics over HTTP
    Serve,
}

#[derive(Subcommand)]
enum CallbackAction {
    List,
    Delete,
}

#[tokio::main]
async fn main() -> Result<()> {
    // -------------------------------
    // 1. Load YAML config, init logging
    // -------------------------------

    let args = Args::parse();
    let service_config = file_to_config(Path::new(&args.config)).await?;
    logging::run(&service_config, args.log_level);

    // -------------------------------
    // 2. Create client
    // -------------------------------

    let client = DingTalkClient::new(service_config.client.clone())?;
    info!("client ready for corp '{}'", client.config().corp_id);

    // -------------------------------
    // 3. Run command
    // -------------------------------

    match args.command {
        Command::Token => println!("{}", client.access_token().await?),
        Command::Ticket => println!("{}", client.get_jsapi_ticket().await?),
        Command::JsConfig { nonce, timestamp, url } => {
            let config = client.get_config(&nonce, &timestamp, &url).await?;
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Callbacks { action: CallbackAction::List } => {
            let callback = client.list_callback().await?;
            println!("url: {}", callback.url);
            let tags: Vec<&str> = callback.callbacks.iter().map(|tag| tag.as_str()).collect();
            println!("tags: {}", tags.join(", "));
        }
        Command::Callbacks { action: CallbackAction::Delete } => {
            client.delete_callback().await?;
            println!("callback deleted");
        }
        Command::Serve => server::server::start(&service_config.settings, client).await?,
    }

    Ok(())
}
