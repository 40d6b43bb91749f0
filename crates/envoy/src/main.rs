mod client;
mod config;
mod credentials;
mod logging;
mod navigation;
mod scroll;
mod ui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use client::ApiClient;
use config::Config;
use courier_session::{Credential, SessionGate, TOKEN_KEY};
use credentials::FileCredentialStore;
use navigation::TerminalNavigator;

#[derive(Parser)]
#[command(name = "courier", version, about = "Terminal chat with a remote assistant")]
struct Cli {
    /// Server base URL, overriding the config file
    #[arg(long, env = "COURIER_SERVER_URL", global = true)]
    server: Option<String>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Open the chat screen (default)
    Chat,
    /// Send a single message and print the reply
    Send { message: String },
    /// Print the conversation so far
    History,
    /// Store the bearer token used for every request
    Login {
        #[arg(long)]
        token: String,
    },
    /// Forget the stored token
    Logout,
    /// Show or change configuration
    Config {
        #[command(subcommand)]
        action: Option<ConfigAction>,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Set { key: ConfigKey, value: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum ConfigKey {
    Server,
    Timeout,
    Placeholder,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let command = cli.command.unwrap_or(Command::Chat);
    match &command {
        Command::Chat => logging::init_file(&Config::dir()?.join("courier.log"))?,
        _ => logging::init_stderr()?,
    }

    let mut config = Config::load().context("Failed to load config")?;

    match command {
        Command::Config { action: None } => print_config(&config),
        Command::Config {
            action: Some(ConfigAction::Set { key, value }),
        } => set_config(&mut config, key, value)?,
        Command::Login { token } => {
            let store = FileCredentialStore::open_default()?;
            store.set(TOKEN_KEY, token.trim())?;
            println!("Token saved to {}", store.path().display());
        }
        Command::Logout => {
            FileCredentialStore::open_default()?.remove(TOKEN_KEY)?;
            println!("Signed out.");
        }
        Command::Send { message } => {
            if let Some((client, credential)) = open_session(&config, cli.server)? {
                ui::single_message(client, credential, &config, message).await?;
            }
        }
        Command::History => {
            if let Some((client, credential)) = open_session(&config, cli.server)? {
                ui::print_history(client, credential).await?;
            }
        }
        Command::Chat => {
            if let Some((client, credential)) = open_session(&config, cli.server)? {
                ui::interactive_chat(client, credential, &config).await?;
            }
        }
    }

    Ok(())
}

/// Runs the session gate; `None` means the user was sent to `login`.
fn open_session(config: &Config, server: Option<String>) -> Result<Option<(ApiClient, Credential)>> {
    let store = FileCredentialStore::open_default()?;
    let Some(credential) = SessionGate::new(&store, &TerminalNavigator).check_access() else {
        return Ok(None);
    };

    let server_url = server.unwrap_or_else(|| config.server_url.clone());
    let client = ApiClient::new(server_url, config.request_timeout())?;
    Ok(Some((client, credential)))
}

fn print_config(config: &Config) {
    println!("Current config:");
    println!("  Server URL: {}", config.server_url);
    match config.request_timeout_secs {
        Some(secs) => println!("  Request timeout: {}s", secs),
        None => println!("  Request timeout: none"),
    }
    println!("  Typing placeholder: {}", config.typing_placeholder);
}

fn set_config(config: &mut Config, key: ConfigKey, value: String) -> Result<()> {
    match key {
        ConfigKey::Server => config.server_url = value,
        ConfigKey::Timeout => {
            config.request_timeout_secs = match value.as_str() {
                "none" | "0" => None,
                secs => Some(secs.parse().context("Timeout must be a number of seconds or 'none'")?),
            };
        }
        ConfigKey::Placeholder => config.typing_placeholder = value,
    }
    config.save()?;
    print_config(config);
    Ok(())
}
