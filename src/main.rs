use std::io::BufRead;
use std::path::PathBuf;
use std::process::ExitCode;

use autha_ldap::config::DEFAULT_CONFIG_PATH;
use autha_ldap::{
    AuthConnector, Configuration, Identity, LoginResult, PasswordConnector,
    RefreshConnector, Scopes, telemetry,
};
use clap::{Parser, Subcommand};

/// Environment variable holding the password for `login`.
const PASSWORD_ENV: &str = "LDAP_PASSWORD";

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the connector configuration.
    #[arg(long, short, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand, Debug, Clone)]
enum Commands {
    /// Check a password and print the identity.
    Login {
        #[arg(long, short)]
        username: String,
        /// Resolve group memberships.
        #[arg(long)]
        groups: bool,
        /// Attach refresh state to the identity.
        #[arg(long)]
        offline: bool,
    },
    /// Refresh an identity printed by `login --offline`.
    Refresh {
        /// File holding the identity JSON.
        #[arg(long, short)]
        identity: PathBuf,
        /// Resolve group memberships.
        #[arg(long)]
        groups: bool,
    },
    /// Validate the configuration without contacting the server.
    Check,
}

#[tokio::main]
async fn main() -> ExitCode {
    telemetry::init();
    telemetry::describe_metrics();

    let args = Args::parse();
    match run(args).await {
        Ok(code) => code,
        Err(error) => {
            tracing::error!(%error, "command failed");
            ExitCode::FAILURE
        },
    }
}

async fn run(args: Args) -> Result<ExitCode, Box<dyn std::error::Error>> {
    let config = Configuration::read(&args.config)?;
    let connector = AuthConnector::open(&config)?;

    match args.cmd {
        Commands::Login {
            username,
            groups,
            offline,
        } => {
            let password = read_password()?;
            let scopes = Scopes {
                groups,
                offline_access: offline,
            };

            match connector.login(scopes, &username, &password).await? {
                LoginResult::Authenticated(identity) => {
                    println!("{}", serde_json::to_string_pretty(&identity)?);
                },
                LoginResult::InvalidCredentials => {
                    println!("invalid credentials");
                    return Ok(ExitCode::FAILURE);
                },
            }
        },
        Commands::Refresh { identity, groups } => {
            let content = std::fs::read(&identity)?;
            let identity: Identity = serde_json::from_slice(&content)?;
            let scopes = Scopes {
                groups,
                offline_access: true,
            };

            let refreshed = connector.refresh(scopes, identity).await?;
            println!("{}", serde_json::to_string_pretty(&refreshed)?);
        },
        Commands::Check => {
            println!("configuration {:?} is valid", args.config);
        },
    }

    Ok(ExitCode::SUCCESS)
}

/// Password from the environment, or else the first line of stdin.
fn read_password() -> std::io::Result<String> {
    if let Ok(password) = std::env::var(PASSWORD_ENV) {
        return Ok(password);
    }

    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    Ok(line.trim_end_matches(['\r', '\n']).to_owned())
}
