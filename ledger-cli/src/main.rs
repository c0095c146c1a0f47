//! Ledger CLI
//!
//! Command-line interface for the Ledger API.

use anyhow::Result;
use clap::{Parser, Subcommand};

use ledger_client::LedgerClient;

#[derive(Parser)]
#[command(name = "ledger")]
#[command(author, version, about = "Ledger API CLI client", long_about = None)]
struct Cli {
    /// Base URL of the Ledger API
    #[arg(long, env = "LEDGER_API_URL", default_value = "http://localhost:3000")]
    api_url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API health
    Health,
    /// List all accounts with their balances
    Accounts,
    /// Transfer funds between two accounts of the same currency
    Transfer {
        /// Account to debit
        #[arg(long)]
        from: String,
        /// Account to credit
        #[arg(long)]
        to: String,
        /// Amount in minor units (e.g., cents)
        #[arg(long)]
        amount: i64,
    },
    /// Show the payments sent and received by an account
    Payments {
        /// Account identifier
        account: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let client = LedgerClient::new(&cli.api_url);

    match cli.command {
        Commands::Health => {
            let healthy = client.health().await?;
            if healthy {
                println!("✓ API is healthy");
            } else {
                println!("✗ API is not healthy");
                std::process::exit(1);
            }
        }

        Commands::Accounts => {
            let accounts = client.list_accounts().await?;
            println!("{}", serde_json::to_string_pretty(&accounts)?);
        }

        Commands::Transfer { from, to, amount } => {
            let payment = client.transfer(&from, &to, amount).await?;
            println!("{}", serde_json::to_string_pretty(&payment)?);
        }

        Commands::Payments { account } => {
            let history = client.payments(&account).await?;
            println!("{}", serde_json::to_string_pretty(&history)?);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_transfer() {
        let cli = Cli::try_parse_from([
            "ledger", "transfer", "--from", "A", "--to", "B", "--amount", "1000",
        ])
        .unwrap();

        match cli.command {
            Commands::Transfer { from, to, amount } => {
                assert_eq!(from, "A");
                assert_eq!(to, "B");
                assert_eq!(amount, 1000);
            }
            _ => panic!("expected transfer"),
        }
    }

    #[test]
    fn test_negative_amount_is_passed_through() {
        // The server owns amount validation.
        let cli = Cli::try_parse_from([
            "ledger",
            "transfer",
            "--from",
            "A",
            "--to",
            "B",
            "--amount=-5",
        ])
        .unwrap();

        assert!(matches!(cli.command, Commands::Transfer { amount: -5, .. }));
    }
}
