use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue};
use serde_json::{json, Map, Value};

use addr_vault::config::loader::ALLOWED_IPS_ENV;
use addr_vault::entitlements::EntitlementTable;

#[derive(Parser)]
#[command(name = "vault-cli")]
#[command(about = "Client and configuration checker for addr-vault", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a secret from a running vault
    Fetch {
        #[arg(short, long, default_value = "http://localhost:8080")]
        url: String,

        #[arg(short, long)]
        keyname: String,

        /// Sent as `X-Forwarded-For`
        #[arg(long)]
        forwarded_for: Option<String>,

        /// Sent as `Forwarded: for="<ADDR>";proto=https`
        #[arg(long)]
        forwarded: Option<String>,

        /// Sent as the `testaddr` query parameter
        #[arg(long)]
        test_addr: Option<String>,
    },
    /// Parse an entitlement string and list addresses and key names
    CheckConfig {
        /// Defaults to the ALLOWED_IPS environment variable
        config: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch {
            url,
            keyname,
            forwarded_for,
            forwarded,
            test_addr,
        } => {
            let mut headers = HeaderMap::new();
            if let Some(addr) = forwarded_for {
                headers.insert("x-forwarded-for", HeaderValue::from_str(&addr)?);
            }
            if let Some(addr) = forwarded {
                headers.insert(
                    "forwarded",
                    HeaderValue::from_str(&format!("for=\"{}\";proto=https", addr))?,
                );
            }

            let mut query = vec![("keyname", keyname)];
            if let Some(addr) = test_addr {
                query.push(("testaddr", addr));
            }

            let res = reqwest::Client::new()
                .get(&url)
                .headers(headers)
                .query(&query)
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::CheckConfig { config } => {
            let config = config
                .or_else(|| std::env::var(ALLOWED_IPS_ENV).ok())
                .unwrap_or_default();
            let table = match EntitlementTable::from_config_str(&config) {
                Ok(table) => table,
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            };

            let mut listing = Map::new();
            for (address, keys) in table.key_names() {
                listing.insert(address.to_string(), json!(keys));
            }
            println!("{}", serde_json::to_string_pretty(&Value::Object(listing))?);
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let body = res.text().await?;
    if status.is_success() {
        println!("{}", body);
    } else {
        eprintln!("Error: vault returned status {}", status);
        eprintln!("Response: {}", body);
    }
    Ok(())
}
