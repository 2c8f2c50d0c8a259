use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, COOKIE};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "faucet-cli")]
#[command(about = "Command-line client for the faucet gate", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show faucet details and how the server sees this client
    Info,
    /// Request a payout to an address
    Claim {
        /// EIP-55 checksummed payout address
        address: String,

        /// hCaptcha response token
        #[arg(long)]
        captcha: Option<String>,

        /// Discord session token
        #[arg(long)]
        token: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    match cli.command {
        Commands::Info => {
            let res = client.get(format!("{}/api/info", cli.url)).send().await?;
            print_response(res).await?;
        }
        Commands::Claim {
            address,
            captcha,
            token,
        } => {
            let mut headers = HeaderMap::new();
            if let Some(captcha) = captcha {
                headers.insert("h-captcha-response", HeaderValue::from_str(&captcha)?);
            }
            if let Some(token) = token {
                headers.insert(COOKIE, HeaderValue::from_str(&format!("token={token}"))?);
            }

            let res = client
                .post(format!("{}/api/claim", cli.url))
                .headers(headers)
                .json(&json!({ "address": address }))
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: faucet returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    match json.get("msg").and_then(Value::as_str) {
        Some(msg) => println!("{}", msg),
        None => println!("{}", serde_json::to_string_pretty(&json)?),
    }
    Ok(())
}
