use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "cdn-proxy-cli")]
#[command(about = "Operator CLI for a running CDN proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:3000")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show status, cache usage, and the visible proxy rules
    List,
    /// Print the proxy activity log
    Logs {
        /// Only print the last N lines
        #[arg(short = 'n', long)]
        tail: Option<usize>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::List => {
            let res = client.get(format!("{base}/list")).send().await?;
            if let Some(res) = check_status(res).await {
                let json: Value = res.json().await?;
                println!("{}", serde_json::to_string_pretty(&json)?);
            }
        }
        Commands::Logs { tail } => {
            let res = client.get(format!("{base}/logs")).send().await?;
            if let Some(res) = check_status(res).await {
                let text = res.text().await?;
                let lines: Vec<&str> = text.lines().collect();
                let skip = tail.map_or(0, |n| lines.len().saturating_sub(n));
                for line in &lines[skip..] {
                    println!("{line}");
                }
            }
        }
    }

    Ok(())
}

async fn check_status(res: reqwest::Response) -> Option<reqwest::Response> {
    let status = res.status();
    if status.is_success() {
        return Some(res);
    }
    eprintln!("Error: proxy returned status {}", status);
    if let Ok(text) = res.text().await {
        eprintln!("Response: {}", text);
    }
    None
}
