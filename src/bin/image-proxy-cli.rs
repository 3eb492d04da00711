use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "image-proxy-cli")]
#[command(about = "Client for a running image proxy", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Route the image endpoint is mounted on
    #[arg(short, long, default_value = "/api/image-proxy")]
    path: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch an image through the proxy
    Fetch {
        /// Path relative to the upstream origin, e.g. images/cat.jpg
        image: String,

        /// Write the image here instead of printing a summary
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Check liveness and readiness
    Health,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    match cli.command {
        Commands::Fetch { image, output } => {
            let res = client
                .get(format!("{}{}", base, cli.path))
                .query(&[("url", image.as_str())])
                .send()
                .await?;

            let status = res.status();
            if !status.is_success() {
                print_error(res).await?;
                std::process::exit(1);
            }

            let content_type = header_text(&res, reqwest::header::CONTENT_TYPE);
            let cache_control = header_text(&res, reqwest::header::CACHE_CONTROL);
            let body = res.bytes().await?;

            match output {
                Some(path) => {
                    tokio::fs::write(&path, &body).await?;
                    println!("Wrote {} bytes to {}", body.len(), path.display());
                }
                None => {
                    println!("Status:        {}", status);
                    println!("Content-Type:  {}", content_type);
                    println!("Cache-Control: {}", cache_control);
                    println!("Bytes:         {}", body.len());
                }
            }
        }
        Commands::Health => {
            for probe in ["/healthz", "/readyz"] {
                let res = client.get(format!("{}{}", base, probe)).send().await?;
                let status = res.status();
                let text = res.text().await.unwrap_or_default();
                println!("{:<9} {} {}", probe, status.as_u16(), text.trim());
            }
        }
    }

    Ok(())
}

fn header_text(res: &reqwest::Response, name: reqwest::header::HeaderName) -> String {
    res.headers()
        .get(name)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string()
}

async fn print_error(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    eprintln!("Error: proxy returned status {}", status);
    let text = res.text().await?;
    match serde_json::from_str::<Value>(&text) {
        Ok(json) => eprintln!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => eprintln!("{}", text),
    }
    Ok(())
}
