use std::path::PathBuf;

use clap::{Parser, Subcommand};
use reqwest::header::{HeaderValue, CONTENT_TYPE};

use locale_edge::config::loader::{defaults_with_env, load_config};
use locale_edge::experiments::signature::{sign, SIGNATURE_HEADER};
use locale_edge::routing::{LocaleRouter, RouteRequest};

#[derive(Parser)]
#[command(name = "edge-cli")]
#[command(about = "Management CLI for the locale edge service", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Explain how a request would be routed
    Route {
        /// Request path, e.g. /product/abc
        path: String,
        /// Raw query string, without '?'
        #[arg(long)]
        query: Option<String>,
        /// Value of the locale cookie
        #[arg(long)]
        cookie_locale: Option<String>,
        /// Accept-Language header value
        #[arg(long)]
        accept_language: Option<String>,
        /// Configuration file; defaults plus environment when omitted
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Print the X-Hub-Signature value for a payload file
    Sign {
        #[arg(short, long)]
        secret: String,
        file: PathBuf,
    },
    /// Send a signed datafile webhook
    Revalidate {
        #[arg(short, long, default_value = "http://localhost:8080/api/revalidate/datafile")]
        url: String,
        #[arg(short, long)]
        secret: String,
        #[arg(short, long, default_value = "{}")]
        body: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Route {
            path,
            query,
            cookie_locale,
            accept_language,
            config,
        } => {
            let config = match config {
                Some(path) => load_config(&path)?,
                None => defaults_with_env(|key| std::env::var(key).ok()),
            };
            let router = LocaleRouter::from_config(&config)?;
            let decision = router.decide(&RouteRequest {
                path: &path,
                query: query.as_deref(),
                locale_cookie: cookie_locale.as_deref(),
                accept_language: accept_language.as_deref(),
            });
            println!("{}", serde_json::to_string_pretty(&decision)?);
        }
        Commands::Sign { secret, file } => {
            let body = std::fs::read(&file)?;
            println!("{}", sign(secret.as_bytes(), &body)?);
        }
        Commands::Revalidate { url, secret, body } => {
            let signature = sign(secret.as_bytes(), body.as_bytes())?;
            let res = reqwest::Client::new()
                .post(&url)
                .header(SIGNATURE_HEADER, HeaderValue::from_str(&signature)?)
                .header(CONTENT_TYPE, "application/json")
                .body(body)
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let text = res.text().await?;
    if !status.is_success() {
        eprintln!("Error: webhook returned status {}", status);
        eprintln!("Response: {}", text);
        return Ok(());
    }

    match serde_json::from_str::<serde_json::Value>(&text) {
        Ok(json) => println!("{}", serde_json::to_string_pretty(&json)?),
        Err(_) => println!("{}", text),
    }
    Ok(())
}
