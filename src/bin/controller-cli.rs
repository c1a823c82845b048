use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "controller-cli")]
#[command(about = "Management CLI for the proxy controller", long_about = None)]
struct Cli {
    #[arg(short, long, env = "CONTROLLER_URL", default_value = "http://localhost:8080")]
    url: String,

    /// Control token sent as a bearer token
    #[arg(short, long, env = "CONTROL_TOKEN")]
    token: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check controller health
    Health,
    /// Run one consistency pass over every tenant
    Poll,
    /// Print the generated NGINX configuration for a tenant
    Nginx {
        tenant: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    if let Some(token) = &cli.token {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {token}"))?,
        );
    }

    let base = cli.url.trim_end_matches('/');
    match cli.command {
        Commands::Health => {
            let res = client
                .get(format!("{base}/health"))
                .headers(headers)
                .send()
                .await?;
            print_json(res).await?;
        }
        Commands::Poll => {
            let res = client
                .post(format!("{base}/v1/poll"))
                .headers(headers)
                .send()
                .await?;
            print_json(res).await?;
        }
        Commands::Nginx { tenant } => {
            let res = client
                .get(format!("{base}/v1/tenants/{tenant}/nginx"))
                .headers(headers)
                .send()
                .await?;
            let res = check_status(res).await;
            print!("{}", res.text().await?);
        }
    }

    Ok(())
}

/// Exit with an error report unless the response succeeded.
async fn check_status(res: reqwest::Response) -> reqwest::Response {
    let status = res.status();
    if status.is_success() {
        return res;
    }
    eprintln!("Error: controller returned status {status}");
    if let Ok(text) = res.text().await {
        eprintln!("Response: {text}");
    }
    std::process::exit(1);
}

async fn print_json(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let json: Value = check_status(res).await.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
