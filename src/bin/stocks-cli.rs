use clap::{ArgAction, Parser, Subcommand};
use serde_json::{json, Value};

#[derive(Parser)]
#[command(name = "stocks-cli")]
#[command(about = "Command line client for the stock gateway", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show company details for a ticker
    Details { ticker: String },
    /// Daily open/close for every favourite of a user
    OpenClose {
        user_id: String,
        /// Trading day (YYYY-MM-DD), defaults to yesterday
        #[arg(long)]
        date: Option<String>,
    },
    /// Previous day's bar for a ticker
    PreviousClose {
        ticker: String,
        #[arg(long, default_value_t = true, action = ArgAction::Set)]
        adjusted: bool,
    },
    /// Simple moving average and weekly change
    Sma {
        ticker: String,
        /// Start day (YYYY-MM-DD)
        #[arg(long)]
        from: String,
        #[arg(long, default_value = "day")]
        timespan: String,
        #[arg(long, default_value_t = 10)]
        window: u32,
        #[arg(long)]
        more_details: bool,
    },
    /// Manage favourite tickers
    Favourite {
        #[command(subcommand)]
        action: FavouriteAction,
    },
    /// Gateway status and cache sizes
    Health,
}

#[derive(Subcommand)]
enum FavouriteAction {
    Add { user_id: String, ticker: String },
    Remove { user_id: String, ticker: String },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let res = match cli.command {
        Commands::Details { ticker } => {
            client
                .get(format!("{}/stocks/info/tickerdetails", base))
                .query(&[("ticker", ticker)])
                .send()
                .await?
        }
        Commands::OpenClose { user_id, date } => {
            let mut query = vec![("user_id", user_id)];
            if let Some(date) = date {
                query.push(("date", date));
            }
            client
                .get(format!("{}/stocks/daily/openclose", base))
                .query(&query)
                .send()
                .await?
        }
        Commands::PreviousClose { ticker, adjusted } => {
            client
                .get(format!("{}/stocks/daily/changeFromYesterday", base))
                .query(&[("ticker", ticker), ("adjusted", adjusted.to_string())])
                .send()
                .await?
        }
        Commands::Sma {
            ticker,
            from,
            timespan,
            window,
            more_details,
        } => {
            client
                .get(format!("{}/stocks/indicators/sma", base))
                .query(&[
                    ("ticker", ticker),
                    ("time_stamp", from),
                    ("time_span", timespan),
                    ("window", window.to_string()),
                    ("more_details", more_details.to_string()),
                ])
                .send()
                .await?
        }
        Commands::Favourite { action } => match action {
            FavouriteAction::Add { user_id, ticker } => {
                client
                    .post(format!("{}/stocks/favourites/add", base))
                    .json(&json!({ "user_id": user_id, "ticker": ticker }))
                    .send()
                    .await?
            }
            FavouriteAction::Remove { user_id, ticker } => {
                client
                    .delete(format!("{}/stocks/favourites/delete", base))
                    .query(&[("user_id", user_id), ("ticker", ticker)])
                    .send()
                    .await?
            }
        },
        Commands::Health => client.get(format!("{}/health", base)).send().await?,
    };

    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let request_id = res
        .headers()
        .get("x-request-id")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    if !status.is_success() {
        eprintln!("Error: gateway returned status {} (request {})", status, request_id);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
