use anyhow::Result;
use clap::Parser;
use console::style;
use fbpixel_core::{
    CustomData, EventRequest, FacebookPixel, PixelConfig, ServerEvent, UserData,
};
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

#[derive(Parser)]
#[command(name = "fbpixel")]
#[command(
    about = "Send a server-side conversion event to the Facebook Conversions API"
)]
struct Cli {
    /// Event name (e.g. "Purchase", "ViewContent")
    event: String,

    /// Source URL the event is attributed to
    #[arg(short, long, default_value = "https://localhost/")]
    url: String,

    /// User email for advanced matching (hashed before it leaves the machine)
    #[arg(short, long)]
    email: Option<String>,

    /// User phone for advanced matching (hashed before it leaves the machine)
    #[arg(short, long)]
    phone: Option<String>,

    /// Order value
    #[arg(short, long)]
    value: Option<f64>,

    /// ISO currency code for --value
    #[arg(short, long, default_value = "USD")]
    currency: String,

    /// Deduplication event id. Generated when omitted.
    #[arg(long)]
    event_id: Option<String>,

    /// Events Manager test code; routes the event to the test console
    #[arg(short, long)]
    test_code: Option<String>,

    /// Print the request payload instead of sending it
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = PixelConfig::from_env();

    // Validate configuration early
    if config.pixel_id.is_empty() {
        eprintln!(
            "{} FACEBOOK_PIXEL_ID is not set",
            style("Error:").red().bold()
        );
        std::process::exit(1);
    }
    if config.token.is_empty() && !cli.dry_run {
        eprintln!(
            "{} FACEBOOK_PIXEL_TOKEN is not set",
            style("Error:").red().bold()
        );
        std::process::exit(1);
    }

    let mut user_data = UserData::new();
    if let Some(email) = &cli.email {
        user_data = user_data.email(email);
    }
    if let Some(phone) = &cli.phone {
        user_data = user_data.phone(phone);
    }

    let mut custom_data = CustomData::new().currency(&cli.currency);
    custom_data.value = cli.value;

    let event_id = cli
        .event_id
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    let event = ServerEvent::website(&cli.event, &cli.url, user_data, custom_data)
        .event_id(&event_id);

    println!(
        "\n{}  {}\n",
        style("fbpixel").cyan().bold(),
        style("Conversions API").dim()
    );

    let mut request = EventRequest::single(event);
    if let Some(code) = cli.test_code {
        request = request.test_event_code(code);
    }

    if cli.dry_run {
        println!("{}", serde_json::to_string_pretty(&request)?);
        return Ok(());
    }

    let pixel = FacebookPixel::new(config);
    match pixel.send_request(request).await? {
        Some(response) => {
            println!(
                "{} Event {} accepted {}",
                style("✓").green().bold(),
                style(&cli.event).yellow(),
                style(format!(
                    "[received: {}, trace: {}]",
                    response.events_received.unwrap_or(0),
                    response.fbtrace_id.as_deref().unwrap_or("-")
                ))
                .dim()
            );
        }
        None => {
            println!(
                "{} Event {} was not delivered (see logs)",
                style("✗").red().bold(),
                style(&cli.event).yellow()
            );
            std::process::exit(1);
        }
    }

    Ok(())
}
