//! Conversion event command handlers.

use clap::Subcommand;
use serde_json::Value;
use tact_core::AppConfig;
use tact_meta::{split_full_name, ConversionsClient, RawConversionEvent, UserData};

/// Sub-commands available under `event`.
#[derive(Debug, Subcommand)]
pub enum EventCommands {
    /// Send one event through the server-side conversions API
    Send {
        /// Event name, e.g. Lead, Contact or a custom name
        #[arg(long)]
        name: String,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// Full name; split into first and last on the first space
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        city: Option<String>,
        #[arg(long)]
        country: Option<String>,
        #[arg(long)]
        external_id: Option<String>,
        #[arg(long)]
        source_url: Option<String>,
        /// Custom data entry as key=value; repeatable
        #[arg(long = "custom", value_parser = parse_custom)]
        custom: Vec<(String, Value)>,
        /// Test event code for the events manager; overrides META_TEST_EVENT_CODE
        #[arg(long)]
        test_code: Option<String>,
        /// Print the hashed payload without sending it
        #[arg(long)]
        dry_run: bool,
    },
    /// Show whether server-side conversions are configured
    Status,
}

/// Parses `key=value`. Values that read as JSON numbers or booleans keep
/// their type; everything else is sent as a string.
pub(crate) fn parse_custom(raw: &str) -> Result<(String, Value), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("custom data key is empty in '{raw}'"));
    }
    let value = match serde_json::from_str::<Value>(value) {
        Ok(v @ (Value::Number(_) | Value::Bool(_))) => v,
        _ => Value::String(value.to_owned()),
    };
    Ok((key.to_owned(), value))
}

/// Dispatch an `event` sub-command.
///
/// # Errors
///
/// Returns an error if the conversions client cannot be built or the send
/// fails.
pub(crate) async fn run(config: &AppConfig, command: EventCommands) -> anyhow::Result<()> {
    match command {
        EventCommands::Send {
            name,
            phone,
            email,
            full_name,
            city,
            country,
            external_id,
            source_url,
            custom,
            test_code,
            dry_run,
        } => {
            let (first_name, last_name) = full_name
                .as_deref()
                .map(split_full_name)
                .unwrap_or_default();
            let user_data = UserData {
                phone,
                email,
                first_name,
                last_name,
                city,
                country,
                external_id,
            };
            let mut event = RawConversionEvent::new(name).with_user_data(user_data);
            if let Some(url) = source_url {
                event = event.with_source_url(url);
            }
            for (key, value) in custom {
                event = event.with_custom(&key, value);
            }
            run_event_send(config, &event, test_code, dry_run).await
        }
        EventCommands::Status => {
            run_event_status(config);
            Ok(())
        }
    }
}

/// Send (or with `dry_run`, print) one conversion event.
///
/// # Errors
///
/// Returns an error if the event name is blank, the pixel id or access token
/// is missing, or the conversions API rejects the event after retries.
pub(crate) async fn run_event_send(
    config: &AppConfig,
    event: &RawConversionEvent,
    test_code: Option<String>,
    dry_run: bool,
) -> anyhow::Result<()> {
    let mut meta = config.meta.clone();
    if test_code.is_some() {
        meta.test_event_code = test_code;
    }
    let client = ConversionsClient::new(&meta)
        .map_err(|e| anyhow::anyhow!("failed to build conversions client: {e}"))?;

    if dry_run {
        let payload = client.build_payload(event, chrono::Utc::now().timestamp());
        println!("dry-run: would send");
        println!("{}", serde_json::to_string_pretty(&payload)?);
        return Ok(());
    }

    let outcome = client.dispatch(event).await?;
    println!(
        "{:<18}{}",
        "EVENTS RECEIVED",
        outcome
            .events_received
            .map_or_else(|| "-".to_owned(), |n| n.to_string())
    );
    println!(
        "{:<18}{}",
        "TRACE ID",
        outcome.fbtrace_id.as_deref().unwrap_or("-")
    );
    Ok(())
}

fn run_event_status(config: &AppConfig) {
    let yes_no = |set: bool| if set { "set" } else { "missing" };
    println!("{:<18}{}", "PIXEL ID", yes_no(config.meta.pixel_id.is_some()));
    println!(
        "{:<18}{}",
        "ACCESS TOKEN",
        yes_no(config.meta.access_token.is_some())
    );
    println!(
        "{:<18}{}",
        "TEST EVENT CODE",
        config.meta.test_event_code.as_deref().unwrap_or("-")
    );
    println!("{:<18}{}", "API VERSION", config.meta.api_version);
    println!("{:<18}{}", "MAX RETRIES", config.meta.max_retries);
}
