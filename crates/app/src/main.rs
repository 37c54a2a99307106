use std::time::Duration;

use chrono_tz::Tz;
use engine::{Assistant, JsonFileStore, Ledger, NarrativeComposer};
use providers::{Composer, DolarApi};

mod settings;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let settings = settings::Settings::new()?;

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "gastos={level},telegram_bot={level},engine={level},providers={level}",
            level = settings.app.level
        ))
        .init();

    if settings.telegram.token.trim().is_empty() {
        tracing::error!("telegram.token is missing");
        return Err("telegram token not configured (telegram.token or GASTOS__TELEGRAM__TOKEN)".into());
    }

    let timezone: Tz = settings
        .app
        .timezone
        .parse()
        .map_err(|err| format!("invalid timezone {}: {err}", settings.app.timezone))?;

    tracing::info!("Storing records under {}", settings.storage.data_dir);
    let ledger = Ledger::new(JsonFileStore::new(&settings.storage.data_dir));
    let rates = DolarApi::new(
        &settings.rates.base_url,
        Duration::from_secs(settings.rates.timeout_secs),
    )?;
    let composer = Composer::from_api_key(
        settings.gemini.api_key.as_deref(),
        &settings.gemini.model,
        Duration::from_secs(settings.gemini.timeout_secs),
    )?;
    if !composer.is_enabled() {
        tracing::warn!("No Gemini API key configured, open questions are disabled");
    }

    let bot = telegram_bot::Bot::builder()
        .token(&settings.telegram.token)
        .allowed_users(&settings.telegram.allowed_users)
        .timezone(timezone)
        .assistant(Assistant::new(ledger, rates, composer))
        .build()?;
    bot.run().await;

    Ok(())
}
