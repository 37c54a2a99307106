use chrono::{NaiveDateTime, Utc};
use chrono_tz::Tz;
use engine::{EngineError, MonthKey, intent};
use teloxide::{
    RequestError,
    dispatching::{HandlerExt, UpdateHandler},
    prelude::*,
    types::{ChatId, InputFile, User},
};

use crate::{
    ConfigParameters,
    commands::Command,
    parsing::{self, ParseError, Search},
    ui,
};

const UNKNOWN_USER: &str = "No se pudo identificar al usuario.";
const RATE_ERROR: &str = "Error al obtener el tipo de cambio. Intenta mas tarde.";

/// Build the schema for messages: commands first, free text otherwise.
pub(crate) fn schema() -> UpdateHandler<RequestError> {
    Update::filter_message()
        .branch(
            dptree::entry()
                .filter_command::<Command>()
                .endpoint(handle_command),
        )
        .branch(dptree::endpoint(handle_text))
}

async fn handle_command(
    bot: Bot,
    msg: Message,
    cmd: Command,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !is_allowed(&cfg, msg.from.as_ref()) {
        return Ok(());
    }
    let Some(from) = msg.from.as_ref() else {
        bot.send_message(msg.chat.id, UNKNOWN_USER).await?;
        return Ok(());
    };
    let chat_id = msg.chat.id;
    let user_id = from.id.0.to_string();
    let now = now_local(cfg.timezone);
    tracing::debug!("command {cmd:?} from {user_id}");

    let text = match cmd {
        Command::Start => ui::start_text(&from.first_name, cfg.assistant.composer_enabled()),
        Command::Gasto(args) => register_expense(&cfg, &user_id, now, &args).await,
        Command::Resumen => {
            let month = MonthKey::from_datetime(now);
            ui::month_overview(&cfg.assistant.ledger().month_overview(&user_id, &month))
        }
        Command::Listar(args) => list_expenses(&cfg, &user_id, now, &args),
        Command::Estadisticas => {
            let month = MonthKey::from_datetime(now);
            match cfg.assistant.ledger().statistics(&user_id, &month, now.date()) {
                Some(stats) => ui::statistics(&stats),
                None => "No hay gastos registrados este mes.".to_string(),
            }
        }
        Command::Dolar => match cfg.assistant.official_rate().await {
            Ok(rate) => ui::official_rate(rate),
            Err(_) => RATE_ERROR.to_string(),
        },
        Command::BinanceRate => match cfg.assistant.parallel_rate().await {
            Ok(parallel) => {
                let official = cfg.assistant.official_rate().await.ok();
                ui::parallel_rate(parallel, official)
            }
            Err(_) => "Error al obtener el tipo de cambio paralelo. Intenta mas tarde.".to_string(),
        },
        Command::Presupuesto(args) => budget(&cfg, &user_id, now, &args),
        Command::Comparar => compare_months(&cfg, &user_id, now),
        Command::Buscar(args) => search(&cfg, &user_id, &args),
        Command::GastosHoy => {
            let expenses = cfg.assistant.ledger().find_by_date(&user_id, now.date());
            ui::today_expenses(now.date(), &expenses)
        }
        Command::Exportar => return export(&bot, chat_id, &cfg, &user_id, now).await,
        Command::Eliminar(args) => delete_expense(&cfg, &user_id, &args),
        Command::Editar(args) => edit_expense(&cfg, &user_id, &args),
        Command::Ingreso(args) => income(&cfg, &user_id, now, &args).await,
        Command::Cambiar(args) => exchange(&cfg, &user_id, now, &args).await,
        Command::Ai(args) => return ask(&bot, chat_id, &cfg, &user_id, now, &args).await,
    };

    bot.send_message(chat_id, text).await?;
    Ok(())
}

/// Free text goes through the assistant; while the composer works a
/// placeholder is shown.
async fn handle_text(bot: Bot, msg: Message, cfg: ConfigParameters) -> ResponseResult<()> {
    if !is_allowed(&cfg, msg.from.as_ref()) {
        return Ok(());
    }
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let chat_id = msg.chat.id;
    if text.trim_start().starts_with('/') {
        bot.send_message(
            chat_id,
            "Comando no reconocido. Usa /start para ver los comandos disponibles.",
        )
        .await?;
        return Ok(());
    }
    let Some(from) = msg.from.as_ref() else {
        bot.send_message(chat_id, UNKNOWN_USER).await?;
        return Ok(());
    };
    let user_id = from.id.0.to_string();
    let now = now_local(cfg.timezone);

    let intent = intent::classify(text);
    let composing =
        cfg.assistant.composer_enabled() && matches!(intent, intent::Intent::Question(_));
    let placeholder = if composing {
        Some(bot.send_message(chat_id, "Pensando...").await?)
    } else {
        None
    };

    let result = cfg
        .assistant
        .handle_intent(&user_id, text, intent, now)
        .await;

    if let Some(placeholder) = placeholder
        && let Err(err) = bot.delete_message(chat_id, placeholder.id).await
    {
        tracing::warn!("failed to delete placeholder: {err}");
    }

    let answer = match result {
        Ok(reply) => ui::reply(&reply),
        Err(err) => user_message_for_error(&err),
    };
    bot.send_message(chat_id, answer).await?;
    Ok(())
}

async fn register_expense(
    cfg: &ConfigParameters,
    user_id: &str,
    now: NaiveDateTime,
    args: &str,
) -> String {
    let args = match parsing::parse_expense(args) {
        Ok(args) => args,
        Err(ParseError::Missing) => {
            return "Por favor, indica la cantidad en bolivares.\n\
                    Ejemplo: /gasto 22000\n\
                    Ejemplo con categoria: /gasto 22000 comida\n\
                    Ejemplo completo: /gasto 22000 comida almuerzo"
                .to_string();
        }
        Err(ParseError::NotPositive) => return "La cantidad debe ser mayor a 0".to_string(),
        Err(_) => {
            return "Por favor, ingresa un numero valido.\nEjemplo: /gasto 22000".to_string();
        }
    };

    match cfg
        .assistant
        .record_expense(user_id, now, args.amount, args.category, args.description)
        .await
    {
        Ok(expense) => ui::expense_registered(&expense),
        Err(err) => user_message_for_error(&err),
    }
}

fn list_expenses(cfg: &ConfigParameters, user_id: &str, now: NaiveDateTime, args: &str) -> String {
    let month = MonthKey::from_datetime(now);
    let limit = parsing::parse_limit(args);
    let expenses = cfg.assistant.ledger().recent_expenses(user_id, &month, limit);
    if expenses.is_empty() {
        "No hay gastos registrados este mes.".to_string()
    } else {
        ui::expense_list(&expenses)
    }
}

fn budget(cfg: &ConfigParameters, user_id: &str, now: NaiveDateTime, args: &str) -> String {
    let ledger = cfg.assistant.ledger();
    let month = MonthKey::from_datetime(now);
    match parsing::parse_budget(args) {
        Ok(None) => match ledger.budget_status(user_id, &month) {
            Some(status) => ui::budget_status(&status),
            None => ui::no_budget().to_string(),
        },
        Ok(Some(amount)) => match ledger.set_budget(user_id, &month, amount) {
            Ok(()) => ui::budget_set(amount, &month),
            Err(err) => user_message_for_error(&err),
        },
        Err(ParseError::NotPositive) => "El presupuesto debe ser mayor a 0.".to_string(),
        Err(_) => "Por favor, ingresa un numero valido.\nEjemplo: /presupuesto 500".to_string(),
    }
}

fn compare_months(cfg: &ConfigParameters, user_id: &str, now: NaiveDateTime) -> String {
    let current = MonthKey::from_datetime(now);
    let Some(previous) = current.previous() else {
        return "No hay datos para comparar.".to_string();
    };
    match cfg.assistant.ledger().compare_months(user_id, &current, &previous) {
        Ok(comparison) => ui::comparison(&comparison),
        Err(EngineError::NoDataForPeriod(_)) => "No hay datos para comparar.".to_string(),
        Err(err) => user_message_for_error(&err),
    }
}

fn search(cfg: &ConfigParameters, user_id: &str, args: &str) -> String {
    let ledger = cfg.assistant.ledger();
    let expenses = match parsing::parse_search(args) {
        Ok(Search::Date(date)) => ledger.find_by_date(user_id, date),
        Ok(Search::Range { min, max }) => ledger.find_by_range(user_id, Some(min), Some(max)),
        Err(ParseError::Missing) => {
            return "Uso: /buscar <fecha> o /buscar <min> <max>\n\
                    Ejemplo: /buscar 2025-11-11\n\
                    Ejemplo: /buscar 1000 50000"
                .to_string();
        }
        Err(ParseError::InvalidDate) => {
            return "Formato de fecha invalido. Usa YYYY-MM-DD".to_string();
        }
        Err(ParseError::InvalidAmount) => {
            return "Los montos deben ser numeros validos.".to_string();
        }
        Err(_) => return "Formato invalido. Ver /start para ayuda.".to_string(),
    };

    if expenses.is_empty() {
        "No se encontraron gastos.".to_string()
    } else {
        ui::search_results(&expenses)
    }
}

fn delete_expense(cfg: &ConfigParameters, user_id: &str, args: &str) -> String {
    let Ok(id) = parsing::parse_id(args) else {
        return "Por favor, indica el ID del gasto a eliminar.\n\
                Ejemplo: /eliminar abc12345\n\
                Usa /listar para ver los IDs de tus gastos."
            .to_string();
    };
    let ledger = cfg.assistant.ledger();
    let Some((_, expense)) = ledger.expense_by_id(user_id, id) else {
        return "Gasto no encontrado. Verifica el ID.".to_string();
    };
    match ledger.delete_expense(user_id, id) {
        Ok(true) => ui::expense_deleted(&expense),
        Ok(false) => "Gasto no encontrado. Verifica el ID.".to_string(),
        Err(err) => user_message_for_error(&err),
    }
}

fn edit_expense(cfg: &ConfigParameters, user_id: &str, args: &str) -> String {
    let args = match parsing::parse_edit(args) {
        Ok(args) => args,
        Err(ParseError::Missing) => {
            return "Uso: /editar <id> <nuevo_monto> [categoria] [descripcion]\n\
                    Ejemplo: /editar abc12345 25000\n\
                    Ejemplo: /editar abc12345 25000 comida"
                .to_string();
        }
        Err(ParseError::NotPositive) => return "La cantidad debe ser mayor a 0".to_string(),
        Err(_) => return "El monto debe ser un numero valido.".to_string(),
    };

    let ledger = cfg.assistant.ledger();
    match ledger.edit_expense(user_id, &args.id, args.edit) {
        Ok(true) => match ledger.expense_by_id(user_id, &args.id) {
            Some((_, expense)) => ui::expense_edited(&expense),
            None => "Gasto no encontrado.".to_string(),
        },
        Ok(false) => "Gasto no encontrado.".to_string(),
        Err(err) => user_message_for_error(&err),
    }
}

async fn income(cfg: &ConfigParameters, user_id: &str, now: NaiveDateTime, args: &str) -> String {
    let ledger = cfg.assistant.ledger();
    let month = MonthKey::from_datetime(now);
    match parsing::parse_income(args) {
        Ok(None) => match ledger.income(user_id, &month) {
            Some(income) => {
                let balance = ledger.available_balance(user_id, &month);
                ui::income_status(&month, &income, balance.as_ref())
            }
            None => ui::no_income().to_string(),
        },
        Ok(Some(args)) => match cfg
            .assistant
            .record_income(user_id, now, args.amount, args.rate)
            .await
        {
            Ok(income) => ui::income_recorded(&income),
            Err(err) => user_message_for_error(&err),
        },
        Err(ParseError::NotPositive) => "El ingreso debe ser mayor a 0".to_string(),
        Err(_) => "Por favor, ingresa un numero valido.\n\
                   Ejemplo: /ingreso 120000\n\
                   Ejemplo: /ingreso 120000 330"
            .to_string(),
    }
}

async fn exchange(cfg: &ConfigParameters, user_id: &str, now: NaiveDateTime, args: &str) -> String {
    let args = match parsing::parse_exchange(args) {
        Ok(args) => args,
        Err(ParseError::NotPositive) => return "La cantidad debe ser mayor a 0".to_string(),
        Err(_) => {
            return "Uso: /cambiar <cantidad_bs> [tasa] [descripcion]\n\
                    Ejemplo: /cambiar 100000\n\
                    Ejemplo: /cambiar 100000 320\n\
                    Ejemplo: /cambiar 100000 320 compra de usdt\n\n\
                    Si no especificas la tasa, se usara la tasa paralela actual de la API."
                .to_string();
        }
    };

    match cfg
        .assistant
        .record_exchange(user_id, now, args.amount, args.rate, args.description)
        .await
    {
        Ok(exchange) => {
            let month = MonthKey::from_datetime(now);
            let balance = cfg.assistant.ledger().available_balance(user_id, &month);
            let mut text = ui::exchange_recorded(&exchange, None, balance.as_ref());
            if !exchange.description.is_empty() {
                text.push_str(&format!("\n\nDescripcion: {}", exchange.description));
            }
            text
        }
        Err(EngineError::RateUnavailable) => {
            "Error al obtener el tipo de cambio paralelo. Especifica la tasa manualmente.\n\
             Ejemplo: /cambiar 100000 320"
                .to_string()
        }
        Err(err) => user_message_for_error(&err),
    }
}

async fn export(
    bot: &Bot,
    chat_id: ChatId,
    cfg: &ConfigParameters,
    user_id: &str,
    now: NaiveDateTime,
) -> ResponseResult<()> {
    let data = match cfg.assistant.ledger().export_csv(user_id) {
        Ok(data) => data,
        Err(EngineError::NoDataForPeriod(_)) => {
            bot.send_message(chat_id, "No hay gastos para exportar.").await?;
            return Ok(());
        }
        Err(err) => {
            tracing::error!("failed to export expenses of {user_id}: {err}");
            bot.send_message(chat_id, "Error al exportar los gastos.").await?;
            return Ok(());
        }
    };

    let file_name = format!("gastos_{user_id}_{}.csv", now.format("%Y%m%d_%H%M%S"));
    bot.send_document(chat_id, InputFile::memory(data).file_name(file_name))
        .await?;
    Ok(())
}

async fn ask(
    bot: &Bot,
    chat_id: ChatId,
    cfg: &ConfigParameters,
    user_id: &str,
    now: NaiveDateTime,
    question: &str,
) -> ResponseResult<()> {
    if !cfg.assistant.composer_enabled() {
        bot.send_message(
            chat_id,
            "La IA no esta disponible. Verifica que la clave de Gemini este configurada.",
        )
        .await?;
        return Ok(());
    }
    let question = question.trim();
    if question.is_empty() {
        bot.send_message(
            chat_id,
            "Por favor, haz una pregunta despues del comando.\n\
             Ejemplo: /ai Cuanto es 1000 bolivares en dolares?",
        )
        .await?;
        return Ok(());
    }

    let placeholder = bot.send_message(chat_id, "Pensando...").await?;
    let result = cfg.assistant.ask(user_id, question, now).await;
    if let Err(err) = bot.delete_message(chat_id, placeholder.id).await {
        tracing::warn!("failed to delete placeholder: {err}");
    }

    let text = match result {
        Ok(answer) => answer,
        Err(err) => user_message_for_error(&err),
    };
    bot.send_message(chat_id, text).await?;
    Ok(())
}

fn is_allowed(cfg: &ConfigParameters, from: Option<&User>) -> bool {
    let Some(from) = from else {
        return false;
    };
    match &cfg.allowed_users {
        None => true,
        Some(ids) => ids.contains(&from.id),
    }
}

fn user_message_for_error(err: &EngineError) -> String {
    match err {
        EngineError::InvalidAmount(_) => "La cantidad debe ser mayor a 0".to_string(),
        EngineError::RateUnavailable => RATE_ERROR.to_string(),
        EngineError::RecordNotFound(_) => "Gasto no encontrado. Verifica el ID.".to_string(),
        EngineError::NoDataForPeriod(_) => "No hay datos para ese periodo.".to_string(),
        EngineError::ProviderFailure(_) => "Error al consultar la IA. Intenta mas tarde.".to_string(),
        EngineError::Storage(_) | EngineError::Serialization(_) | EngineError::Export(_) => {
            tracing::error!("{err}");
            "Error interno. Intenta mas tarde.".to_string()
        }
    }
}

/// Wall-clock time in the configured timezone; records carry local time.
fn now_local(tz: Tz) -> NaiveDateTime {
    Utc::now().with_timezone(&tz).naive_local()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn errors_map_to_spanish_texts() {
        assert_eq!(
            user_message_for_error(&EngineError::RateUnavailable),
            "Error al obtener el tipo de cambio. Intenta mas tarde."
        );
        assert_eq!(
            user_message_for_error(&EngineError::RecordNotFound("abc12345".to_string())),
            "Gasto no encontrado. Verifica el ID."
        );
        assert_eq!(
            user_message_for_error(&EngineError::Export("disk full".to_string())),
            "Error interno. Intenta mas tarde."
        );
    }
}
