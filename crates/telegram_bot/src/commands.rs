//! Command structs

use teloxide::utils::command::BotCommands;

/// Every command the bot understands. Arguments arrive as the raw text after
/// the command and are parsed in [`crate::parsing`].
#[derive(BotCommands, Clone, Debug, PartialEq)]
#[command(
    rename_rule = "snake_case",
    description = "Comandos para controlar tus gastos:"
)]
pub enum Command {
    #[command(description = "Muestra este mensaje.")]
    Start,
    #[command(description = "Registra un gasto: /gasto <monto> [categoria] [descripcion]")]
    Gasto(String),
    #[command(description = "Resumen del mes.")]
    Resumen,
    #[command(description = "Lista los ultimos gastos: /listar [n]")]
    Listar(String),
    #[command(description = "Estadisticas del mes.")]
    Estadisticas,
    #[command(description = "Tipo de cambio oficial.")]
    Dolar,
    #[command(description = "Tasa paralela (Binance/USDT).")]
    BinanceRate,
    #[command(description = "Ver o establecer el presupuesto: /presupuesto [monto_usd]")]
    Presupuesto(String),
    #[command(description = "Compara con el mes anterior.")]
    Comparar,
    #[command(description = "Busca gastos: /buscar <fecha> o /buscar <min> <max>")]
    Buscar(String),
    #[command(description = "Gastos del dia actual.")]
    GastosHoy,
    #[command(description = "Exporta tus gastos a CSV.")]
    Exportar,
    #[command(description = "Elimina un gasto: /eliminar <id>")]
    Eliminar(String),
    #[command(description = "Edita un gasto: /editar <id> <monto> [categoria] [descripcion]")]
    Editar(String),
    #[command(description = "Ver o registrar el ingreso mensual: /ingreso [monto] [tasa]")]
    Ingreso(String),
    #[command(description = "Intercambia Bs a USDT: /cambiar <bs> [tasa] [descripcion]")]
    Cambiar(String),
    #[command(description = "Pregunta a la IA: /ai <pregunta>")]
    Ai(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_snake_case_commands() {
        assert_eq!(Command::parse("/gastos_hoy", "bot").unwrap(), Command::GastosHoy);
        assert_eq!(Command::parse("/binance_rate", "bot").unwrap(), Command::BinanceRate);
    }

    #[test]
    fn keeps_the_whole_argument_text() {
        assert_eq!(
            Command::parse("/gasto 22000 comida almuerzo con Ana", "bot").unwrap(),
            Command::Gasto("22000 comida almuerzo con Ana".to_string())
        );
        assert_eq!(
            Command::parse("/listar", "bot").unwrap(),
            Command::Listar(String::new())
        );
    }
}
