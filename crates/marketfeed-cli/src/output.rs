use serde_json::Value;

use crate::cli::OutputFormat;
use crate::error::CliError;
use crate::metadata::Envelope;

pub fn render(envelope: &Envelope<Value>, format: OutputFormat, pretty: bool) -> Result<(), CliError> {
    match format {
        OutputFormat::Json => {
            let payload = if pretty {
                serde_json::to_string_pretty(envelope)?
            } else {
                serde_json::to_string(envelope)?
            };
            println!("{payload}");
        }
        OutputFormat::Table => render_table(envelope)?,
    }

    Ok(())
}

fn render_table(envelope: &Envelope<Value>) -> Result<(), CliError> {
    println!("request_id  : {}", envelope.meta.request_id);
    println!("generated_at: {}", envelope.meta.generated_at);
    println!("sources     : {}", envelope.meta.source_chain.join(","));
    println!("latency_ms  : {}", envelope.meta.latency_ms);
    println!("synthetic   : {}", envelope.meta.generated_count);

    if !envelope.meta.warnings.is_empty() {
        println!("warnings:");
        for warning in &envelope.meta.warnings {
            println!("  - {warning}");
        }
    }

    if let Some(quotes) = envelope.data.get("quotes").and_then(Value::as_array) {
        println!("quotes:");
        for quote in quotes {
            println!("  {}", quote_line(quote));
        }
        return Ok(());
    }

    println!("data:");
    let pretty_data = serde_json::to_string_pretty(&envelope.data)?;
    for line in pretty_data.lines() {
        println!("  {line}");
    }

    Ok(())
}

fn quote_line(quote: &Value) -> String {
    let text = |field: &str| quote.get(field).and_then(Value::as_str).unwrap_or("-").to_owned();
    let number = |field: &str| quote.get(field).and_then(Value::as_f64).unwrap_or(0.0);

    format!(
        "{:<10} {:>12.2} {:>+9.2} {:>+7.2}%  [{}]",
        text("symbol"),
        number("price"),
        number("change"),
        number("change_percent"),
        text("served_by"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn quote_line_aligns_columns() {
        let quote = json!({
            "symbol": "AAPL",
            "price": 189.5,
            "change": -1.25,
            "change_percent": -0.66,
            "served_by": "yahoo",
        });

        let line = quote_line(&quote);

        assert!(line.starts_with("AAPL"));
        assert!(line.contains("189.50"));
        assert!(line.contains("-1.25"));
        assert!(line.ends_with("[yahoo]"));
    }

    #[test]
    fn missing_fields_render_placeholders() {
        let line = quote_line(&json!({}));
        assert!(line.starts_with('-'));
        assert!(line.contains("0.00"));
    }
}
