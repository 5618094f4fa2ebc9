use crate::output::{Output, OutputFormat};
use color_eyre::eyre::eyre;
use color_eyre::Result;
use media_sync_models::format_identifier;
use serde_json::json;

/// Accepts bare hex, `0x…`, or an SQLite blob literal (`X'…'` / `x'…'`).
fn decode_hex(input: &str) -> Result<Vec<u8>> {
    let trimmed = input.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .or_else(|| {
            trimmed
                .strip_prefix("X'")
                .or_else(|| trimmed.strip_prefix("x'"))
                .and_then(|rest| rest.strip_suffix('\''))
        })
        .unwrap_or(trimmed);

    hex::decode(digits).map_err(|e| eyre!("Invalid hex input '{}': {}", input, e))
}

pub fn run_format_id(hex: &str, output: &Output) -> Result<()> {
    let raw = decode_hex(hex)?;
    let formatted = format_identifier(&raw)?;

    match output.format() {
        OutputFormat::Human => output.info(&formatted),
        OutputFormat::Json | OutputFormat::JsonPretty => output.json(&json!({ "id": formatted })),
    }
    Ok(())
}
