//! Scraping of portal markup. The portals publish no API, so every selector that
//! depends on their HTML lives here.

use crate::domain::error::{AppError, Result};
use scraper::{ElementRef, Html, Selector};
use std::collections::BTreeMap;
use tracing::warn;

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css)
        .map_err(|e| AppError::ProtocolError(format!("Invalid selector '{}': {}", css, e)))
}

fn stripped_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

/// `value` of the first `<input>` named `name`, if the page has one.
pub fn extract_input_value(html: &str, name: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let input = selector(&format!("input[name=\"{}\"]", name))?;

    Ok(document
        .select(&input)
        .next()
        .and_then(|el| el.value().attr("value"))
        .map(|v| v.to_string()))
}

/// Text of the first `div[role=alert]`, trimmed.
pub fn extract_alert_text(html: &str) -> Result<Option<String>> {
    let document = Html::parse_document(html);
    let alert = selector("div[role=\"alert\"]")?;

    Ok(document.select(&alert).next().map(stripped_text))
}

/// Reads the column guesses Touchstone renders after the raw upload.
///
/// Each `th.import_field` inside the first `.review_data` element yields
/// `columns[<data-number>]` mapped to its selected option value, or an empty string
/// when the server could not guess the column.
pub fn parse_column_guesses(html: &str) -> Result<BTreeMap<String, String>> {
    let document = Html::parse_document(html);
    let review = selector(".review_data")?;
    let field = selector("th.import_field")?;
    let selected = selector("option[selected]")?;

    let review_data = document.select(&review).next().ok_or_else(|| {
        AppError::ProtocolError("Upload review page has no review_data table".to_string())
    })?;

    let mut columns = BTreeMap::new();
    for cell in review_data.select(&field) {
        let Some(number) = cell.value().attr("data-number") else {
            warn!("Skipping import_field header without data-number");
            continue;
        };
        let value = cell
            .select(&selected)
            .next()
            .and_then(|option| option.value().attr("value"))
            .unwrap_or_default();
        columns.insert(format!("columns[{}]", number), value.to_string());
    }

    Ok(columns)
}
