//! CSS-selector extraction over parsed HTML.
//!
//! Parsing is delegated to `scraper` (html5ever under the hood), so malformed
//! markup is repaired the way browsers repair it. The selector is always parsed
//! before the document: a bad selector fails even on empty input.

use scraper::{ElementRef, Html, Selector};
use thiserror::Error;

/// The selector string could not be parsed as CSS.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid CSS selector `{selector}`: {message}")]
pub struct SelectorSyntaxError {
    pub selector: String,
    pub message: String,
}

/// Compile `selector`, mapping parser errors into [`SelectorSyntaxError`].
pub fn parse_selector(selector: &str) -> Result<Selector, SelectorSyntaxError> {
    Selector::parse(selector).map_err(|e| SelectorSyntaxError {
        selector: selector.to_string(),
        message: e.to_string(),
    })
}

/// Parse `html` and return the value of the first element matching `selector`.
///
/// `Ok(None)` covers both "nothing matched" and "matched, but no value".
///
/// ```
/// use pluck_web::extract::extract;
///
/// let html = r#"<form><input type="submit" value="OK"></form>"#;
/// assert_eq!(extract(html, "form input[type=submit]").unwrap().as_deref(), Some("OK"));
/// assert_eq!(extract("<form></form>", "form input[type=submit]").unwrap(), None);
/// assert!(extract("<div>x</div>", "###bad[").is_err());
/// ```
pub fn extract(html: &str, selector: &str) -> Result<Option<String>, SelectorSyntaxError> {
    let selector = parse_selector(selector)?;
    let document = Html::parse_document(html);
    Ok(extract_with(&document, &selector))
}

/// Same as [`extract`] for an already parsed document and selector.
pub fn extract_with(document: &Html, selector: &Selector) -> Option<String> {
    let Some(el) = document.select(selector).next() else {
        tracing::debug!("extract.no_match");
        return None;
    };
    let value = value_of(el);
    tracing::debug!(
        element = el.value().name(),
        has_value = value.is_some(),
        "extract.matched"
    );
    value
}

/// Value-like property of a form control.
///
/// An explicit `value` attribute always wins. Without one, `<textarea>` yields
/// its text, `<option>` its collapsed text, and `<select>` its selected (or
/// first) option.
pub fn value_of(el: ElementRef<'_>) -> Option<String> {
    if let Some(v) = el.value().attr("value") {
        return Some(v.to_string());
    }
    match el.value().name() {
        "textarea" => Some(el.text().collect()),
        "option" => Some(option_value(el)),
        "select" => select_value(el),
        _ => None,
    }
}

/// A single-select keeps the last `selected` option and defaults to the
/// first; a `multiple` select reports its first selected option or `""`.
fn select_value(select: ElementRef<'_>) -> Option<String> {
    let options: Vec<ElementRef<'_>> = select
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "option")
        .collect();
    let first = *options.first()?;
    let mut selected = options
        .iter()
        .copied()
        .filter(|o| o.value().attr("selected").is_some());
    if select.value().attr("multiple").is_some() {
        return Some(selected.next().map(option_value).unwrap_or_default());
    }
    Some(option_value(selected.last().unwrap_or(first)))
}

fn option_value(option: ElementRef<'_>) -> String {
    match option.value().attr("value") {
        Some(v) => v.to_string(),
        None => option
            .text()
            .collect::<String>()
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" "),
    }
}
