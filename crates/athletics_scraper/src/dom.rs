use crate::labels::collapse_whitespace;
use anyhow::Result;
use scraper::{ElementRef, Selector};

pub(crate) fn css(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow::anyhow!("invalid selector {:?}: {:?}", selector, e))
}

/// Whole text content of an element, like the DOM's `textContent`.
pub(crate) fn text_content(el: &ElementRef<'_>) -> String {
    el.text().collect::<String>()
}

/// Trimmed text of the first descendant matching `selector`.
pub(crate) fn select_text(el: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    el.select(selector)
        .next()
        .map(|e| text_content(&e).trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Same as [`select_text`] with inner whitespace collapsed.
pub(crate) fn select_text_collapsed(el: &ElementRef<'_>, selector: &Selector) -> Option<String> {
    select_text(el, selector)
        .map(|t| collapse_whitespace(&t))
        .filter(|t| !t.is_empty())
}

pub(crate) fn select_attr(el: &ElementRef<'_>, selector: &Selector, attr: &str) -> Option<String> {
    el.select(selector)
        .next()
        .and_then(|e| e.value().attr(attr))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
