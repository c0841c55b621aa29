use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};

use super::PresetError;
use crate::config::PatchConfig;
use crate::executor::Pipeline;
use crate::rules::PatternRule;

/// RFC 3986 unreserved characters stay as they are.
const MESSAGE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

pub(super) fn pipeline(config: &PatchConfig) -> Result<Pipeline, PresetError> {
    let url = chat_url(
        config.whatsapp.number.as_deref(),
        config.whatsapp.message.as_deref(),
    )?;
    Ok(Pipeline::new().with(PatternRule::compute(
        "rewrite-whatsapp-links",
        r#"https://wa\.me/\d+(?:\?text=[^"'\s<>]*)?"#,
        move |_| Ok(url.clone()),
    )?))
}

/// `https://wa.me/<digits>[?text=<encoded message>]`
pub(super) fn chat_url(number: Option<&str>, message: Option<&str>) -> Result<String, PresetError> {
    let raw = number.ok_or(PresetError::MissingParameter("whatsapp.number"))?;
    let digits: String = raw
        .chars()
        .filter(|c| !matches!(c, '+' | ' ' | '-' | '(' | ')'))
        .collect();
    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(PresetError::InvalidParameter {
            name: "whatsapp.number",
            reason: format!("`{raw}` is not a phone number"),
        });
    }
    Ok(match message.map(str::trim).filter(|m| !m.is_empty()) {
        Some(message) => format!(
            "https://wa.me/{digits}?text={}",
            utf8_percent_encode(message, MESSAGE)
        ),
        None => format!("https://wa.me/{digits}"),
    })
}
