//! Minimal XML helpers for SOAP envelopes
//!
//! The service responses are small and flat, so elements are located by local
//! name with a regex instead of building a document model. Namespace prefixes
//! are ignored.

use regex::Regex;
use std::sync::OnceLock;

/// Escape text for use as element content
pub(crate) fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            other => out.push(other),
        }
    }
    out
}

/// Resolve the predefined entities and numeric character references
pub(crate) fn unescape(text: &str) -> String {
    static ENTITY: OnceLock<Option<Regex>> = OnceLock::new();
    let Some(re) = ENTITY
        .get_or_init(|| Regex::new(r"&(amp|lt|gt|quot|apos|#[0-9]+|#x[0-9a-fA-F]+);").ok())
    else {
        return text.to_string();
    };

    re.replace_all(text, |caps: &regex::Captures<'_>| {
        let name = &caps[1];
        match name {
            "amp" => "&".to_string(),
            "lt" => "<".to_string(),
            "gt" => ">".to_string(),
            "quot" => "\"".to_string(),
            "apos" => "'".to_string(),
            _ => {
                let code = if let Some(hex) = name.strip_prefix("#x") {
                    u32::from_str_radix(hex, 16).ok()
                } else {
                    name[1..].parse::<u32>().ok()
                };
                code.and_then(char::from_u32)
                    .map(String::from)
                    .unwrap_or_else(|| caps[0].to_string())
            }
        }
    })
    .into_owned()
}

fn element_pattern(local_name: &str) -> Option<Regex> {
    // (?s) so content may span lines; the first alternative matches a self-closing tag
    let pattern = format!(
        r"(?s)<(?:[\w.-]+:)?{name}(?:\s[^>]*?)?(?:/>|>(.*?)</(?:[\w.-]+:)?{name}\s*>)",
        name = regex::escape(local_name)
    );
    Regex::new(&pattern).ok()
}

/// Raw inner XML of the first element with this local name
pub(crate) fn inner_xml<'a>(xml: &'a str, local_name: &str) -> Option<&'a str> {
    let caps = element_pattern(local_name)?.captures(xml)?;
    Some(caps.get(1).map_or("", |m| m.as_str()))
}

/// Unescaped text of the first element with this local name
///
/// A self-closing element yields an empty string.
pub(crate) fn element_text(xml: &str, local_name: &str) -> Option<String> {
    inner_xml(xml, local_name).map(|inner| unescape(inner.trim()))
}

/// Raw inner XML of every element with this local name, in document order
pub(crate) fn all_inner_xml<'a>(xml: &'a str, local_name: &str) -> Vec<&'a str> {
    let Some(re) = element_pattern(local_name) else {
        return Vec::new();
    };
    re.captures_iter(xml)
        .map(|caps| caps.get(1).map_or("", |m| m.as_str()))
        .collect()
}

/// Fault reason if the envelope carries a SOAP 1.1 or 1.2 fault
pub(crate) fn fault_reason(xml: &str) -> Option<String> {
    let fault = inner_xml(xml, "Fault")?;
    let reason = inner_xml(fault, "Reason")
        .and_then(|r| element_text(r, "Text"))
        .or_else(|| element_text(fault, "faultstring"))
        .unwrap_or_default();
    Some(if reason.is_empty() {
        "unspecified fault".to_string()
    } else {
        reason
    })
}
