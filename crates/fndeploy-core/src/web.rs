use crate::entity::{remove_key, KeyValue};
use crate::ComposeError;

pub const WEB_EXPORT_ANNOT: &str = "web-export";
pub const RAW_HTTP_ANNOT: &str = "raw-http";
pub const FINAL_ANNOT: &str = "final";

/// `(web-export, raw-http, final)` for a web mode, or `None` when the mode is
/// not recognised.
fn web_triple(mode: &str) -> Option<(bool, bool, bool)> {
    match mode.to_lowercase().as_str() {
        "yes" | "true" => Some((true, false, true)),
        "no" | "false" => Some((false, false, false)),
        "raw" => Some((true, true, true)),
        _ => None,
    }
}

/// Reshape an annotation list for the requested web-export mode.
///
/// The three web keys are always stripped before the canonical triple is
/// appended, so repeated application is idempotent. A `None` list is only
/// touched when `fetch` is false.
pub fn web_action(
    mode: &str,
    annotations: Option<Vec<KeyValue>>,
    fetch: bool,
) -> Result<Option<Vec<KeyValue>>, ComposeError> {
    let (export, raw, fin) =
        web_triple(mode).ok_or_else(|| ComposeError::WebMode(mode.to_owned()))?;

    if annotations.is_none() && fetch {
        return Ok(None);
    }

    let mut list = annotations.unwrap_or_default();
    for key in [WEB_EXPORT_ANNOT, RAW_HTTP_ANNOT, FINAL_ANNOT] {
        remove_key(&mut list, key);
    }
    list.push(KeyValue::new(WEB_EXPORT_ANNOT, export));
    list.push(KeyValue::new(RAW_HTTP_ANNOT, raw));
    list.push(KeyValue::new(FINAL_ANNOT, fin));
    Ok(Some(list))
}
