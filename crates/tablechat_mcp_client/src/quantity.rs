//! Digit-run quantity override for query calls.
//!
//! The model is asked to fill in `top` itself; this runs independently on
//! the user's question and wins whenever it finds a number. Only ASCII digit
//! runs are recognised: "five" is ignored even though the gateway's
//! instruction text advertises spelled-out quantities, and incidental
//! numbers such as years are taken at face value.

use regex::Regex;
use std::sync::OnceLock;
use tablechat_core::{ToolCall, ToolName};
use tracing::debug;

fn digit_run() -> &'static Regex {
    static DIGITS: OnceLock<Regex> = OnceLock::new();
    DIGITS.get_or_init(|| Regex::new("[0-9]+").expect("Valid digit regex"))
}

/// First run of decimal digits in `question`.
///
/// # Examples
///
/// ```
/// use tablechat_mcp_client::infer_top;
///
/// assert_eq!(infer_top("Give me 5 rows"), Some(5));
/// assert_eq!(infer_top("no numbers here"), None);
/// assert_eq!(infer_top("2023 report"), Some(2023));
/// ```
pub fn infer_top(question: &str) -> Option<u64> {
    digit_run()
        .find(question)
        .and_then(|m| m.as_str().parse::<u64>().ok())
}

/// Overwrite `top` on query calls when the question contains a number.
///
/// Returns the value applied, if any.
pub fn apply_quantity_override(question: &str, call: &mut ToolCall) -> Option<u64> {
    if call.tool != ToolName::QueryTableEntities {
        return None;
    }
    let top = infer_top(question)?;
    if let Some(previous) = call.top() {
        debug!(%previous, top, "Overriding model-supplied top");
    }
    call.set_top(top);
    Some(top)
}
