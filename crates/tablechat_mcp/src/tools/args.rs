//! Argument decoding shared by the table tools.

use serde_json::{Map, Value};
use tablechat_core::{ARG_FILTER, ARG_SELECT, ARG_TOP, ToolName};
use tablechat_error::{ToolError, ToolErrorKind};

/// Row ceiling for a single query, also the default.
pub const MAX_TOP: usize = 100;

/// Key field always included in a projection.
pub const KEY_FIELD: &str = "RowKey";

/// Fields stored under lowercase names in the table.
const LOWERCASE_FIELDS: [&str; 2] = ["city", "country"];

/// Reject keys the tool does not accept.
pub fn reject_unknown(tool: ToolName, args: &Map<String, Value>) -> Result<(), ToolError> {
    let allowed = tool.allowed_arguments();
    match args.keys().find(|key| !allowed.contains(&key.as_str())) {
        Some(key) => Err(invalid(format!("{} does not accept \"{}\"", tool, key))),
        None => Ok(()),
    }
}

/// Optional string argument; `null` and blank strings count as absent.
fn optional_string(args: &Map<String, Value>, key: &str) -> Result<Option<String>, ToolError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) if s.trim().is_empty() => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(invalid(format!("\"{}\" must be a string, got {}", key, other))),
    }
}

/// The OData filter, if any.
pub fn parse_filter(args: &Map<String, Value>) -> Result<Option<String>, ToolError> {
    optional_string(args, ARG_FILTER)
}

/// Raw `select` argument, if any.
pub fn parse_select(args: &Map<String, Value>) -> Result<Option<String>, ToolError> {
    optional_string(args, ARG_SELECT)
}

/// `top` as an integer or numeric string. Zero means "use the default".
pub fn parse_top(args: &Map<String, Value>) -> Result<Option<usize>, ToolError> {
    let parsed = match args.get(ARG_TOP) {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_u64(),
        Some(Value::String(s)) => s.trim().parse::<u64>().ok(),
        Some(_) => None,
    };

    match parsed {
        Some(0) => Ok(None),
        Some(n) => Ok(Some(usize::try_from(n).unwrap_or(usize::MAX))),
        None => Err(invalid(format!(
            "\"top\" must be a non-negative integer, got {}",
            args.get(ARG_TOP).map(Value::to_string).unwrap_or_default()
        ))),
    }
}

/// `min(top or MAX_TOP, MAX_TOP)`
pub fn effective_limit(top: Option<usize>) -> usize {
    top.unwrap_or(MAX_TOP).min(MAX_TOP)
}

/// Turn a comma-separated select into the projected field list.
///
/// Blank entries are dropped, `City`/`Country` map to their stored lowercase
/// names and the key field is appended when missing. An empty result means
/// no projection.
pub fn effective_select(select: Option<&str>) -> Option<Vec<String>> {
    let mut fields: Vec<String> = select?
        .split(',')
        .map(str::trim)
        .filter(|field| !field.is_empty())
        .map(|field| {
            LOWERCASE_FIELDS
                .iter()
                .find(|lower| lower.eq_ignore_ascii_case(field))
                .map_or_else(|| field.to_string(), |lower| lower.to_string())
        })
        .collect();

    if fields.is_empty() {
        return None;
    }
    if !fields.iter().any(|field| field == KEY_FIELD) {
        fields.push(KEY_FIELD.to_string());
    }
    Some(fields)
}

#[track_caller]
fn invalid(message: String) -> ToolError {
    ToolError::new(ToolErrorKind::InvalidArguments(message))
}
