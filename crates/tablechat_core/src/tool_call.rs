//! Structured tool calls produced by the language model.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Argument key for the OData filter predicate.
pub const ARG_FILTER: &str = "filter";
/// Argument key for the row limit.
pub const ARG_TOP: &str = "top";
/// Argument key for the comma-separated field projection.
pub const ARG_SELECT: &str = "select";

/// The fixed set of tool names the interpreter may emit.
///
/// # Examples
///
/// ```
/// use tablechat_core::ToolName;
///
/// let tool: ToolName = "queryTableEntities".parse().unwrap();
/// assert_eq!(tool, ToolName::QueryTableEntities);
/// assert!("dropTable".parse::<ToolName>().is_err());
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
    strum::AsRefStr,
)]
pub enum ToolName {
    /// Count records matching a filter
    #[serde(rename = "countTableEntities")]
    #[strum(serialize = "countTableEntities")]
    CountTableEntities,
    /// Fetch records matching a filter
    #[serde(rename = "queryTableEntities")]
    #[strum(serialize = "queryTableEntities")]
    QueryTableEntities,
    /// The model decided no tool applies
    #[serde(rename = "none")]
    #[strum(serialize = "none")]
    None,
}

/// Returned when a string is not a known tool name.
pub type ToolNameParseError = strum::ParseError;

impl ToolName {
    /// Argument keys this tool accepts.
    pub fn allowed_arguments(&self) -> &'static [&'static str] {
        match self {
            ToolName::CountTableEntities => &[ARG_FILTER],
            ToolName::QueryTableEntities => &[ARG_FILTER, ARG_TOP, ARG_SELECT],
            ToolName::None => &[],
        }
    }
}

/// A tool call that breaks the argument invariants.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display)]
pub enum ToolCallViolation {
    /// `tool = none` must carry no arguments
    #[display("tool \"none\" must have empty arguments")]
    ArgumentsForNone,
    /// An argument the tool does not accept
    #[display("{} does not accept argument \"{}\"", tool, key)]
    UnexpectedArgument {
        /// Offending tool
        tool: ToolName,
        /// Offending key
        key: String,
    },
}

/// `{"tool": <name>, "arguments": {...}}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Which tool to run
    pub tool: ToolName,
    /// Argument name to value
    #[serde(default)]
    pub arguments: Map<String, Value>,
}

impl ToolCall {
    /// Create a tool call.
    pub fn new(tool: ToolName, arguments: Map<String, Value>) -> Self {
        Self { tool, arguments }
    }

    /// The "no tool applies" call.
    pub fn none() -> Self {
        Self::new(ToolName::None, Map::new())
    }

    /// Filter argument, if present and a string.
    pub fn filter(&self) -> Option<&str> {
        self.arguments.get(ARG_FILTER).and_then(Value::as_str)
    }

    /// Raw `top` argument, if present.
    pub fn top(&self) -> Option<&Value> {
        self.arguments.get(ARG_TOP)
    }

    /// Overwrite the `top` argument.
    pub fn set_top(&mut self, top: u64) {
        self.arguments.insert(ARG_TOP.to_string(), Value::from(top));
    }

    /// Check the per-tool argument invariants.
    ///
    /// # Examples
    ///
    /// ```
    /// use serde_json::json;
    /// use tablechat_core::ToolCall;
    ///
    /// let call: ToolCall = serde_json::from_value(json!({
    ///     "tool": "countTableEntities",
    ///     "arguments": {"filter": "city eq 'Atlanta'", "top": 5}
    /// })).unwrap();
    /// assert!(call.validate().is_err());
    /// ```
    pub fn validate(&self) -> Result<(), ToolCallViolation> {
        if self.tool == ToolName::None {
            return if self.arguments.is_empty() {
                Ok(())
            } else {
                Err(ToolCallViolation::ArgumentsForNone)
            };
        }

        let allowed = self.tool.allowed_arguments();
        match self.arguments.keys().find(|key| !allowed.contains(&key.as_str())) {
            Some(key) => Err(ToolCallViolation::UnexpectedArgument {
                tool: self.tool,
                key: key.clone(),
            }),
            None => Ok(()),
        }
    }
}
