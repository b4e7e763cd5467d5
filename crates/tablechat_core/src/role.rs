//! Role types for conversation participants.

use serde::{Deserialize, Serialize};

/// Who authored a chat message.
///
/// Serialised lowercase, matching the OpenAI chat wire format.
///
/// # Examples
///
/// ```
/// use tablechat_core::Role;
///
/// let role: Role = serde_json::from_str("\"assistant\"").unwrap();
/// assert_eq!(role, Role::Assistant);
/// assert_eq!(role.to_string(), "assistant");
/// ```
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System messages provide context and instructions
    #[display("system")]
    System,
    /// User messages are from the human
    #[display("user")]
    User,
    /// Assistant messages are from the model
    #[display("assistant")]
    Assistant,
}
