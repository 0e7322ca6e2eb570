//! Repairs tool definitions emitted by clients that add vendor-specific keys
//! (`strict`, `returns`, ...) to `tools[].function`, which strict upstreams reject.

use serde_json::Value;
use tracing::info;

/// Keys an upstream accepts inside a `tools[].function` definition.
pub const ALLOWED_FUNCTION_KEYS: [&str; 3] = ["name", "description", "parameters"];

#[derive(Debug, thiserror::Error)]
pub enum SanitizeError {
    #[error("request body could not be repaired: {0}")]
    Failed(String),
}

/// A repair policy applied to a decoded request body before it is forwarded.
///
/// Implementations mutate `body` in place; callers that need the original must
/// hold their own copy. On error the body may be partially repaired and should
/// be discarded.
pub trait PayloadSanitizer: Send + Sync {
    fn sanitize(&self, body: &mut Value) -> Result<usize, SanitizeError>;

    fn name(&self) -> &str;
}

/// Strips every key outside [`ALLOWED_FUNCTION_KEYS`] from tool function definitions.
#[derive(Debug, Default, Clone, Copy)]
pub struct ToolSchemaSanitizer;

impl PayloadSanitizer for ToolSchemaSanitizer {
    fn sanitize(&self, body: &mut Value) -> Result<usize, SanitizeError> {
        sanitize(body)
    }

    fn name(&self) -> &str {
        "tool-schema"
    }
}

/// Removes unrecognised keys from each `tools[].function` mapping and returns
/// how many keys were dropped. Bodies of any other shape are left untouched.
pub fn sanitize(body: &mut Value) -> Result<usize, SanitizeError> {
    let Some(tools) = body
        .as_object_mut()
        .and_then(|map| map.get_mut("tools"))
        .and_then(Value::as_array_mut)
    else {
        return Ok(0);
    };

    let mut removed_total = 0;
    for function in tools
        .iter_mut()
        .filter_map(|tool| tool.get_mut("function"))
        .filter_map(Value::as_object_mut)
    {
        let invalid_keys: Vec<String> = function
            .keys()
            .filter(|key| !ALLOWED_FUNCTION_KEYS.contains(&key.as_str()))
            .cloned()
            .collect();

        if invalid_keys.is_empty() {
            continue;
        }

        let tool_name = function
            .get("name")
            .and_then(|name| name.as_str())
            .unwrap_or("<unnamed>");
        info!(
            tool = tool_name,
            removed = ?invalid_keys,
            "Removing invalid keys from tool definition"
        );
        for key in &invalid_keys {
            // shift_remove keeps the remaining keys in their original order
            function.shift_remove(key);
        }
        removed_total += invalid_keys.len();
    }

    Ok(removed_total)
}
