use serde_json::Value;

pub mod file_write;
pub mod web_search;

pub use file_write::FileWriteTool;
pub use web_search::WebSearchTool;

/// First non-blank string found under any of `keys`, in order.
pub fn first_string_arg(args: &Value, keys: &[&str]) -> Option<String> {
    keys.iter()
        .filter_map(|key| args.get(*key).and_then(|v| v.as_str()))
        .find(|s| !s.trim().is_empty())
        .map(|s| s.to_string())
}
