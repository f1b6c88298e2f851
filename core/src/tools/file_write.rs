use crate::error::ToolError;
use crate::tools::first_string_arg;
use crate::traits::{Tool, ToolCapability, ToolResult};
use async_trait::async_trait;
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

pub const CONTENT_KEYS: &[&str] = &["content", "data", "text", "body"];
pub const FILENAME_KEYS: &[&str] = &["filename", "path", "file"];
pub const DEFAULT_FILENAME: &str = "output.txt";

/// Writes named content into a sandbox directory. Only the base name of the
/// requested filename is used.
pub struct FileWriteTool {
    output_dir: PathBuf,
}

impl FileWriteTool {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }
}

/// Content to write, if the arguments carry any under a recognised key.
/// Structured values are written as JSON text.
pub fn content_from_args(args: &serde_json::Value) -> Option<String> {
    CONTENT_KEYS
        .iter()
        .filter_map(|key| match args.get(*key)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            structured => serde_json::to_string_pretty(structured).ok(),
        })
        .find(|content| !content.trim().is_empty())
}

pub fn filename_from_args(args: &serde_json::Value) -> Option<String> {
    first_string_arg(args, FILENAME_KEYS)
}

/// Reduces a requested filename to a bare name with no directory parts.
pub fn sanitize_filename(requested: &str) -> Option<String> {
    let base = requested
        .trim()
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default()
        .trim();

    match base {
        "" | "." | ".." => None,
        name => Some(name.to_string()),
    }
}

#[async_trait]
impl Tool for FileWriteTool {
    fn name(&self) -> &str {
        "file_write"
    }

    fn description(&self) -> &str {
        "Write text content to a named file in the output directory. Returns the written path."
    }

    fn parameters_schema(&self) -> serde_json::Value {
        json!({
            "type": "object",
            "properties": {
                "filename": {
                    "type": "string",
                    "description": "Name of the file to write, e.g. results.txt"
                },
                "content": {
                    "type": "string",
                    "description": "Text to write into the file"
                }
            },
            "required": ["filename", "content"]
        })
    }

    fn capability(&self) -> ToolCapability {
        ToolCapability::Write
    }

    async fn execute(&self, args: serde_json::Value) -> anyhow::Result<ToolResult> {
        let Some(content) = content_from_args(&args) else {
            return Ok(ToolResult::error(
                ToolError::MissingContent(self.name().to_string()).to_string(),
            ));
        };

        let requested = filename_from_args(&args).unwrap_or_else(|| DEFAULT_FILENAME.to_string());
        let Some(filename) = sanitize_filename(&requested) else {
            return Ok(ToolResult::error(format!(
                "Invalid filename '{}'",
                requested
            )));
        };

        tokio::fs::create_dir_all(&self.output_dir).await?;
        let full_path = self.output_dir.join(&filename);

        match tokio::fs::write(&full_path, content.as_bytes()).await {
            Ok(()) => {
                tracing::info!(path = %full_path.display(), bytes = content.len(), "file written");
                Ok(ToolResult::success(format!(
                    "File written successfully: {}",
                    full_path.display()
                )))
            }
            Err(e) => Ok(ToolResult::error(format!("Failed to write file: {}", e))),
        }
    }
}
