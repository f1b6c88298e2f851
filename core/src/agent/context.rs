use crate::traits::{ChatMessage, ToolSpec};
use std::fmt::Write;
use std::path::{Path, PathBuf};

const CONTEXT_MAX_CHARS: usize = 24_000;

const EXECUTION_RULES: &str = "You are a truthful execution agent.

CRITICAL RULES:
1. If you cannot find information, admit it. Do NOT make up facts.
2. You must be SEQUENTIAL. Call at most one tool per turn.
3. If you need information, call the search tool and rely on its exact findings.
4. If you write a file, you MUST use data you actually found.
5. Use the tool calling API. Do NOT print tool calls as JSON in your answer.
6. Do NOT use placeholders like '[value found]'. If you lack a value, search again.
7. If a search returns nothing useful, try a different query.
8. When the goal is complete, reply with a short final answer and no tool call.";

/// Assembles the head of an agent transcript for one goal. The tool list is
/// passed per run so tools registered after construction are advertised.
pub struct ContextBuilder {
    pub output_dir: PathBuf,
}

impl ContextBuilder {
    pub fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
        }
    }

    pub fn build_system_prompt(&self, tool_specs: &[ToolSpec]) -> String {
        let mut parts = vec![EXECUTION_RULES.to_string()];

        if let Some(tools) = Self::get_tool_instructions(tool_specs) {
            parts.push(tools);
        }
        parts.push(self.get_runtime_context());

        parts.join("\n\n---\n\n")
    }

    fn get_tool_instructions(tool_specs: &[ToolSpec]) -> Option<String> {
        if tool_specs.is_empty() {
            return None;
        }

        let mut instructions = String::from("## Available Tools\n\n");
        for tool in tool_specs {
            let _ = writeln!(
                instructions,
                "**{}**: {}\nParameters: `{}`\n",
                tool.name, tool.description, tool.parameters_schema
            );
        }

        Some(instructions)
    }

    fn get_runtime_context(&self) -> String {
        let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M (%A)");

        format!(
            "## Runtime Context

### Current Time
{}

### Output Directory
{}",
            timestamp,
            self.output_dir.display()
        )
    }

    pub fn build_user_message(&self, goal: &str, context: &str) -> String {
        let context = context.trim();
        if context.is_empty() {
            return format!("GOAL: {}", goal.trim());
        }

        let context = if context.chars().count() > CONTEXT_MAX_CHARS {
            let truncated: String = context.chars().take(CONTEXT_MAX_CHARS).collect();
            format!("{}\n[... context truncated at {} chars]", truncated, CONTEXT_MAX_CHARS)
        } else {
            context.to_string()
        };

        format!(
            "GOAL: {}\n\n--- CONTEXT FROM PREVIOUS STEPS ---\n{}",
            goal.trim(),
            context
        )
    }

    pub fn build_messages(
        &self,
        goal: &str,
        context: &str,
        tool_specs: &[ToolSpec],
    ) -> Vec<ChatMessage> {
        vec![
            ChatMessage::system(self.build_system_prompt(tool_specs)),
            ChatMessage::user(self.build_user_message(goal, context)),
        ]
    }

    /// Sent when the model tries to stop before producing a required file.
    pub fn correction_message(&self, write_tool: Option<&str>) -> ChatMessage {
        let tool = write_tool.unwrap_or("the file writing tool");
        ChatMessage::system(format!(
            "SYSTEM ALERT: You have NOT saved the file yet. You are NOT done. Call {} now.",
            tool
        ))
    }
}
