use crate::agent::fallback;
use crate::agent::{ContextBuilder, ToolRegistry};
use crate::config::{MAX_ITERATIONS, MIN_ITERATIONS};
use crate::error::{AgentError, ToolError};
use crate::tools::file_write::{DEFAULT_FILENAME, content_from_args, filename_from_args};
use crate::traits::{
    ChatMessage, ChatRequest, ChatResponse, Provider, ToolCall, ToolCapability, ToolSpec,
};
use crate::workflow::NodeResult;
use serde_json::{Map, Value};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

const DEFAULT_MODEL: &str = "llama3.1";
const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(120);

const PERSISTENCE_KEYWORDS: &[&str] = &["save", "write", "file"];
const WRITE_SUCCESS_KEYWORDS: &[&str] = &["success", "write", "wrote", "written"];
const PLACEHOLDER_ANSWERS: &[&str] = &["ok", "okay", "done", "task completed", "task complete"];
const COMPLETED: &str = "Task completed.";

/// Per-run loop state. Lives in the call frame of one `run`, never on the
/// agent itself, so one `AgentLoop` can serve concurrent nodes.
struct LoopState {
    messages: Vec<ChatMessage>,
    observations: Vec<String>,
    search_history: Vec<String>,
    file_written: bool,
    corrections: usize,
    iterations: usize,
}

impl LoopState {
    fn new(messages: Vec<ChatMessage>) -> Self {
        Self {
            messages,
            observations: Vec::new(),
            search_history: Vec::new(),
            file_written: false,
            corrections: 0,
            iterations: 0,
        }
    }

    fn accumulated_output(&self) -> String {
        self.observations.join("\n")
    }

    fn raw_findings(&self) -> Option<String> {
        let trail = if self.search_history.is_empty() {
            self.accumulated_output()
        } else {
            self.search_history.join("\n")
        };
        (!trail.trim().is_empty()).then_some(trail)
    }

    fn observe(&mut self, capability: Option<ToolCapability>, observation: &str) {
        self.observations.push(observation.to_string());

        match capability {
            Some(ToolCapability::Search) => {
                self.search_history.push(observation.to_string());
            }
            Some(ToolCapability::Write) if write_succeeded(observation) => {
                self.file_written = true;
            }
            _ => {}
        }
    }
}

/// Everything one agent run produced, for callers that want more than the
/// node result.
#[derive(Debug, Clone)]
pub struct AgentOutcome {
    pub result: NodeResult,
    pub iterations: usize,
    pub corrections: usize,
    pub file_written: bool,
    pub transcript: Vec<ChatMessage>,
}

pub struct AgentLoop {
    provider: Arc<dyn Provider>,
    context_builder: ContextBuilder,
    tool_registry: Arc<ToolRegistry>,
    model: String,
    temperature: f64,
    max_iterations: usize,
    call_timeout: Duration,
}

impl AgentLoop {
    pub fn new(
        provider: Arc<dyn Provider>,
        context_builder: ContextBuilder,
        tool_registry: Arc<ToolRegistry>,
    ) -> Self {
        Self {
            provider,
            context_builder,
            tool_registry,
            model: DEFAULT_MODEL.to_string(),
            temperature: 0.0,
            max_iterations: MIN_ITERATIONS,
            call_timeout: DEFAULT_CALL_TIMEOUT,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    /// Clamped to the supported 3..=5 range.
    pub fn with_max_iterations(mut self, max: usize) -> Self {
        self.max_iterations = max.clamp(MIN_ITERATIONS, MAX_ITERATIONS);
        self
    }

    /// Applies to each LLM call and each tool call separately.
    pub fn with_call_timeout(mut self, call_timeout: Duration) -> Self {
        self.call_timeout = call_timeout;
        self
    }

    pub fn max_iterations(&self) -> usize {
        self.max_iterations
    }

    pub fn tool_registry(&self) -> &Arc<ToolRegistry> {
        &self.tool_registry
    }

    pub async fn run(&self, goal: &str, context: &str) -> NodeResult {
        self.run_detailed(goal, context).await.result
    }

    /// Runs THINK, ACT, OBSERVE until the model stops calling tools or the
    /// iteration budget is spent.
    pub async fn run_detailed(&self, goal: &str, context: &str) -> AgentOutcome {
        let specs = self.tool_registry.get_specs();
        let needs_file = requires_file(goal);
        let mut state =
            LoopState::new(self.context_builder.build_messages(goal, context, &specs));
        let mut final_answer = String::new();

        while state.iterations < self.max_iterations {
            state.iterations += 1;
            let iteration = state.iterations;

            let response = match self.think(&state.messages, &specs).await {
                Ok(response) => response,
                Err(e) => {
                    error!(iteration, error = %e, "agent run failed");
                    let result = NodeResult::error(e.to_string()).with_raw_findings(state.raw_findings());
                    return Self::outcome(state, result);
                }
            };

            let text = response.text_or_empty().trim().to_string();
            let mut calls = response.tool_calls;
            if calls.is_empty()
                && let Some(call) = fallback::decode_tool_call(&text, |name| {
                    self.tool_registry.contains(name)
                })
            {
                debug!(iteration, tool = %call.name, "decoded tool call from text");
                calls.push(call);
            }

            let dropped = calls.len().saturating_sub(1);
            let Some(call) = calls.into_iter().next() else {
                final_answer = text;

                if needs_file && !state.file_written {
                    state.corrections += 1;
                    warn!(iteration, "model stopped before saving a file, asking again");
                    if !final_answer.is_empty() {
                        state.messages.push(ChatMessage::assistant(final_answer.clone()));
                    }
                    let writer = self.tool_registry.find_by_capability(ToolCapability::Write);
                    state.messages.push(
                        self.context_builder
                            .correction_message(writer.as_ref().map(|t| t.name())),
                    );
                    continue;
                }

                if !final_answer.is_empty() {
                    state.messages.push(ChatMessage::assistant(final_answer.clone()));
                }
                break;
            };

            final_answer.clear();
            if dropped > 0 {
                warn!(iteration, dropped, tool = %call.name, "only the first tool call per turn is executed");
            }

            state.messages.push(ChatMessage::assistant_with_tool_calls(
                text,
                vec![call.clone()],
            ));

            let observation = match self.act(&call, &mut state).await {
                Ok(observation) => observation,
                Err(e) => {
                    error!(iteration, tool = %call.name, error = %e, "agent run failed");
                    let result = NodeResult::error(e.to_string()).with_raw_findings(state.raw_findings());
                    return Self::outcome(state, result);
                }
            };
            state.messages.push(ChatMessage::tool_result(call.id, observation));
        }

        if state.iterations >= self.max_iterations && final_answer.is_empty() {
            info!(iterations = state.iterations, "iteration budget spent");
        }

        let accumulated = state.accumulated_output();
        let output = if is_placeholder(&final_answer) {
            if accumulated.trim().is_empty() {
                COMPLETED.to_string()
            } else {
                accumulated
            }
        } else {
            final_answer
        };

        let result = NodeResult::success(output, state.raw_findings());
        Self::outcome(state, result)
    }

    async fn think(
        &self,
        messages: &[ChatMessage],
        specs: &[ToolSpec],
    ) -> Result<ChatResponse, AgentError> {
        let request = ChatRequest {
            messages,
            tools: if specs.is_empty() { None } else { Some(specs) },
        };

        match timeout(
            self.call_timeout,
            self.provider.chat(request, &self.model, self.temperature),
        )
        .await
        {
            Ok(Ok(response)) => Ok(response),
            Ok(Err(e)) => Err(AgentError::LlmInvocation(e.to_string())),
            Err(_) => Err(AgentError::Timeout {
                what: format!("LLM call to {}", self.provider.name()),
                limit: self.call_timeout,
            }),
        }
    }

    /// Executes one call and records its observation. Only a timeout is
    /// fatal; every other failure, an unfillable write included, comes back
    /// as observation text for the model's next turn.
    async fn act(&self, call: &ToolCall, state: &mut LoopState) -> Result<String, AgentError> {
        let tool = match self.tool_registry.resolve(&call.name) {
            Ok(tool) => tool,
            Err(e) => {
                warn!(tool = %call.name, "model asked for an unknown tool");
                let observation = e.observation();
                state.observe(None, &observation);
                return Ok(observation);
            }
        };

        let capability = tool.capability();
        let mut args = parse_arguments(&call.name, &call.arguments);

        if capability == ToolCapability::Write && !repair_write_args(&mut args, state) {
            warn!(tool = %call.name, "no content to write and nothing found so far");
            let observation = ToolError::MissingContent(tool.name().to_string()).observation();
            state.observe(Some(capability), &observation);
            return Ok(observation);
        }

        info!(tool = %call.name, "executing tool");
        let observation = timeout(self.call_timeout, ToolRegistry::invoke(&tool, args))
            .await
            .map_err(|_| AgentError::Timeout {
                what: format!("tool '{}'", call.name),
                limit: self.call_timeout,
            })?;

        state.observe(Some(capability), &observation);
        Ok(observation)
    }

    fn outcome(state: LoopState, result: NodeResult) -> AgentOutcome {
        AgentOutcome {
            result,
            iterations: state.iterations,
            corrections: state.corrections,
            file_written: state.file_written,
            transcript: state.messages,
        }
    }
}

/// Fills in missing write arguments from what the run has found so far.
/// Returns false when there is nothing to write.
fn repair_write_args(args: &mut Value, state: &LoopState) -> bool {
    let has_content = content_from_args(args).is_some();
    let has_filename = filename_from_args(args).is_some();
    let Some(map) = args.as_object_mut() else {
        return false;
    };

    if !has_content {
        let fill = if state.search_history.is_empty() {
            state.accumulated_output()
        } else {
            state.search_history.join("\n")
        };
        if fill.trim().is_empty() {
            return false;
        }
        warn!(chars = fill.len(), "write call had no content, filling from findings");
        map.insert("content".to_string(), Value::String(fill));
    }

    if !has_filename {
        map.insert(
            "filename".to_string(),
            Value::String(DEFAULT_FILENAME.to_string()),
        );
    }

    true
}

/// Lenient argument decoding: anything that is not a JSON object (or a
/// string holding one) becomes an empty map.
fn parse_arguments(tool: &str, raw: &str) -> Value {
    let empty = || Value::Object(Map::new());
    let raw = raw.trim();
    if raw.is_empty() {
        return empty();
    }

    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Value::Object(map),
        Ok(Value::String(inner)) => serde_json::from_str::<Value>(&inner)
            .ok()
            .filter(|v| v.is_object())
            .unwrap_or_else(empty),
        _ => {
            warn!(tool, "discarding malformed tool arguments");
            empty()
        }
    }
}

fn requires_file(goal: &str) -> bool {
    let goal = goal.to_lowercase();
    PERSISTENCE_KEYWORDS.iter().any(|k| goal.contains(k))
}

fn is_error_observation(observation: &str) -> bool {
    observation.trim_start().starts_with("Error")
}

fn write_succeeded(observation: &str) -> bool {
    if is_error_observation(observation) {
        return false;
    }
    let lower = observation.to_lowercase();
    WRITE_SUCCESS_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn is_placeholder(answer: &str) -> bool {
    let normalized = answer
        .trim()
        .trim_end_matches(['.', '!'])
        .trim()
        .to_lowercase();
    normalized.is_empty() || PLACEHOLDER_ANSWERS.contains(&normalized.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{
        CannedSearch, ScriptedProvider, StalledProvider, calls, text, tool_call,
    };
    use crate::tools::{FileWriteTool, WebSearchTool};
    use crate::workflow::NodeStatus;
    use serde_json::json;
    use std::path::Path;
    use tempfile::TempDir;

    fn agent(provider: Arc<dyn Provider>, search: Arc<CannedSearch>, dir: &Path) -> AgentLoop {
        let registry = Arc::new(ToolRegistry::new());
        registry.register(Arc::new(WebSearchTool::new(search)));
        registry.register(Arc::new(FileWriteTool::new(dir)));
        AgentLoop::new(provider, ContextBuilder::new(dir), registry)
    }

    #[tokio::test]
    async fn search_then_contentless_write_saves_the_findings() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![
            calls(vec![tool_call("c1", "web_search", json!({"query": "q"}))]),
            calls(vec![tool_call("c2", "file_write", json!({"filename": "out.txt"}))]),
            text("Done"),
        ]));
        let search = Arc::new(CannedSearch::new("X is 42"));
        let agent = agent(provider.clone(), search, tmp.path());

        let outcome = agent.run_detailed("find X and save it", "").await;

        assert!(outcome.file_written);
        assert_eq!(outcome.iterations, 3);
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("out.txt")).unwrap(),
            "X is 42"
        );
        assert_eq!(outcome.result.status, NodeStatus::Success);
        assert_eq!(outcome.result.raw_findings.as_deref(), Some("X is 42"));
        assert!(outcome.result.output.starts_with("X is 42\nFile written successfully"));
    }

    #[tokio::test]
    async fn never_exceeds_the_iteration_budget() {
        let tmp = TempDir::new().unwrap();
        let script = (0..10)
            .map(|i| calls(vec![tool_call(&format!("c{i}"), "web_search", json!({"query": "q"}))]))
            .collect();
        let provider = Arc::new(ScriptedProvider::new(script));
        let agent = agent(provider.clone(), Arc::new(CannedSearch::new("hit")), tmp.path())
            .with_max_iterations(4);

        let outcome = agent.run_detailed("look things up", "").await;

        assert_eq!(provider.call_count(), 4);
        assert_eq!(outcome.iterations, 4);
        assert_eq!(outcome.result.output, "hit\nhit\nhit\nhit");
    }

    #[test]
    fn budget_is_clamped() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![]));
        let search = Arc::new(CannedSearch::new(""));
        assert_eq!(
            agent(provider.clone(), search.clone(), tmp.path())
                .with_max_iterations(1)
                .max_iterations(),
            MIN_ITERATIONS
        );
        assert_eq!(
            agent(provider, search, tmp.path())
                .with_max_iterations(50)
                .max_iterations(),
            MAX_ITERATIONS
        );
    }

    #[tokio::test]
    async fn save_goal_is_corrected_before_finishing() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![
            text("All good."),
            calls(vec![tool_call(
                "c1",
                "file_write",
                json!({"filename": "r.txt", "content": "report"}),
            )]),
            text("Saved the report."),
        ]));
        let agent = agent(provider.clone(), Arc::new(CannedSearch::new("")), tmp.path());

        let outcome = agent.run_detailed("Write a report", "").await;

        assert_eq!(outcome.corrections, 1);
        assert!(outcome.file_written);
        assert_eq!(outcome.result.output, "Saved the report.");

        let second_turn = &provider.transcripts()[1];
        let alert = second_turn.last().unwrap();
        assert_eq!(alert.role, crate::traits::Role::System);
        assert!(alert.content.contains("Call file_write now."));
    }

    #[tokio::test]
    async fn correction_gate_is_bounded_by_the_budget() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![
            text("I am finished"),
            text("I am finished"),
            text("I am finished"),
        ]));
        let agent = agent(provider.clone(), Arc::new(CannedSearch::new("")), tmp.path());

        let outcome = agent.run_detailed("save the list to a file", "").await;

        assert_eq!(provider.call_count(), 3);
        assert_eq!(outcome.corrections, 3);
        assert!(!outcome.file_written);
        assert_eq!(outcome.result.status, NodeStatus::Success);
        assert_eq!(outcome.result.output, "I am finished");
    }

    #[tokio::test]
    async fn only_the_first_call_of_a_turn_runs() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![
            calls(vec![
                tool_call("c1", "web_search", json!({"query": "first"})),
                tool_call("c2", "web_search", json!({"query": "second"})),
            ]),
            text("answer"),
        ]));
        let search = Arc::new(CannedSearch::new("hit"));
        let agent = agent(provider.clone(), search.clone(), tmp.path());

        let outcome = agent.run_detailed("look it up", "").await;

        assert_eq!(search.queries(), vec!["first"]);
        let assistant_turn = &outcome.transcript[2];
        assert_eq!(assistant_turn.tool_calls.as_ref().unwrap().len(), 1);
        assert_eq!(outcome.transcript[3].tool_call_id.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn unfillable_write_is_reported_and_the_loop_goes_on() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![
            calls(vec![tool_call("c1", "file_write", json!({"filename": "a.txt"}))]),
            calls(vec![tool_call("c2", "web_search", json!({"query": "X"}))]),
            calls(vec![tool_call("c3", "file_write", json!({"filename": "a.txt"}))]),
            text("Done"),
        ]));
        let agent = agent(provider.clone(), Arc::new(CannedSearch::new("X is 42")), tmp.path())
            .with_max_iterations(5);

        let outcome = agent.run_detailed("find X and save it", "").await;

        assert_eq!(provider.call_count(), 4);
        let second_turn = &provider.transcripts()[1];
        let observation = second_turn.last().unwrap();
        assert_eq!(observation.role, crate::traits::Role::Tool);
        assert_eq!(observation.content, "Error: No content provided for file_write");

        assert!(outcome.file_written);
        assert_eq!(outcome.result.status, NodeStatus::Success);
        assert_eq!(
            std::fs::read_to_string(tmp.path().join("a.txt")).unwrap(),
            "X is 42"
        );
    }

    #[tokio::test]
    async fn structured_write_content_is_not_replaced_by_findings() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![
            calls(vec![tool_call("c1", "web_search", json!({"query": "X"}))]),
            calls(vec![tool_call(
                "c2",
                "file_write",
                json!({"filename": "x.json", "content": {"x": 42, "source": "search"}}),
            )]),
            text("Saved."),
        ]));
        let agent = agent(provider, Arc::new(CannedSearch::new("X is 42")), tmp.path());

        let outcome = agent.run_detailed("find X and save it", "").await;

        assert!(outcome.file_written);
        let written = std::fs::read_to_string(tmp.path().join("x.json")).unwrap();
        let parsed: Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed, json!({"x": 42, "source": "search"}));
    }

    #[tokio::test]
    async fn failed_searches_still_count_as_findings() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![
            calls(vec![tool_call("c1", "web_search", json!({}))]),
            text("nothing to report"),
        ]));
        let agent = agent(provider, Arc::new(CannedSearch::new("unused")), tmp.path());

        let result = agent.run("look it up", "").await;

        assert_eq!(
            result.raw_findings.as_deref(),
            Some("Error: Invalid arguments: missing 'query'")
        );
    }

    #[tokio::test]
    async fn tools_registered_later_are_advertised() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![text("Paris")]));
        let registry = Arc::new(ToolRegistry::new());
        registry.register(Arc::new(WebSearchTool::new(Arc::new(CannedSearch::new("")))));
        let agent = AgentLoop::new(provider.clone(), ContextBuilder::new(tmp.path()), registry);

        agent
            .tool_registry()
            .register(Arc::new(FileWriteTool::new(tmp.path())));
        agent.run("capital of France", "").await;

        let system_prompt = &provider.transcripts()[0][0].content;
        assert!(system_prompt.contains("**web_search**"));
        assert!(system_prompt.contains("**file_write**"));
    }

    #[tokio::test]
    async fn prose_tool_calls_are_executed() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![
            text(r#"Let me check. {"name": "web_search", "parameters": {"query": "rust"}}"#),
            text("Rust is a systems language."),
        ]));
        let search = Arc::new(CannedSearch::new("rust-lang.org: fast and safe"));
        let agent = agent(provider, search.clone(), tmp.path());

        let result = agent.run("what is rust", "").await;

        assert_eq!(search.queries(), vec!["rust"]);
        assert_eq!(result.output, "Rust is a systems language.");
        assert_eq!(
            result.raw_findings.as_deref(),
            Some("rust-lang.org: fast and safe")
        );
    }

    #[tokio::test]
    async fn llm_failure_fails_the_node_but_keeps_findings() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![
            calls(vec![tool_call("c1", "web_search", json!({"query": "q"}))]),
            Err(anyhow::anyhow!("connection refused")),
        ]));
        let agent = agent(provider, Arc::new(CannedSearch::new("hit")), tmp.path());

        let result = agent.run("find things", "").await;

        assert!(result.is_error());
        assert!(result.detail.unwrap().contains("connection refused"));
        assert_eq!(result.raw_findings.as_deref(), Some("hit"));
    }

    #[tokio::test]
    async fn stalled_llm_times_out() {
        let tmp = TempDir::new().unwrap();
        let agent = agent(
            Arc::new(StalledProvider),
            Arc::new(CannedSearch::new("")),
            tmp.path(),
        )
        .with_call_timeout(Duration::from_millis(50));

        let result = agent.run("anything", "").await;

        assert_eq!(result.status, NodeStatus::Error);
        assert!(result.detail.unwrap().contains("timed out after 50ms"));
    }

    #[tokio::test]
    async fn unknown_tools_are_reported_back() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![
            calls(vec![tool_call("c1", "shell", json!({"cmd": "ls"}))]),
            text("gave up"),
        ]));
        let agent = agent(provider.clone(), Arc::new(CannedSearch::new("")), tmp.path());

        let result = agent.run("list directories", "").await;

        let observation = provider.transcripts()[1].last().unwrap().clone();
        assert_eq!(observation.role, crate::traits::Role::Tool);
        assert_eq!(observation.content, "Error: Tool 'shell' not found");
        assert_eq!(result.output, "gave up");
    }

    #[tokio::test]
    async fn plain_answer_ends_immediately() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![text("Paris")]));
        let agent = agent(provider.clone(), Arc::new(CannedSearch::new("")), tmp.path());

        let result = agent.run("capital of France", "[a]\nfrance facts").await;

        assert_eq!(provider.call_count(), 1);
        assert_eq!(result.output, "Paris");
        assert_eq!(result.raw_findings, None);

        let user_turn = &provider.transcripts()[0][1];
        assert!(user_turn.content.contains("CONTEXT FROM PREVIOUS STEPS"));
    }

    #[tokio::test]
    async fn placeholder_without_evidence_becomes_completed() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![text("OK.")]));
        let agent = agent(provider, Arc::new(CannedSearch::new("")), tmp.path());

        assert_eq!(agent.run("say hi", "").await.output, COMPLETED);
    }

    #[tokio::test]
    async fn malformed_write_arguments_are_repaired() {
        let tmp = TempDir::new().unwrap();
        let provider = Arc::new(ScriptedProvider::new(vec![
            calls(vec![tool_call("c1", "web_search", json!({"query": "q"}))]),
            calls(vec![ToolCall {
                id: "c2".into(),
                name: "file_write".into(),
                arguments: "{broken".into(),
            }]),
            text("done"),
        ]));
        let agent = agent(provider, Arc::new(CannedSearch::new("found it")), tmp.path());

        let outcome = agent.run_detailed("save what you find", "").await;

        assert!(outcome.file_written);
        assert_eq!(
            std::fs::read_to_string(tmp.path().join(DEFAULT_FILENAME)).unwrap(),
            "found it"
        );
    }

    #[test]
    fn argument_decoding_is_lenient() {
        assert_eq!(parse_arguments("t", ""), json!({}));
        assert_eq!(parse_arguments("t", "[1, 2]"), json!({}));
        assert_eq!(parse_arguments("t", r#""{\"q\": 1}""#), json!({"q": 1}));
        assert_eq!(parse_arguments("t", r#"{"q": "x"}"#), json!({"q": "x"}));
    }

    #[test]
    fn write_success_detection() {
        assert!(write_succeeded("File written successfully: /tmp/a"));
        assert!(!write_succeeded("Error: failed to write file"));
        assert!(!write_succeeded("nothing happened"));
    }

    #[test]
    fn placeholders() {
        assert!(is_placeholder(""));
        assert!(is_placeholder("Done!"));
        assert!(is_placeholder("task completed."));
        assert!(!is_placeholder("The answer is 42."));
    }
}
