use crate::traits::{
    ChatMessage, ChatRequest, ChatResponse, Provider, SearchProvider, StepRecord, StepRecorder,
    ToolCall,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::Mutex;
use tokio::sync::mpsc;

pub fn tool_call(id: &str, name: &str, arguments: serde_json::Value) -> ToolCall {
    ToolCall {
        id: id.to_string(),
        name: name.to_string(),
        arguments: arguments.to_string(),
    }
}

pub fn calls(calls: Vec<ToolCall>) -> anyhow::Result<ChatResponse> {
    Ok(ChatResponse {
        text: None,
        tool_calls: calls,
    })
}

pub fn text(text: &str) -> anyhow::Result<ChatResponse> {
    Ok(ChatResponse {
        text: Some(text.to_string()),
        tool_calls: vec![],
    })
}

/// Replays a fixed script of responses, then answers with empty text.
pub struct ScriptedProvider {
    script: Mutex<VecDeque<anyhow::Result<ChatResponse>>>,
    seen: Mutex<Vec<Vec<ChatMessage>>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<anyhow::Result<ChatResponse>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn transcripts(&self) -> Vec<Vec<ChatMessage>> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn chat(
        &self,
        request: ChatRequest<'_>,
        _model: &str,
        _temperature: f64,
    ) -> anyhow::Result<ChatResponse> {
        self.seen.lock().unwrap().push(request.messages.to_vec());
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(ChatResponse::default()))
    }
}

/// Never answers in time.
pub struct StalledProvider;

#[async_trait]
impl Provider for StalledProvider {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn chat(
        &self,
        _request: ChatRequest<'_>,
        _model: &str,
        _temperature: f64,
    ) -> anyhow::Result<ChatResponse> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(ChatResponse::default())
    }
}

pub struct CannedSearch {
    answer: String,
    queries: Mutex<Vec<String>>,
}

impl CannedSearch {
    pub fn new(answer: &str) -> Self {
        Self {
            answer: answer.to_string(),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl SearchProvider for CannedSearch {
    fn name(&self) -> &str {
        "canned"
    }

    async fn search(&self, query: &str) -> String {
        self.queries.lock().unwrap().push(query.to_string());
        self.answer.clone()
    }
}

pub struct ChannelRecorder {
    tx: mpsc::UnboundedSender<StepRecord>,
}

impl ChannelRecorder {
    pub fn new() -> (Self, mpsc::UnboundedReceiver<StepRecord>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

#[async_trait]
impl StepRecorder for ChannelRecorder {
    fn name(&self) -> &str {
        "channel"
    }

    async fn record(&self, step: StepRecord) -> anyhow::Result<()> {
        self.tx
            .send(step)
            .map_err(|_| anyhow::anyhow!("recorder channel closed"))
    }
}

pub struct FailingRecorder;

#[async_trait]
impl StepRecorder for FailingRecorder {
    fn name(&self) -> &str {
        "failing"
    }

    async fn record(&self, _step: StepRecord) -> anyhow::Result<()> {
        Err(anyhow::anyhow!("database is locked"))
    }
}
