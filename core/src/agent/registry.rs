use crate::error::ToolError;
use crate::traits::{Tool, ToolCapability, ToolSpec};
use std::sync::{Arc, Mutex, MutexGuard};

/// Named tools available to the agent. Registration happens up front;
/// lookups are by exact name.
pub struct ToolRegistry {
    tools: Mutex<Vec<Arc<dyn Tool>>>,
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self {
            tools: Mutex::new(Vec::new()),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<dyn Tool>>> {
        self.tools.lock().unwrap_or_else(|e| e.into_inner())
    }

    pub fn register(&self, tool: Arc<dyn Tool>) {
        let mut tools = self.lock();
        if let Some(existing) = tools.iter_mut().find(|t| t.name() == tool.name()) {
            tracing::warn!(tool = tool.name(), "replacing already registered tool");
            *existing = tool;
        } else {
            tools.push(tool);
        }
    }

    pub fn names(&self) -> Vec<String> {
        self.lock().iter().map(|t| t.name().to_string()).collect()
    }

    pub fn get_specs(&self) -> Vec<ToolSpec> {
        self.lock().iter().map(|t| t.spec()).collect()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.lock().iter().any(|t| t.name() == name)
    }

    /// First registered tool with the given capability.
    pub fn find_by_capability(&self, capability: ToolCapability) -> Option<Arc<dyn Tool>> {
        self.lock()
            .iter()
            .find(|t| t.capability() == capability)
            .cloned()
    }

    pub fn resolve(&self, name: &str) -> Result<Arc<dyn Tool>, ToolError> {
        self.lock()
            .iter()
            .find(|t| t.name() == name)
            .cloned()
            .ok_or_else(|| ToolError::NotFound(name.to_string()))
    }

    /// Runs a resolved tool and always hands back observation text.
    pub async fn invoke(tool: &Arc<dyn Tool>, args: serde_json::Value) -> String {
        match tool.execute(args).await {
            Ok(result) => result.observation(),
            Err(e) => ToolError::Execution(e.to_string()).observation(),
        }
    }

    pub async fn execute(&self, name: &str, args: serde_json::Value) -> String {
        match self.resolve(name) {
            Ok(tool) => Self::invoke(&tool, args).await,
            Err(e) => e.observation(),
        }
    }
}
