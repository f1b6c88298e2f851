pub mod jsonl;

pub use jsonl::JsonlRecorder;

use crate::config::RecorderConfig;
use crate::traits::StepRecorder;
use std::sync::Arc;

/// The configured step recorder, if recording is enabled.
pub fn create_recorder(config: &RecorderConfig) -> Option<Arc<dyn StepRecorder>> {
    if !config.enabled {
        return None;
    }
    Some(Arc::new(JsonlRecorder::new(&config.path)))
}
