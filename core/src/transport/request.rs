use serde::Serialize;
use serde_json::Value;

use crate::error::TransportError;

/// JSON body of the generation request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerationRequest {
    pub brief_text: String,
    pub include_research: bool,
    pub selected_research_ids: Option<Vec<String>>,
    pub generator_config: Option<Value>,
}

impl GenerationRequest {
    /// Research ids are only sent when research is included.
    pub fn new(
        brief_text: impl Into<String>,
        include_research: bool,
        selected_research_ids: Vec<String>,
        generator_config: Option<Value>,
    ) -> Self {
        Self {
            brief_text: brief_text.into(),
            include_research,
            selected_research_ids: include_research.then_some(selected_research_ids),
            generator_config,
        }
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, TransportError> {
        serde_json::to_vec(self).map_err(TransportError::Encode)
    }
}
