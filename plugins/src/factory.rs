use std::sync::Arc;

use anyhow::Result;

use challenge_stream_core::config::{AppConfig, TransportConfig};
use challenge_stream_core::settings::SettingsStore;
use challenge_stream_core::transport::GenerationTransport;

use crate::store::JsonFileSettingsStore;
use crate::transport::{HttpGenerationTransport, ReplayGenerationTransport};

pub fn build_transport(cfg: &AppConfig) -> Result<Arc<dyn GenerationTransport>> {
    match &cfg.transport {
        TransportConfig::Http(http_cfg) => Ok(Arc::new(HttpGenerationTransport::new(http_cfg)?)),
        TransportConfig::Replay(r_cfg) => Ok(Arc::new(ReplayGenerationTransport::new(
            r_cfg.events_file.clone(),
            r_cfg.chunk_bytes,
        ))),
    }
}

pub fn build_settings_store(cfg: &AppConfig) -> Arc<dyn SettingsStore> {
    Arc::new(JsonFileSettingsStore::new(cfg.settings.path.clone()))
}
