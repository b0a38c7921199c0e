use std::path::Path;

use crate::error::ConfigError;

use super::types::{AppConfig, TransportConfig};

pub const ENV_BASE_URL: &str = "CHALLENGE_STREAM_BASE_URL";
pub const ENV_TIMEOUT_SECS: &str = "CHALLENGE_STREAM_TIMEOUT_SECS";
pub const ENV_PACING_MS: &str = "CHALLENGE_STREAM_PACING_MS";
pub const ENV_SETTINGS_PATH: &str = "CHALLENGE_STREAM_SETTINGS_PATH";

pub fn load_default() -> Result<AppConfig, ConfigError> {
    let mut cfg = if Path::new("config.toml").exists() {
        read_config("config.toml")?
    } else {
        AppConfig::default()
    };
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    if !path.exists() {
        return Err(ConfigError::NotFound(path.display().to_string()));
    }
    let mut cfg = read_config(path)?;
    apply_env_overrides(&mut cfg, |key| std::env::var(key).ok())?;
    Ok(cfg)
}

fn read_config(path: impl AsRef<Path>) -> Result<AppConfig, ConfigError> {
    let path = path.as_ref();
    let s = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.display().to_string(),
        source,
    })?;
    toml::from_str::<AppConfig>(&s).map_err(|e| ConfigError::Parse(e.into()))
}

pub(crate) fn apply_env_overrides<F>(cfg: &mut AppConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    if let Some(v) = get(ENV_BASE_URL) {
        match cfg.transport {
            TransportConfig::Http(ref mut http) => http.base_url = v,
            TransportConfig::Replay(_) => {
                tracing::warn!(
                    target: "challenge_stream.config",
                    key = ENV_BASE_URL,
                    "ignoring base url override for replay transport"
                );
            }
        }
    }
    if let Some(v) = get(ENV_TIMEOUT_SECS) {
        cfg.control.timeout_secs = parse_env(ENV_TIMEOUT_SECS, &v)?;
    }
    if let Some(v) = get(ENV_PACING_MS) {
        cfg.control.pacing_ms = parse_env(ENV_PACING_MS, &v)?;
    }
    if let Some(v) = get(ENV_SETTINGS_PATH) {
        cfg.settings.path = v;
    }
    Ok(())
}

fn parse_env(key: &str, value: &str) -> Result<u64, ConfigError> {
    value
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::EnvInvalid {
            key: key.to_string(),
            source: e.into(),
        })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_match_the_backend_contract() {
        let cfg = AppConfig::default();
        assert_eq!(cfg.control.timeout_secs, 120);
        assert_eq!(cfg.control.pacing_ms, 1_500);
        assert_eq!(cfg.settings.generator_config_key, "challenge_model_config");
        match cfg.transport {
            TransportConfig::Http(http) => assert_eq!(
                http.endpoint(),
                "http://localhost:8000/api/generate-challenge-statements"
            ),
            other => panic!("unexpected transport: {other:?}"),
        }
    }

    #[test]
    fn env_overrides_apply_and_blank_values_are_ignored() {
        let mut cfg = AppConfig::default();
        apply_env_overrides(
            &mut cfg,
            env(&[
                (ENV_BASE_URL, "https://gen.example.com/"),
                (ENV_TIMEOUT_SECS, "30"),
                (ENV_PACING_MS, "  "),
            ]),
        )
        .unwrap();

        assert_eq!(cfg.control.timeout_secs, 30);
        assert_eq!(cfg.control.pacing_ms, 1_500);
        let TransportConfig::Http(http) = cfg.transport else {
            panic!("expected http transport");
        };
        assert_eq!(
            http.endpoint(),
            "https://gen.example.com/api/generate-challenge-statements"
        );
    }

    #[test]
    fn invalid_numeric_env_is_rejected() {
        let mut cfg = AppConfig::default();
        let err = apply_env_overrides(&mut cfg, env(&[(ENV_TIMEOUT_SECS, "soon")])).unwrap_err();
        assert!(matches!(err, ConfigError::EnvInvalid { ref key, .. } if key == ENV_TIMEOUT_SECS));
    }

    #[test]
    fn toml_file_selects_replay_transport() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
[transport]
provider = "replay"
events_file = "fixtures/run.sse"

[control]
timeout_secs = 5
pacing_ms = 0
"#,
        )
        .unwrap();

        let cfg = read_config(&path).unwrap();
        assert_eq!(cfg.control.timeout_secs, 5);
        assert_eq!(cfg.control.command_buffer, 16);
        match cfg.transport {
            TransportConfig::Replay(r) => {
                assert_eq!(r.events_file, "fixtures/run.sse");
                assert_eq!(r.chunk_bytes, 512);
            }
            other => panic!("unexpected transport: {other:?}"),
        }
    }

    #[test]
    fn missing_explicit_path_is_not_found() {
        let err = load_from_path("/definitely/not/here/config.toml").unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }
}
