//! Robot configuration – reads/writes `~/.homebot/config.toml`.
//!
//! Every field has a default, so a partial file (or none at all) is valid.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use homebot_perception::PerceptionConfig;
use homebot_runtime::TurnLoopConfig;
use homebot_types::{DistanceMode, Language};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Serial port name that selects the in-process simulated board.
pub const SIM_PORT: &str = "sim";

/// Persisted robot configuration.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where the fused distance comes from: `"sensor"` or `"vision"`.
    pub distance_mode: DistanceMode,
    pub audio: AudioSection,
    pub vision: VisionSection,
    pub ollama: OllamaSection,
    pub arduino: ArduinoSection,
    pub turn: TurnSection,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSection {
    /// Microphone index; `None` picks the system default.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub input_device_index: Option<u32>,
    /// Substring of the synthesiser voice name to select.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_voice: Option<String>,
    /// Recognition locale, e.g. `"pt-BR"`.  Also picks the phrasebook.
    pub language: String,
}

impl AudioSection {
    /// `true` when a microphone or voice is pinned in the file.
    pub fn has_device_settings(&self) -> bool {
        self.input_device_index.is_some() || self.output_voice.is_some()
    }
}

impl Default for AudioSection {
    fn default() -> Self {
        Self {
            input_device_index: None,
            output_voice: None,
            language: "pt-BR".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionSection {
    pub model_path: String,
    pub camera_index: u32,
    pub confidence_threshold: f32,
    pub focal_length_px: f64,
    pub known_object_width_m: f64,
}

impl Default for VisionSection {
    fn default() -> Self {
        let perception = PerceptionConfig::default();
        Self {
            model_path: "yolov8n.pt".to_string(),
            camera_index: 0,
            confidence_threshold: perception.confidence_threshold,
            focal_length_px: perception.focal_length_px,
            known_object_width_m: perception.known_object_width_m,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OllamaSection {
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
}

impl Default for OllamaSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:11434".to_string(),
            model: "llama3".to_string(),
            temperature: 0.7,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArduinoSection {
    /// Serial device path, or [`SIM_PORT`] for the simulated board.
    pub port: String,
    pub baudrate: u32,
    pub timeout_s: f64,
}

impl Default for ArduinoSection {
    fn default() -> Self {
        Self {
            port: "/dev/ttyACM0".to_string(),
            baudrate: 9600,
            timeout_s: 2.0,
        }
    }
}

impl ArduinoSection {
    pub fn is_simulated(&self) -> bool {
        self.port == SIM_PORT
    }

    pub fn timeout(&self) -> Result<Duration, String> {
        seconds("arduino.timeout_s", self.timeout_s)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurnSection {
    pub listen_timeout_s: f64,
}

impl Default for TurnSection {
    fn default() -> Self {
        Self {
            listen_timeout_s: 5.0,
        }
    }
}

impl Config {
    pub fn language(&self) -> Language {
        Language::from_locale(&self.audio.language)
    }

    pub fn perception(&self) -> PerceptionConfig {
        PerceptionConfig {
            confidence_threshold: self.vision.confidence_threshold,
            focal_length_px: self.vision.focal_length_px,
            known_object_width_m: self.vision.known_object_width_m,
        }
    }

    pub fn turn_loop(&self) -> Result<TurnLoopConfig, String> {
        Ok(TurnLoopConfig {
            distance_mode: self.distance_mode,
            language: self.language(),
            listen_timeout: seconds("turn.listen_timeout_s", self.turn.listen_timeout_s)?,
        })
    }
}

fn seconds(field: &str, value: f64) -> Result<Duration, String> {
    Duration::try_from_secs_f64(value).map_err(|e| format!("Invalid {field} = {value}: {e}"))
}

/// Return the path to `~/.homebot/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".homebot").join("config.toml")
}

/// Load the config from `path`.  Returns `None` if the file does not exist.
pub fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let mut cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    apply_env_overrides(&mut cfg);
    Ok(Some(cfg))
}

/// Apply `HOMEBOT_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `HOMEBOT_OLLAMA_URL` | `ollama.base_url` |
/// | `HOMEBOT_MODEL` | `ollama.model` |
/// | `HOMEBOT_SERIAL_PORT` | `arduino.port` |
/// | `HOMEBOT_DISTANCE_MODE` | `distance_mode` |
pub fn apply_env_overrides(cfg: &mut Config) {
    apply_overrides(cfg, |name| std::env::var(name).ok());
}

fn apply_overrides(cfg: &mut Config, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("HOMEBOT_OLLAMA_URL") {
        cfg.ollama.base_url = v;
    }
    if let Some(v) = var("HOMEBOT_MODEL") {
        cfg.ollama.model = v;
    }
    if let Some(v) = var("HOMEBOT_SERIAL_PORT") {
        cfg.arduino.port = v;
    }
    if let Some(v) = var("HOMEBOT_DISTANCE_MODE") {
        match v.parse::<DistanceMode>() {
            Ok(mode) => cfg.distance_mode = mode,
            Err(e) => warn!(value = %v, error = %e, "ignoring HOMEBOT_DISTANCE_MODE"),
        }
    }
}

/// Save the config to `path`, creating its directory if necessary.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    #[cfg(unix)]
    {
        use std::io::Write;
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| f.write_all(raw.as_bytes()))
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}
