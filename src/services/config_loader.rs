use serde::Deserialize;
use std::fs;
use std::path::Path;
use tracing::info;

pub const CONFIG_FILE_NAME: &str = "arena.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct ImportConfig {
    #[serde(default = "default_header_scan_rows")]
    pub header_scan_rows: usize,
    /// Column holding a per-row target when no header names one. A negative
    /// value disables the lookup.
    #[serde(
        default = "default_target_fallback_column",
        deserialize_with = "deserialize_optional_column"
    )]
    pub target_fallback_column: Option<usize>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            header_scan_rows: default_header_scan_rows(),
            target_fallback_column: default_target_fallback_column(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct VisionConfig {
    #[serde(default = "default_vision_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_vision_model")]
    pub model: String,
    /// Name of the environment variable that holds the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_vision_timeout_seconds")]
    pub timeout_seconds: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: default_vision_endpoint(),
            model: default_vision_model(),
            api_key_env: default_api_key_env(),
            timeout_seconds: default_vision_timeout_seconds(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PresentationConfig {
    #[serde(default = "default_auto_cycle_seconds")]
    pub auto_cycle_seconds: f64,
    #[serde(default = "default_rows_per_page")]
    pub rows_per_page: usize,
    #[serde(
        default = "default_row_move_animation_seconds",
        alias = "row_fly_animation_seconds"
    )]
    pub row_move_animation_seconds: f32,
    #[serde(default = "default_logo_scroll_seconds")]
    pub logo_scroll_seconds: f32,
    /// Shown in place of an uploaded logo when none is set.
    #[serde(default)]
    pub fallback_logo_path: Option<String>,
}

impl Default for PresentationConfig {
    fn default() -> Self {
        Self {
            auto_cycle_seconds: default_auto_cycle_seconds(),
            rows_per_page: default_rows_per_page(),
            row_move_animation_seconds: default_row_move_animation_seconds(),
            logo_scroll_seconds: default_logo_scroll_seconds(),
            fallback_logo_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ArenaConfig {
    #[serde(default = "default_store_path")]
    pub store_path: String,
    #[serde(default)]
    pub import: ImportConfig,
    #[serde(default)]
    pub vision: VisionConfig,
    #[serde(default)]
    pub presentation: PresentationConfig,
}

impl Default for ArenaConfig {
    fn default() -> Self {
        Self {
            store_path: default_store_path(),
            import: ImportConfig::default(),
            vision: VisionConfig::default(),
            presentation: PresentationConfig::default(),
        }
    }
}

fn default_store_path() -> String {
    "arena_store.json".to_string()
}

fn default_header_scan_rows() -> usize {
    20
}

fn default_target_fallback_column() -> Option<usize> {
    Some(14)
}

fn deserialize_optional_column<'de, D>(deserializer: D) -> Result<Option<usize>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let raw = i64::deserialize(deserializer)?;
    Ok(usize::try_from(raw).ok())
}

fn default_vision_endpoint() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

fn default_vision_model() -> String {
    "gemini-2.5-flash".to_string()
}

fn default_api_key_env() -> String {
    "API_KEY".to_string()
}

fn default_vision_timeout_seconds() -> u64 {
    60
}

fn default_auto_cycle_seconds() -> f64 {
    40.0
}

fn default_rows_per_page() -> usize {
    12
}

fn default_row_move_animation_seconds() -> f32 {
    0.45
}

fn default_logo_scroll_seconds() -> f32 {
    25.0
}

pub fn load_arena_config(folder: &Path) -> Result<ArenaConfig, String> {
    let config_path = folder.join(CONFIG_FILE_NAME);
    if !config_path.exists() {
        info!(
            "{CONFIG_FILE_NAME} not found, using defaults: {}",
            config_path.display()
        );
        return Ok(ArenaConfig::default());
    }

    let raw = fs::read_to_string(&config_path).map_err(|err| {
        format!(
            "Failed to read {CONFIG_FILE_NAME} at {}: {}",
            config_path.display(),
            err
        )
    })?;

    toml::from_str::<ArenaConfig>(&raw).map_err(|err| {
        format!(
            "Failed to parse {CONFIG_FILE_NAME} at {}: {}",
            config_path.display(),
            err
        )
    })
}
