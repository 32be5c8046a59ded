use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Filesystem locations used by the backend.
#[derive(Debug, Clone)]
pub struct AppPaths {
    pub project_root: PathBuf,
    pub data_dir: PathBuf,
    pub log_dir: PathBuf,
    pub db_path: PathBuf,
    pub config_path: PathBuf,
}

impl AppPaths {
    pub fn new() -> Self {
        let project_root = discover_project_root();
        let data_dir = discover_data_dir(&project_root);
        let log_dir = data_dir.join("logs");
        let db_path = data_dir.join("corpus.db");
        let config_path = project_root.join("config.yml");

        for dir in [&data_dir, &log_dir] {
            let _ = fs::create_dir_all(dir);
        }

        AppPaths {
            project_root,
            data_dir,
            log_dir,
            db_path,
            config_path,
        }
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new()
    }
}

fn discover_project_root() -> PathBuf {
    if let Ok(root) = env::var("MEDSCOUT_ROOT") {
        return PathBuf::from(root);
    }

    let manifest_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    if manifest_dir.join("config.yml").exists() {
        return manifest_dir;
    }

    env::current_dir().unwrap_or(manifest_dir)
}

fn discover_data_dir(project_root: &Path) -> PathBuf {
    if let Ok(dir) = env::var("MEDSCOUT_DATA_DIR") {
        return PathBuf::from(dir);
    }

    project_root.join("data")
}

/// Which kind of external source a configured endpoint is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    /// Atom feed queried in a single request (arXiv).
    ArxivFeed,
    /// Two-phase search-then-fetch API (PubMed eutils).
    PubmedSearch,
}

/// One configured research source: a kind plus the standing topic it is
/// polled for during scheduled ingestion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceConfig {
    pub kind: SourceKind,
    pub topic: String,
    #[serde(default = "default_max_results")]
    pub max_results: usize,
}

fn default_max_results() -> usize {
    5
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Per-request timeout for source endpoints, in seconds.
    pub timeout_secs: u64,
    /// Soft cap on raw detail text pulled from two-phase sources.
    pub detail_char_cap: usize,
    /// Whether `ask` runs a bounded topical fetch for the question before
    /// retrieval. Off by default so offline deployments never hit the network.
    pub fetch_on_ask: bool,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 15,
            detail_char_cap: 1000,
            fetch_on_ask: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// Maximum distinct terms kept in the vocabulary.
    pub vocab_cap: usize,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self { vocab_cap: 5000 }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalConfig {
    /// Minimum best-match cosine score required to answer at all.
    pub min_confidence: f32,
    /// How many ranked documents the assembler may draw from.
    pub top_k: usize,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            min_confidence: 0.25,
            top_k: 5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Total character budget for the assembled evidence block.
    pub max_chars: usize,
    /// Per-document abstract excerpt cap.
    pub excerpt_chars: usize,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            max_chars: 4000,
            excerpt_chars: 1000,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// OpenAI-compatible chat-completions base URL.
    pub base_url: String,
    pub model: String,
    /// Name of the environment variable holding the API key.
    pub api_key_env: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout_secs: u64,
    /// Extra attempts after the first failed call.
    pub max_retries: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key_env: "OPENAI_API_KEY".to_string(),
            max_tokens: 600,
            temperature: 0.2,
            timeout_secs: 60,
            max_retries: 2,
        }
    }
}

/// Engine configuration, loaded from `config.yml` when present and from
/// compiled defaults otherwise.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub fetch: FetchConfig,
    pub index: IndexConfig,
    pub retrieval: RetrievalConfig,
    pub context: ContextConfig,
    pub generation: GenerationConfig,
    pub sources: Vec<SourceConfig>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            fetch: FetchConfig::default(),
            index: IndexConfig::default(),
            retrieval: RetrievalConfig::default(),
            context: ContextConfig::default(),
            generation: GenerationConfig::default(),
            sources: vec![
                SourceConfig {
                    kind: SourceKind::ArxivFeed,
                    topic: "public health".to_string(),
                    max_results: 5,
                },
                SourceConfig {
                    kind: SourceKind::PubmedSearch,
                    topic: "public health".to_string(),
                    max_results: 5,
                },
            ],
        }
    }
}

impl EngineConfig {
    pub fn load(paths: &AppPaths) -> Self {
        Self::load_from(&paths.config_path)
    }

    pub fn load_from(path: &Path) -> Self {
        match fs::read_to_string(path) {
            Ok(raw) => match serde_yaml::from_str(&raw) {
                Ok(config) => config,
                Err(err) => {
                    tracing::warn!("Invalid config at {}: {}", path.display(), err);
                    Self::default()
                }
            },
            Err(_) => Self::default(),
        }
    }
}
