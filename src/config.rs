//! Process configuration: embedded defaults, optional `data/config.toml`,
//! then `LODEVIEW_*` environment variables. List-valued variables are
//! space-separated, e.g. `LODEVIEW_TOP_RELATIONSHIPS="http://a http://b"`.
use config::{ConfigError, Environment, File, FileFormat};
use serde::Deserialize;

static DEFAULTS: &str = std::include_str!("../data/default.toml");

#[derive(Clone, Debug, Deserialize)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Turtle file path or http(s) URL the knowledge base is loaded from.
    pub kb_file: Option<String>,
    pub base_uri: Option<String>,
    pub ignored_types: Vec<String>,
    pub ignored_relationships: Vec<String>,
    pub top_relationships: Vec<String>,
    pub label_properties: Vec<String>,
    pub description_properties: Vec<String>,
    pub depiction_property: String,
    pub ignore_blank_nodes: bool,
    /// Preferred language tag for label/description literals.
    pub preferred_language: Option<String>,
    pub log_level: Option<String>,
}

impl Config {
    /// Built once at startup and shared read-only afterwards.
    pub fn load() -> Result<Self, ConfigError> {
        config::Config::builder()
            .add_source(File::from_str(DEFAULTS, FileFormat::Toml))
            .add_source(File::with_name("data/config").required(false))
            .add_source(
                Environment::with_prefix("lodeview")
                    .try_parsing(true)
                    .list_separator(" ")
                    .with_list_parse_key("ignored_types")
                    .with_list_parse_key("ignored_relationships")
                    .with_list_parse_key("top_relationships")
                    .with_list_parse_key("label_properties")
                    .with_list_parse_key("description_properties"),
            )
            .build()?
            .try_deserialize()
    }
}
