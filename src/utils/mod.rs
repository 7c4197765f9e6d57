pub mod inflect {
    //! Naming-convention helpers for table-name derivation.

    /// Convert a type short name to `snake_case` (e.g. `BlogPost` -> `blog_post`).
    #[must_use]
    pub fn snake_case(name: &str) -> String {
        let mut out = String::with_capacity(name.len() + 4);
        let mut prev_lower = false;
        for ch in name.chars() {
            if ch.is_uppercase() {
                if prev_lower {
                    out.push('_');
                }
                for lc in ch.to_lowercase() {
                    out.push(lc);
                }
                prev_lower = false;
            } else {
                out.push(ch);
                prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
            }
        }
        out
    }

    /// Pluralize an English word using the conventional heuristics:
    /// consonant + `y` => `ies`, sibilant endings => `es`, otherwise `s`.
    #[must_use]
    pub fn pluralize(word: &str) -> String {
        if word.is_empty() {
            return String::new();
        }
        let lower = word.to_lowercase();
        if let Some(stem) = lower.strip_suffix('y') {
            let before_y = stem.chars().last();
            if before_y.is_some_and(|c| !matches!(c, 'a' | 'e' | 'i' | 'o' | 'u')) {
                return format!("{}ies", &word[..word.len() - 1]);
            }
        }
        if lower.ends_with('s')
            || lower.ends_with('x')
            || lower.ends_with('z')
            || lower.ends_with("ch")
            || lower.ends_with("sh")
        {
            return format!("{word}es");
        }
        format!("{word}s")
    }

    /// Conventional table name for a model short name: snake-cased then pluralized.
    #[must_use]
    pub fn table_name(short_name: &str) -> String {
        pluralize(&snake_case(short_name))
    }

}

pub mod config {
    use serde::Deserialize;
    use std::fs;
    use std::path::{Path, PathBuf};

    /// Configuration consumed by the graph core. All components take this as
    /// an explicit constructor argument; nothing reads ambient global state.
    #[derive(Debug, Clone, Deserialize)]
    #[serde(default)]
    pub struct GraphConfig {
        /// Root directories scanned for model declarations.
        pub model_paths: Vec<PathBuf>,
        /// When non-empty, only these fully-qualified identifiers are kept.
        pub only_models: Vec<String>,
        /// Identifiers dropped from every scan result.
        pub exclude_models: Vec<String>,
        /// Master switch for schema inspection.
        pub schema_inspection: bool,
        /// Forces empty schema results without touching any backend.
        pub fake_schema: bool,
        /// Maximum traversal depth for relationship cycle detection.
        pub max_depth: usize,
        /// TTL in seconds for cached discovery results.
        pub discovery_cache_ttl: u64,
        /// TTL in seconds for the cached generated document.
        pub result_cache_ttl: u64,
        /// Key under which the generated document is cached.
        pub result_cache_key: String,
        /// Whether a fetch on a cache miss may trigger generation.
        pub auto_generate: bool,
        /// Where the generated document is persisted.
        pub output_path: PathBuf,
    }

    impl Default for GraphConfig {
        fn default() -> Self {
            Self {
                model_paths: Vec::new(),
                only_models: Vec::new(),
                exclude_models: Vec::new(),
                schema_inspection: true,
                fake_schema: false,
                max_depth: 5,
                discovery_cache_ttl: 3600,
                result_cache_ttl: 3600,
                result_cache_key: "model-relations-graph-data".to_string(),
                auto_generate: true,
                output_path: PathBuf::from("model-graph.json"),
            }
        }
    }

    fn default_config_path(root: &Path) -> PathBuf {
        root.join("model-relations-graph.toml")
    }

    #[must_use]
    pub fn load_config_at(path: &Path) -> Option<GraphConfig> {
        let data = fs::read_to_string(path).ok()?;
        toml::from_str::<GraphConfig>(&data).ok()
    }

    #[must_use]
    pub fn load_config_near(root: &Path) -> Option<GraphConfig> {
        let p = default_config_path(root);
        if p.exists() {
            load_config_at(&p)
        } else {
            None
        }
    }

}
