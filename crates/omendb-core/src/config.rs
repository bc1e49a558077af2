//! Store configuration.
//!
//! Fields that affect storage shape (`buffer_size`, `quantization`) must be
//! applied before the first insert into a [`crate::store::VectorStore`];
//! `algorithm`, `use_columnar`, and `is_server` are informational only and do
//! not change runtime behavior in this version of the core.

use serde::{Deserialize, Serialize};

use crate::quantization::QuantizationMode;

/// Store configuration, loadable from TOML via [`Config::from_file`] with
/// `OMENDB_`-prefixed environment variable overrides.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Capacity of the write-ahead [`crate::buffer::VectorBuffer`] before a
    /// flush into the graph is triggered.
    pub buffer_size: usize,
    /// Informational: only one ANN algorithm (Vamana) is implemented.
    pub algorithm: String,
    /// Reserved for a future columnar storage backend; unused.
    pub use_columnar: bool,
    /// Informational flag for host processes embedding this core in a server.
    pub is_server: bool,
    /// Quantization mode to apply before graph insertion.
    pub quantization: QuantizationMode,
    /// Implementation-defined maximum number of live vectors per collection.
    pub max_vectors: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            buffer_size: 4096,
            algorithm: "vamana".to_string(),
            use_columnar: false,
            is_server: false,
            quantization: QuantizationMode::None,
            max_vectors: 10_000_000,
        }
    }
}

impl Config {
    /// Loads configuration from a TOML file, overlaid with `OMENDB_`-prefixed
    /// environment variables, falling back to defaults for anything unset.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self, figment::Error> {
        use figment::providers::{Env, Format, Toml};
        use figment::Figment;

        Figment::from(figment::providers::Serialized::defaults(Self::default()))
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("OMENDB_"))
            .extract()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_sane() {
        let cfg = Config::default();
        assert_eq!(cfg.algorithm, "vamana");
        assert_eq!(cfg.quantization, QuantizationMode::None);
        assert!(cfg.buffer_size > 0);
    }

    #[test]
    fn missing_file_falls_back_to_defaults() {
        let cfg = Config::from_file("/nonexistent/path/omendb.toml").unwrap();
        assert_eq!(cfg.buffer_size, Config::default().buffer_size);
    }
}
