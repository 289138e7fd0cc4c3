//! Runtime settings.
//!
//! Values come from an optional YAML file, then `ZELLIJ_*` environment
//! variables, then command-line flags.

use crate::{serializer::sparql::DEFAULT_LIMIT, Error, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

pub const ENV_PREFIX: &str = "ZELLIJ_";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the tabular API.
    pub api_root: String,
    /// Row limit of generated SELECT queries.
    pub sparql_limit: usize,
    /// Rows returned by the sample query.
    pub sample_size: usize,
    pub count_cache: usize,
    pub sample_cache: usize,
    /// Seconds a cached count or sample stays valid; forever when unset.
    pub cache_ttl_secs: Option<u64>,
    pub output_dir: PathBuf,
    /// IRI prefix of the example instances in Turtle exports.
    pub example_base: String,
    /// Public address of the documentation site, linked from reports.
    pub public_url: String,
    /// SQLite file holding the configured databases.
    pub registry: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            api_root: String::from(crate::airtable::DEFAULT_API_ROOT),
            sparql_limit: DEFAULT_LIMIT,
            sample_size: 10,
            count_cache: 256,
            sample_cache: 512,
            cache_ttl_secs: None,
            output_dir: PathBuf::from("export"),
            example_base: String::from(crate::serializer::turtle::DEFAULT_BASE),
            public_url: String::from("http://localhost:8000"),
            registry: PathBuf::from("zellij.sqlite3"),
        }
    }
}

fn parse_number<T: std::str::FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::Config(format!("{} must be a number, not `{}`", key, value)))
}

impl Settings {
    /// Reads `path` when given; a missing file is an error.
    pub fn load<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(path) => {
                let text = fs::read_to_string(path.as_ref()).map_err(|e| {
                    Error::Config(format!("cannot read {}: {}", path.as_ref().display(), e))
                })?;
                Self::from_yaml(&text)
            }
            None => Ok(Self::default()),
        }
    }

    pub fn from_yaml(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Applies `ZELLIJ_*` overrides; other variables are ignored.
    pub fn apply_env<I, K, V>(&mut self, vars: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in vars {
            let key = key.as_ref();
            let name = match key.strip_prefix(ENV_PREFIX) {
                Some(name) => name,
                None => continue,
            };
            let value = value.as_ref();
            match name {
                "API_ROOT" => self.api_root = String::from(value),
                "SPARQL_LIMIT" => self.sparql_limit = parse_number(key, value)?,
                "SAMPLE_SIZE" => self.sample_size = parse_number(key, value)?,
                "COUNT_CACHE" => self.count_cache = parse_number(key, value)?,
                "SAMPLE_CACHE" => self.sample_cache = parse_number(key, value)?,
                "CACHE_TTL" => {
                    self.cache_ttl_secs = if value.is_empty() {
                        None
                    } else {
                        Some(parse_number(key, value)?)
                    }
                }
                "OUTPUT_DIR" => self.output_dir = PathBuf::from(value),
                "EXAMPLE_BASE" => self.example_base = String::from(value),
                "PUBLIC_URL" | "BASE_URL" => self.public_url = String::from(value),
                "REGISTRY" => self.registry = PathBuf::from(value),
                _ => {
                    debug!("ignoring {}", key);
                    continue;
                }
            }
            debug!("{} set from the environment", key);
        }
        Ok(())
    }

    pub fn cache_ttl(&self) -> Option<Duration> {
        self.cache_ttl_secs.map(Duration::from_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults() {
        let settings = Settings::load(None::<&str>).unwrap();
        assert_eq!(settings.sparql_limit, 100);
        assert_eq!(settings.count_cache, 256);
        assert_eq!(settings.sample_cache, 512);
        assert_eq!(settings.cache_ttl(), None);
    }

    #[test]
    fn test_file_then_env() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "sparql_limit: 50\noutput_dir: out\n").unwrap();
        let mut settings = Settings::load(Some(file.path())).unwrap();
        assert_eq!(settings.sparql_limit, 50);
        assert_eq!(settings.output_dir, PathBuf::from("out"));
        assert_eq!(settings.count_cache, 256);

        settings
            .apply_env(vec![
                ("ZELLIJ_SPARQL_LIMIT", "20"),
                ("ZELLIJ_CACHE_TTL", "300"),
                ("HOME", "/root"),
            ])
            .unwrap();
        assert_eq!(settings.sparql_limit, 20);
        assert_eq!(settings.cache_ttl(), Some(Duration::from_secs(300)));

        assert!(settings.apply_env(vec![("ZELLIJ_SAMPLE_SIZE", "many")]).is_err());
    }

    #[test]
    fn test_missing_file() {
        assert!(matches!(
            Settings::load(Some("/nonexistent/zellij.yml")),
            Err(Error::Config(_))
        ));
    }
}
