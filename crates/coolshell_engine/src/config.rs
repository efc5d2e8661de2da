use coolshell_base::tracing::{debug, info, warn};
use coolshell_base::{CoolshellResult, FilePath, PalHandle, ResultExt};
use serde::Deserialize;

/// Name of the optional configuration file at the site root.
pub const CONFIG_FILE_NAME: &str = "coolshell.toml";

/// Configuration for serving an archived site.
///
/// Every field has a default, so an empty or missing `coolshell.toml` serves the
/// standard archive layout on port 8080.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Title shown in the startup banner and on generated pages.
    pub title: String,
    /// Address to bind to.
    pub host: String,
    /// Port to listen on; `PORT` and `--port` override it.
    pub port: u16,
    /// Snapshot directory holding the searchable articles.
    pub articles_root: String,
    /// Path segment removed once from an article path to form its link.
    pub link_strip_segment: String,
    /// Target of the `/` redirect.
    pub index_redirect: String,
    /// Number of HTTP worker threads.
    pub workers: usize,
    /// Static directories exposed under URL prefixes.
    #[serde(rename = "mount")]
    pub mounts: Vec<MountConfig>,
}

/// A snapshot directory served under a URL prefix.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct MountConfig {
    /// URL prefix such as `/articles`.
    pub url_prefix: String,
    /// Snapshot directory such as `content/articles`.
    pub directory: String,
}

impl MountConfig {
    pub fn new(url_prefix: impl Into<String>, directory: impl Into<String>) -> Self {
        Self {
            url_prefix: url_prefix.into(),
            directory: directory.into(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            title: "酷壳 Cool Shell Forever 电子存档".to_string(),
            host: "0.0.0.0".to_string(),
            port: 8080,
            articles_root: "content/articles".to_string(),
            link_strip_segment: "content".to_string(),
            index_redirect: "/page/1.html".to_string(),
            workers: 4,
            mounts: vec![
                MountConfig::new("/assets", "assets"),
                MountConfig::new("/haoel", "content/haoel"),
                MountConfig::new("/articles", "content/articles"),
                MountConfig::new("/page", "content/list"),
                MountConfig::new("/uploads", "uploads"),
            ],
        }
    }
}

/// Where the effective port came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PortSource {
    /// Built-in default or `coolshell.toml`.
    Configured,
    /// The `PORT` environment variable.
    Environment,
    /// The `--port` command line flag.
    CommandLine,
}

impl Config {
    /// Parse a configuration from TOML text.
    pub fn from_toml(text: &str) -> CoolshellResult<Self> {
        let config: Config =
            toml::from_str(text).map_err(|e| coolshell_base::err!("Invalid configuration: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> CoolshellResult<()> {
        if self.workers == 0 {
            coolshell_base::bail!("workers must be at least 1");
        }
        for mount in &self.mounts {
            if !mount.url_prefix.starts_with('/') || mount.url_prefix.len() < 2 {
                coolshell_base::bail!(
                    "mount prefix {:?} must start with '/' and name a directory",
                    mount.url_prefix
                );
            }
            if FilePath::from(mount.directory.as_str()).escapes_root() {
                coolshell_base::bail!("mount directory {:?} leaves the site", mount.directory);
            }
        }
        Ok(())
    }

    /// Apply the value of the `PORT` environment variable.
    ///
    /// A missing, empty or unparsable value keeps the configured port.
    pub fn apply_port_env(&mut self, value: Option<&str>) -> PortSource {
        let Some(raw) = value.map(str::trim).filter(|v| !v.is_empty()) else {
            return PortSource::Configured;
        };
        match raw.parse::<u16>() {
            Ok(port) if port != 0 => {
                self.port = port;
                PortSource::Environment
            }
            _ => {
                warn!(value = raw, port = self.port, "ignoring invalid PORT value");
                PortSource::Configured
            }
        }
    }

    /// Resolve the effective port: command line, then `PORT`, then the file.
    pub fn resolve_port(&mut self, cli_port: Option<u16>, env_port: Option<&str>) -> PortSource {
        if let Some(port) = cli_port {
            self.port = port;
            return PortSource::CommandLine;
        }
        self.apply_port_env(env_port)
    }

    /// The configured mounts, sorted longest prefix first for routing.
    pub fn mounts_by_specificity(&self) -> Vec<MountConfig> {
        let mut mounts = self.mounts.clone();
        mounts.sort_by(|a, b| b.url_prefix.len().cmp(&a.url_prefix.len()));
        mounts
    }
}

/// Load configuration from `path` through the PAL.
///
/// A missing file yields the defaults.
pub fn load_config(pal: &PalHandle, path: &FilePath) -> CoolshellResult<Config> {
    if !pal.file_exists(path)? {
        debug!(path = %path, "no configuration file, using defaults");
        return Ok(Config::default());
    }
    let text = pal.read_file_to_string(path)?;
    let config = Config::from_toml(&text).with_context(|| format!("Failed to load {}", path))?;
    info!(path = %path, title = %config.title, "loaded configuration");
    Ok(config)
}

#[cfg(test)]
mod tests {
    use coolshell_base::MockPal;

    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.port, 8080);
        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.mounts.len(), 5);
        assert_eq!(config.mounts[3], MountConfig::new("/page", "content/list"));
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let pal = PalHandle::new(MockPal::new());
        let config = load_config(&pal, &FilePath::from(CONFIG_FILE_NAME)).unwrap();
        assert_eq!(config, Config::default());
    }

    #[test]
    fn test_partial_file() {
        let mock = MockPal::new();
        mock.add_file(
            FilePath::from(CONFIG_FILE_NAME),
            br#"
title = "Mirror"
port = 9000

[[mount]]
url_prefix = "/articles"
directory = "content/articles"
"#
            .to_vec(),
        );
        let config = load_config(&PalHandle::new(mock), &FilePath::from(CONFIG_FILE_NAME)).unwrap();

        assert_eq!(config.title, "Mirror");
        assert_eq!(config.port, 9000);
        assert_eq!(config.workers, 4);
        assert_eq!(
            config.mounts,
            vec![MountConfig::new("/articles", "content/articles")]
        );
    }

    #[test]
    fn test_invalid_file() {
        let mock = MockPal::new();
        mock.add_file(FilePath::from(CONFIG_FILE_NAME), b"port = \"eighty\"".to_vec());
        let err = load_config(&PalHandle::new(mock), &FilePath::from(CONFIG_FILE_NAME)).unwrap_err();
        assert!(err.to_string().starts_with("Failed to load coolshell.toml: Invalid configuration"));
    }

    #[test]
    fn test_rejects_bad_mounts() {
        assert!(Config::from_toml("[[mount]]\nurl_prefix = \"articles\"\ndirectory = \"a\"").is_err());
        assert!(Config::from_toml("[[mount]]\nurl_prefix = \"/x\"\ndirectory = \"../etc\"").is_err());
        assert!(Config::from_toml("workers = 0").is_err());
    }

    #[test]
    fn test_port_env() {
        let mut config = Config::default();
        assert_eq!(config.apply_port_env(None), PortSource::Configured);
        assert_eq!(config.apply_port_env(Some("")), PortSource::Configured);
        assert_eq!(config.apply_port_env(Some("abc")), PortSource::Configured);
        assert_eq!(config.apply_port_env(Some("70000")), PortSource::Configured);
        assert_eq!(config.port, 8080);

        assert_eq!(config.apply_port_env(Some("3000")), PortSource::Environment);
        assert_eq!(config.port, 3000);
    }

    #[test]
    fn test_command_line_port_wins() {
        let mut config = Config::default();
        assert_eq!(
            config.resolve_port(Some(9999), Some("3000")),
            PortSource::CommandLine
        );
        assert_eq!(config.port, 9999);
    }

    #[test]
    fn test_mounts_by_specificity() {
        let mut config = Config::default();
        config.mounts.push(MountConfig::new("/articles/2020", "archive/2020"));
        let prefixes: Vec<String> = config
            .mounts_by_specificity()
            .into_iter()
            .map(|m| m.url_prefix)
            .collect();
        assert_eq!(prefixes[0], "/articles/2020");
    }
}
