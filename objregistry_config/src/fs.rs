use std::path::{Path, PathBuf};

use anyhow::{Context as _, bail};

use crate::{
    ConfigSource, ConnectionConfig, ConnectionLoadError, LoadedConnection, LoadedConnections,
};

const CONFIG_DIR_NAME: &str = "objregistry";
const CONNECTIONS_DIR_NAME: &str = "connections";

/// Stores connection configs as JSON or YAML files in a directory.
///
/// Files may contain a single connection or a list of connections.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    path: PathBuf,
}

impl FsConfigStore {
    fn default_config_dir() -> Result<PathBuf, anyhow::Error> {
        let home = std::env::home_dir().context("Could not determine home directory")?;

        let dir = home.join(".config").join(CONFIG_DIR_NAME);

        Ok(dir)
    }

    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store in `~/.config/objregistry`.
    pub fn new_default() -> Result<Self, anyhow::Error> {
        let path = Self::default_config_dir()?;
        Ok(Self { path })
    }

    fn connections_dir(&self) -> PathBuf {
        self.path.join(CONNECTIONS_DIR_NAME)
    }

    /// Load all connection files.
    ///
    /// Files that can not be parsed are reported in [`LoadedConnections::failed`].
    /// A missing connections directory yields an empty result.
    pub fn connections(&self) -> Result<LoadedConnections, anyhow::Error> {
        let connections_dir = self.connections_dir();

        let reader = match std::fs::read_dir(&connections_dir) {
            Ok(reader) => reader,
            Err(err) => {
                if err.kind() == std::io::ErrorKind::NotFound {
                    return Ok(LoadedConnections::default());
                }
                bail!("Failed to read connections directory: {}", err);
            }
        };

        let mut paths = Vec::new();
        for res in reader {
            let entry = res?;
            if entry.file_type()?.is_file() {
                paths.push(entry.path());
            }
        }
        // Directory iteration order is platform specific.
        paths.sort();

        let mut cons = LoadedConnections::default();
        for path in paths {
            let contents = std::fs::read_to_string(&path).with_context(|| {
                format!("Failed to read connection file: '{}'", path.display())
            })?;
            match Self::parse_connection_config(&path, contents) {
                Ok(new_cons) => {
                    cons.extend(new_cons);
                }
                Err(err) => {
                    tracing::warn!(path = %path.display(), error = %err, "skipping invalid connection file");
                    cons.failed.push(ConnectionLoadError {
                        source: path.into(),
                        error: err.to_string(),
                        index: None,
                    });
                }
            }
        }

        tracing::debug!(
            dir = %connections_dir.display(),
            loaded = cons.connections.len(),
            failed = cons.failed.len(),
            "connections::loaded"
        );

        Ok(cons)
    }

    fn parse_connection_config(
        path: &Path,
        contents: String,
    ) -> Result<LoadedConnections, anyhow::Error> {
        let ext = path
            .extension()
            .context("config file does not have an extension")?
            .to_str()
            .context("config file extension is not valid UTF-8")?;
        let value = match ext {
            "json" => serde_json::from_str::<serde_json::Value>(&contents)
                .context("Failed to parse JSON")?,
            "yaml" | "yml" => serde_yaml::from_str::<serde_json::Value>(&contents)
                .context("Failed to parse YAML connection config")?,
            _ => bail!("Unsupported file extension: '{}'", ext),
        };

        let parse = |value: serde_json::Value| {
            serde_json::from_value::<ConnectionConfig>(value)
                .map_err(|err| format!("Failed to parse connection config: {err}"))
                .and_then(|config| {
                    config
                        .validate()
                        .map(|()| config)
                        .map_err(|err| err.to_string())
                })
        };

        let cons = match value {
            obj @ serde_json::Value::Object(_) => match parse(obj) {
                Ok(config) => LoadedConnections::new_one_loaded(path.to_owned(), config),
                Err(err) => LoadedConnections::new_one_failed(path.to_owned(), err, Some(0)),
            },
            serde_json::Value::Array(arr) => {
                let mut cons = LoadedConnections::default();

                for (index, item) in arr.into_iter().enumerate() {
                    match parse(item) {
                        Ok(config) => {
                            cons.connections.push(LoadedConnection {
                                source: Some(path.to_owned().into()),
                                config,
                            });
                        }
                        Err(error) => {
                            cons.failed.push(ConnectionLoadError {
                                source: path.to_owned().into(),
                                error,
                                index: Some(index),
                            });
                        }
                    }
                }

                cons
            }
            other => {
                bail!(
                    "A config file must contain either a list of connection configs or a single connection - got {:?}",
                    other
                );
            }
        };
        Ok(cons)
    }

    /// Write a connection to `<name>.yaml`, or to `source` if given.
    pub fn save_connection(
        &self,
        config: &ConnectionConfig,
        source: Option<ConfigSource>,
    ) -> Result<LoadedConnection, anyhow::Error> {
        config.validate()?;

        let file_path = match source {
            Some(ConfigSource::File(path)) => path,
            None => {
                let connections_dir = self.connections_dir();
                std::fs::create_dir_all(&connections_dir).with_context(|| {
                    format!(
                        "Failed to create connections directory '{}'",
                        connections_dir.display()
                    )
                })?;
                connections_dir.join(format!("{}.yaml", config.name))
            }
        };

        let contents = match file_path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => serde_json::to_string_pretty(config)
                .context("Failed to serialize connection config to JSON")?,
            _ => serde_yaml::to_string(config)
                .context("Failed to serialize connection config to YAML")?,
        };

        std::fs::write(&file_path, contents).with_context(|| {
            format!(
                "Failed to write connection config to '{}'",
                file_path.display()
            )
        })?;

        Ok(LoadedConnection {
            source: Some(file_path.into()),
            config: config.clone(),
        })
    }
}

impl crate::ConfigStore for FsConfigStore {
    fn load_connections(&self) -> Result<LoadedConnections, anyhow::Error> {
        self.connections()
    }

    fn save_connection(
        &self,
        config: ConnectionConfig,
        source: Option<ConfigSource>,
    ) -> Result<LoadedConnection, anyhow::Error> {
        FsConfigStore::save_connection(self, &config, source)
    }
}
