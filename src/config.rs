//! TOML configuration: appstream package lists, catalog/icon locations and
//! the package manager command templates.

use home::home_dir;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use crate::error::ConfigError;

/// Environment variable overriding the config file location.
pub const CONFIG_ENV: &str = "APP_CENTER_CONFIG";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct AppsConfig {
    /// Packages providing appstream configuration, installed on refresh.
    pub appstream_config_packages: Vec<String>,
    /// Packages providing appstream catalog data, installed on refresh.
    pub appstream_data_packages: Vec<String>,
    pub catalog_dirs: Vec<PathBuf>,
    pub icon_dirs: Vec<PathBuf>,
    pub commands: CommandTemplates,
}

impl Default for AppsConfig {
    fn default() -> Self {
        Self {
            appstream_config_packages: Vec::new(),
            appstream_data_packages: Vec::new(),
            catalog_dirs: vec![
                PathBuf::from("/usr/share/app-center/catalog"),
                PathBuf::from("~/.local/share/app-center/catalog"),
            ],
            icon_dirs: vec![
                PathBuf::from("/usr/share/icons/hicolor/64x64/apps"),
                PathBuf::from("/usr/share/icons/hicolor/scalable/apps"),
                PathBuf::from("/usr/share/pixmaps"),
            ],
            commands: CommandTemplates::default(),
        }
    }
}

/// Argv templates; an element equal to `{}` expands to all arguments.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct CommandTemplates {
    pub install: CommandTemplate,
    pub remove: CommandTemplate,
    pub refresh: CommandTemplate,
    pub launch: CommandTemplate,
}

impl Default for CommandTemplates {
    fn default() -> Self {
        Self {
            install: CommandTemplate::from_args(&["pkexec", "dnf", "-y", "install", "{}"]),
            remove: CommandTemplate::from_args(&["pkexec", "dnf", "-y", "remove", "{}"]),
            refresh: CommandTemplate::from_args(&["pkexec", "dnf", "-y", "makecache", "--refresh"]),
            launch: CommandTemplate::from_args(&["gtk-launch", "{}"]),
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct CommandTemplate(pub Vec<String>);

impl CommandTemplate {
    pub fn from_args(args: &[&str]) -> Self {
        Self(args.iter().map(|s| s.to_string()).collect())
    }

    /// Substitute `args` into the template. A bare `{}` element is replaced
    /// by every argument; `{}` inside a larger element gets them space-joined.
    pub fn render(&self, args: &[&str]) -> Vec<String> {
        let mut out = Vec::with_capacity(self.0.len() + args.len());
        for part in &self.0 {
            if part == "{}" {
                out.extend(args.iter().map(|a| a.to_string()));
            } else if part.contains("{}") {
                out.push(part.replace("{}", &args.join(" ")));
            } else {
                out.push(part.clone());
            }
        }
        out
    }
}

/// Default config path: `$APP_CENTER_CONFIG`, else `~/.config/app-center/config.toml`.
pub fn default_config_path() -> Option<PathBuf> {
    if let Some(p) = std::env::var_os(CONFIG_ENV) {
        return Some(PathBuf::from(p));
    }
    home_dir().map(|h| h.join(".config").join("app-center").join("config.toml"))
}

/// Load the config from the default path; a missing file yields defaults.
pub fn load_default() -> Result<AppsConfig, ConfigError> {
    match default_config_path() {
        Some(path) if path.exists() => load_from_path(&path),
        Some(path) => {
            info!("no config at {}, using defaults", path.display());
            Ok(AppsConfig::default().expanded())
        }
        None => Ok(AppsConfig::default().expanded()),
    }
}

pub fn load_from_path(path: &Path) -> Result<AppsConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: AppsConfig = toml::from_str(&content).map_err(|e| ConfigError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    info!("loaded config from {}", path.display());
    Ok(config.expanded())
}

impl AppsConfig {
    /// Expand a leading `~/` in configured directories.
    pub fn expanded(mut self) -> Self {
        if let Some(home) = home_dir() {
            for dir in self.catalog_dirs.iter_mut().chain(self.icon_dirs.iter_mut()) {
                *dir = expand_tilde(dir, &home);
            }
        }
        self
    }
}

fn expand_tilde(path: &Path, home: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => home.join(rest),
        Err(_) => path.to_path_buf(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_package_lists_default_to_empty() {
        let config: AppsConfig = toml::from_str("catalog_dirs = [\"/srv/catalog\"]").unwrap();
        assert!(config.appstream_config_packages.is_empty());
        assert!(config.appstream_data_packages.is_empty());
        assert_eq!(config.catalog_dirs, vec![PathBuf::from("/srv/catalog")]);
        assert_eq!(config.commands, CommandTemplates::default());
    }

    #[test]
    fn load_valid_partial_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
appstream_data_packages = ["appstream-data"]

[commands]
install = ["pkcon", "-y", "install", "{}"]
"#,
        )
        .unwrap();

        let config = load_from_path(&path).unwrap();
        assert_eq!(config.appstream_data_packages, vec!["appstream-data"]);
        assert_eq!(
            config.commands.install.render(&["gimp"]),
            vec!["pkcon", "-y", "install", "gimp"]
        );
        assert_eq!(config.commands.launch, CommandTemplates::default().launch);
    }

    #[test]
    fn load_invalid_toml_returns_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "this is not valid toml {{{").unwrap();

        let err = load_from_path(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn load_missing_file_returns_read_error() {
        let err = load_from_path(Path::new("/nonexistent/app-center.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn render_splices_bare_placeholder() {
        let t = CommandTemplate::from_args(&["dnf", "install", "{}", "-y"]);
        assert_eq!(
            t.render(&["a", "b"]),
            vec!["dnf", "install", "a", "b", "-y"]
        );
        assert_eq!(t.render(&[]), vec!["dnf", "install", "-y"]);
    }

    #[test]
    fn render_joins_embedded_placeholder() {
        let t = CommandTemplate::from_args(&["sh", "-c", "install {}"]);
        assert_eq!(t.render(&["a", "b"]), vec!["sh", "-c", "install a b"]);
    }

    #[test]
    fn tilde_expands_against_home() {
        let home = Path::new("/home/user");
        assert_eq!(
            expand_tilde(Path::new("~/.local/share"), home),
            PathBuf::from("/home/user/.local/share")
        );
        assert_eq!(
            expand_tilde(Path::new("/usr/share"), home),
            PathBuf::from("/usr/share")
        );
    }
}
