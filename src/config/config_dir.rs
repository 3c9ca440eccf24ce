use std::{
    ffi::OsString,
    fs,
    path::{Path, PathBuf},
};

use super::error::{ConfigError, ConfigResult};

/// Points at an explicit config file, taking precedence over every other location.
pub const CONFIG_PATH_ENV: &str = "LEXIS_CONFIG";

const LOCAL_CONFIG: &str = "./config.toml";

pub fn find_config_file(use_local: bool) -> PathBuf {
    #[cfg(unix)]
    let home = std::env::var_os("HOME");
    #[cfg(windows)]
    let home = std::env::var_os("APPDATA");
    #[cfg(not(any(unix, windows)))]
    let home = None;

    resolve_config_path(std::env::var_os(CONFIG_PATH_ENV), home, use_local)
}

/// `explicit`, then `./config.toml` for local runs, then the per-user config directory when
/// a file exists there, then `./config.toml` again.
pub fn resolve_config_path(
    explicit: Option<OsString>,
    home: Option<OsString>,
    use_local: bool,
) -> PathBuf {
    if let Some(path) = explicit.filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }

    if use_local {
        return PathBuf::from(LOCAL_CONFIG);
    }

    home.map(user_config_path)
        .filter(|path| path.exists())
        .unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG))
}

fn user_config_path(home: OsString) -> PathBuf {
    let mut path = PathBuf::from(home);
    if cfg!(unix) {
        path.push(".config");
    }
    path.join(crate::APPLICATION_NAME).join("config.toml")
}

pub fn read_config(use_local: bool) -> ConfigResult<Vec<u8>> {
    let filename = find_config_file(use_local);
    read_config_file(&filename)
}

pub fn read_config_file(filename: &Path) -> ConfigResult<Vec<u8>> {
    tracing::trace!(path = %filename.display(), "looking for config");
    if !filename.exists() {
        return Err(ConfigError::ConfigNotFound {
            path: filename.to_path_buf(),
        });
    }

    let filename = filename.canonicalize()?;
    tracing::debug!(path = %filename.display(), "using configuration file");

    Ok(fs::read(filename)?)
}

#[cfg(test)]
mod test {
    use std::fs;

    use super::*;

    #[test]
    fn explicit_path_wins() {
        let path = resolve_config_path(Some("/etc/lexis.toml".into()), None, true);
        assert_eq!(path, PathBuf::from("/etc/lexis.toml"));
    }

    #[test]
    fn empty_explicit_path_is_ignored() {
        let path = resolve_config_path(Some(OsString::new()), None, true);
        assert_eq!(path, PathBuf::from(LOCAL_CONFIG));
    }

    #[test]
    fn user_directory_is_used_when_file_exists() {
        let home = tempfile::tempdir().unwrap();
        let expected = user_config_path(home.path().into());
        fs::create_dir_all(expected.parent().unwrap()).unwrap();
        fs::write(&expected, "[host]").unwrap();

        let path = resolve_config_path(None, Some(home.path().into()), false);
        assert_eq!(path, expected);

        // local runs never look at the user directory
        let path = resolve_config_path(None, Some(home.path().into()), true);
        assert_eq!(path, PathBuf::from(LOCAL_CONFIG));
    }

    #[test]
    fn missing_user_file_falls_back_to_local() {
        let home = tempfile::tempdir().unwrap();
        let path = resolve_config_path(None, Some(home.path().into()), false);
        assert_eq!(path, PathBuf::from(LOCAL_CONFIG));
    }

    #[test]
    fn reads_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("config.toml");
        fs::write(&file_path, b"docs = true").unwrap();

        assert_eq!(read_config_file(&file_path).unwrap(), b"docs = true");
    }

    #[test]
    fn missing_file_reports_its_path() {
        let dir = tempfile::tempdir().unwrap();
        let file_path = dir.path().join("absent.toml");

        match read_config_file(&file_path) {
            Err(ConfigError::ConfigNotFound { path }) => assert_eq!(path, file_path),
            other => panic!("unexpected result: {other:?}"),
        }
    }
}
