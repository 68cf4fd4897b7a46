//! User/system configuration cascade
// (c) 2024 Ross Younger

use std::{
    fmt::{self, Debug, Formatter},
    path::PathBuf,
    str::FromStr,
    sync::OnceLock,
};

use tracing::{debug, warn};

use super::{
    defaults::{self, DefaultTable},
    document::Document,
    errors::{Error, Result},
    files::Parser,
    lines::split_args,
    resolve::{parse_value, validate},
};
use crate::os::{AbstractPlatform as _, Platform};

/// Locates a configuration file. Returning `None` means there isn't one.
pub type ConfigFinder = Box<dyn Fn() -> Option<PathBuf> + Send + Sync>;

/// The documents we loaded
#[derive(Debug, Default)]
struct Loaded {
    user: Option<Document>,
    system: Option<Document>,
}

/// Looks up ssh configuration the way the ssh client does:
/// first the user's configuration file, then the system configuration file,
/// then built-in defaults.
///
/// Files are read on first use, once. A value counts as found when it is non-empty.
#[allow(clippy::module_name_repetitions)]
pub struct UserSettings {
    user_config_finder: Option<ConfigFinder>,
    system_config_finder: Option<ConfigFinder>,
    ignore_errors: bool,
    defaults: Option<DefaultTable>,
    loaded: OnceLock<(Loaded, Option<Error>)>,
}

impl Debug for UserSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("UserSettings")
            .field("ignore_errors", &self.ignore_errors)
            .field("defaults", &self.defaults)
            .field("loaded", &self.loaded)
            .finish_non_exhaustive()
    }
}

impl Default for UserSettings {
    fn default() -> Self {
        Self::new()
    }
}

impl UserSettings {
    /// Settings that read the platform's usual configuration files
    #[must_use]
    pub fn new() -> Self {
        Self {
            user_config_finder: None,
            system_config_finder: None,
            ignore_errors: false,
            defaults: None,
            loaded: OnceLock::new(),
        }
    }

    /// Replaces the function that locates the user configuration file
    #[must_use]
    pub fn config_finder<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Option<PathBuf> + Send + Sync + 'static,
    {
        self.user_config_finder = Some(Box::new(f));
        self
    }

    /// Replaces the function that locates the system configuration file
    #[must_use]
    pub fn system_config_finder<F>(mut self, f: F) -> Self
    where
        F: Fn() -> Option<PathBuf> + Send + Sync + 'static,
    {
        self.system_config_finder = Some(Box::new(f));
        self
    }

    /// If set, files which fail to parse are treated as empty (with a warning)
    #[must_use]
    pub fn ignore_errors(mut self, ignore: bool) -> Self {
        self.ignore_errors = ignore;
        self
    }

    /// Uses a private table of defaults instead of the process-wide one
    #[must_use]
    pub fn with_defaults(mut self, defaults: DefaultTable) -> Self {
        self.defaults = Some(defaults);
        self
    }

    fn load_one(path: Option<PathBuf>, is_user: bool) -> Result<Option<Document>> {
        let Some(path) = path else {
            return Ok(None);
        };
        match Parser::for_path(&path, is_user) {
            Ok(parser) => parser.parse().map(Some),
            Err(e) if e.is_not_found() => {
                debug!("{path:?} not found, skipping");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    fn load(&self) -> &(Loaded, Option<Error>) {
        self.loaded.get_or_init(|| {
            let mut loaded = Loaded::default();
            let user_path = match &self.user_config_finder {
                Some(f) => f(),
                None => Platform::user_ssh_config(),
            };
            match Self::load_one(user_path, true) {
                Ok(doc) => loaded.user = doc,
                Err(e) if self.ignore_errors => warn!("user configuration: {e}"),
                Err(e) => return (loaded, Some(e)),
            }
            let system_path = match &self.system_config_finder {
                Some(f) => f(),
                None => Some(PathBuf::from(Platform::system_ssh_config())),
            };
            match Self::load_one(system_path, false) {
                Ok(doc) => loaded.system = doc,
                Err(e) if self.ignore_errors => warn!("system configuration: {e}"),
                Err(e) => return (loaded, Some(e)),
            }
            (loaded, None)
        })
    }

    /// Runs a lookup against the user document, then the system document.
    /// The first `Some` wins.
    fn cascade<T, F>(&self, f: F) -> Result<Option<T>>
    where
        F: Fn(&Document) -> Result<Option<T>>,
    {
        let (loaded, error) = self.load();
        if let Some(e) = error {
            return Err(e.clone());
        }
        for doc in [&loaded.user, &loaded.system].into_iter().flatten() {
            if let Some(v) = f(doc)? {
                return Ok(Some(v));
            }
        }
        Ok(None)
    }

    fn default_for(&self, key: &str) -> String {
        match &self.defaults {
            Some(table) => table.get(key).unwrap_or_default().to_string(),
            None => defaults::default(key),
        }
    }

    /// Looks up the value of `key` for `alias`, returning an error if the configuration
    /// could not be read or the value is malformed.
    ///
    /// If nothing is found, returns the default value (or an empty string).
    pub fn get_strict(&self, alias: &str, key: &str) -> Result<String> {
        let found = self.cascade(|doc| {
            let value = doc.get(alias, key);
            if value.is_empty() {
                return Ok(None);
            }
            validate(key, &value)?;
            Ok(Some(value))
        })?;
        Ok(found.unwrap_or_else(|| self.default_for(key)))
    }

    /// As [`get_strict`](Self::get_strict), but returns all values.
    ///
    /// If nothing is found, returns the default value as a single-element list (or an empty list).
    pub fn get_all_strict(&self, alias: &str, key: &str) -> Result<Vec<String>> {
        let found = self.cascade(|doc| {
            let values = doc.get_all(alias, key);
            if values.is_empty() {
                return Ok(None);
            }
            for v in &values {
                validate(key, v)?;
            }
            Ok(Some(values))
        })?;
        Ok(found.unwrap_or_else(|| {
            let d = self.default_for(key);
            if d.is_empty() {
                Vec::new()
            } else {
                vec![d]
            }
        }))
    }

    fn split_default(&self, key: &str) -> Result<Vec<String>> {
        let d = self.default_for(key);
        split_args(&d).map_err(|e| Error::ValueConversion {
            key: key.to_string(),
            value: d.clone(),
            reason: e.to_string(),
        })
    }

    /// As [`get_strict`](Self::get_strict), but splits the value into its arguments
    pub fn get_splits_strict(&self, alias: &str, key: &str) -> Result<Vec<String>> {
        let found = self.cascade(|doc| {
            let values = doc.get_splits(alias, key);
            Ok((!values.is_empty()).then_some(values))
        })?;
        match found {
            Some(v) => Ok(v),
            None => self.split_default(key),
        }
    }

    /// As [`get_all_strict`](Self::get_all_strict), but splits every value into its arguments
    pub fn get_all_splits_strict(&self, alias: &str, key: &str) -> Result<Vec<String>> {
        let found = self.cascade(|doc| {
            let values = doc.get_all_splits(alias, key);
            Ok((!values.is_empty()).then_some(values))
        })?;
        match found {
            Some(v) => Ok(v),
            None => self.split_default(key),
        }
    }

    /// Looks up the value of `key` for `alias`.
    ///
    /// Errors are logged and otherwise ignored; in that case this returns an empty string.
    #[must_use]
    pub fn get(&self, alias: &str, key: &str) -> String {
        self.get_strict(alias, key)
            .inspect_err(|e| debug!("lookup of {key} for {alias}: {e}"))
            .unwrap_or_default()
    }

    /// As [`get`](Self::get), but returns all values
    #[must_use]
    pub fn get_all(&self, alias: &str, key: &str) -> Vec<String> {
        self.get_all_strict(alias, key)
            .inspect_err(|e| debug!("lookup of {key} for {alias}: {e}"))
            .unwrap_or_default()
    }

    /// As [`get`](Self::get), but splits the value into its arguments
    #[must_use]
    pub fn get_splits(&self, alias: &str, key: &str) -> Vec<String> {
        self.get_splits_strict(alias, key)
            .inspect_err(|e| debug!("lookup of {key} for {alias}: {e}"))
            .unwrap_or_default()
    }

    /// As [`get_all`](Self::get_all), but splits every value into its arguments
    #[must_use]
    pub fn get_all_splits(&self, alias: &str, key: &str) -> Vec<String> {
        self.get_all_splits_strict(alias, key)
            .inspect_err(|e| debug!("lookup of {key} for {alias}: {e}"))
            .unwrap_or_default()
    }

    /// Looks up a value and converts it to a given type.
    /// Returns `None` if there is no value, not even a default.
    pub fn get_as<T>(&self, alias: &str, key: &str) -> Result<Option<T>>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let value = self.get_strict(alias, key)?;
        if value.is_empty() {
            return Ok(None);
        }
        parse_value(key, &value).map(Some)
    }

    /// The port to use for a host
    pub fn get_port(&self, alias: &str) -> Result<u16> {
        let port = self.get_as(alias, "Port")?;
        Ok(port.unwrap_or(22))
    }

    /// The user configuration document, if there is one
    pub fn user_config(&self) -> Result<Option<&Document>> {
        let (loaded, error) = self.load();
        match error {
            Some(e) => Err(e.clone()),
            None => Ok(loaded.user.as_ref()),
        }
    }

    /// The system configuration document, if there is one
    pub fn system_config(&self) -> Result<Option<&Document>> {
        let (loaded, error) = self.load();
        match error {
            Some(e) => Err(e.clone()),
            None => Ok(loaded.system.as_ref()),
        }
    }
}

///////////////////////////////////////////////////////////////////////////////////////

#[cfg(test)]
mod test {
    use std::path::{Path, PathBuf};

    use assertables::assert_contains;

    use super::UserSettings;
    use crate::config::{DefaultTable, Error};
    use crate::util::make_test_tempfile;

    const CONFIG1: &str = r"Host wap
  User root
  KexAlgorithms diffie-hellman-group1-sha1

Host jumpserver
  User somebody#root#7e95b740-27dc-46fa-b18b-f71dac6e9987

Host test.test
  Port notanumber

Host *
  PasswordAuthentication yes
";

    fn settings_for(path: &Path) -> UserSettings {
        let path = path.to_path_buf();
        UserSettings::new()
            .config_finder(move || Some(path.clone()))
            .system_config_finder(|| None)
            .with_defaults(DefaultTable::openssh())
    }

    #[test]
    fn get() {
        let (path, _dir) = make_test_tempfile(CONFIG1, "config1");
        let us = settings_for(&path);
        assert_eq!(us.get("wap", "User"), "root");
        assert_eq!(us.get("wap", "uSER"), "root");
        assert_eq!(
            us.get("jumpserver", "User"),
            "somebody#root#7e95b740-27dc-46fa-b18b-f71dac6e9987"
        );
    }

    #[test]
    fn defaults() {
        let (path, _dir) = make_test_tempfile(CONFIG1, "config1");
        let us = settings_for(&path);
        assert_eq!(us.get_strict("wap", "PasswordAuthentication").unwrap(), "yes");
        assert_eq!(
            us.get_all_strict("wap", "PasswordAuthentication").unwrap(),
            vec!["yes"]
        );
        assert_eq!(us.get_strict("wap", "Port").unwrap(), "22");
        assert_eq!(us.get_port("wap").unwrap(), 22);
        assert_eq!(
            us.get_splits("wap", "UserKnownHostsFile"),
            vec!["~/.ssh/known_hosts", "~/.ssh/known_hosts2"]
        );
        // no default
        assert_eq!(us.get_strict("wap", "CanonicalDomains").unwrap(), "");
        assert!(us.get_all_strict("wap", "CanonicalDomains").unwrap().is_empty());
    }

    #[test]
    fn private_defaults_table() {
        let (path, _dir) = make_test_tempfile(CONFIG1, "config1");
        let mut table = DefaultTable::openssh();
        assert_eq!(
            settings_for(&path).get_strict("wap", "IdentityFile").unwrap(),
            "~/.ssh/identity"
        );
        table.set("IdentityFile", "");
        let us = settings_for(&path).with_defaults(table);
        assert_eq!(us.get_strict("wap", "IdentityFile").unwrap(), "");
        assert!(us.get_all_strict("wap", "IdentityFile").unwrap().is_empty());
    }

    #[test]
    fn invalid_port() {
        let (path, _dir) = make_test_tempfile(CONFIG1, "config1");
        let us = settings_for(&path);
        let err = us.get_strict("test.test", "Port").unwrap_err();
        assert!(matches!(err, Error::ValueConversion { .. }));
        assert_contains!(err.to_string(), "\"notanumber\"");
        assert_eq!(us.get("test.test", "Port"), "");
        let _ = us.get_port("test.test").unwrap_err();
    }

    #[test]
    fn user_then_system() {
        let (user, _dir1) = make_test_tempfile("Host a\n  User from-user\n", "user");
        let (system, _dir2) = make_test_tempfile(
            "Host *\n  User from-system\n  Port 2222\n",
            "system",
        );
        let us = UserSettings::new()
            .config_finder(move || Some(user.clone()))
            .system_config_finder(move || Some(system.clone()))
            .with_defaults(DefaultTable::openssh());
        assert_eq!(us.get("a", "User"), "from-user");
        assert_eq!(us.get("b", "User"), "from-system");
        assert_eq!(us.get_port("a").unwrap(), 2222);
        assert!(us.user_config().unwrap().is_some());
        assert!(us.system_config().unwrap().is_some());
    }

    #[test]
    fn no_files_at_all() {
        let us = UserSettings::new()
            .config_finder(|| None)
            .system_config_finder(|| Some(PathBuf::from("/nonexistent/ssh_config")))
            .with_defaults(DefaultTable::openssh());
        assert_eq!(us.get_strict("wap", "User").unwrap(), "");
        assert!(us.system_config().unwrap().is_none());
    }

    #[test]
    fn parse_errors() {
        let (path, _dir) = make_test_tempfile("Host a\n  User \"oops\n", "broken");
        let us = settings_for(&path);
        let err = us.get_strict("a", "User").unwrap_err();
        assert!(matches!(err, Error::Syntax { line: 2, .. }));
        // the error is remembered
        let _ = us.get_all_strict("a", "User").unwrap_err();
        assert_eq!(us.get("a", "User"), "");

        let us = settings_for(&path).ignore_errors(true);
        assert_eq!(us.get_strict("a", "Port").unwrap(), "22");
    }

    #[test]
    fn recursive_include() {
        let tempdir = tempfile::tempdir().unwrap();
        let inc = tempdir.path().join("recursive-include");
        let config = tempdir.path().join("config");
        std::fs::write(&config, format!("Include {inc:?}\n")).unwrap();
        // relative includes in user files are resolved against ~/.ssh, so use an absolute path
        std::fs::write(
            &inc,
            format!("\nHost kevinburke.ssh_config.test.example.com\n\tInclude {inc:?}\n"),
        )
        .unwrap();
        let us = settings_for(&config);
        let err = us
            .get_strict("kevinburke.ssh_config.test.example.com", "Port")
            .unwrap_err();
        assert!(matches!(err, Error::DepthExceeded));
        assert_eq!(us.get("kevinburke.ssh_config.test.example.com", "Port"), "");
    }

    #[test]
    fn extended_directives() {
        let (path, _dir) = make_test_tempfile(
            r"
Host ext
    User root
    Admin
    #!! EnableTrzsz Yes
    #!! EnableDragFile No
    # Comment hello

Host ext2
    HostName ::1
    #!! Password 123456
",
            "exconfig",
        );
        let us = settings_for(&path);
        for (host, key, value) in [
            ("ext", "User", "root"),
            ("ext", "Admin", ""),
            ("ext", "EnableTrzsz", "Yes"),
            ("ext", "EnableDragFile", "No"),
            ("ext", "Comment", ""),
            ("ext", "Password", ""),
            ("ext", "Passphrase", ""),
            ("ext2", "HostName", "::1"),
            ("ext2", "EnableTrzsz", ""),
            ("ext2", "EnableDragFile", ""),
            ("ext2", "Password", "123456"),
            ("ext2", "Passphrase", ""),
        ] {
            assert_eq!(us.get_strict(host, key).unwrap(), value, "{host}.{key}");
        }
        let doc = us.user_config().unwrap().unwrap();
        assert!(doc.directives_for("ext", "EnableTrzsz")[0].is_extended());
        assert!(!doc.directives_for("ext", "User")[0].is_extended());
    }
}
