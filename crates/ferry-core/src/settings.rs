//! Persisted device settings.
//!
//! Settings live in a `settings.toml` file of `KEY = "value"` lines, the same
//! file the sign firmware reads its WiFi credentials from at boot. A separate
//! `secrets.toml` holds the transit API key.
//!
//! Every write produces the complete file in one pass: fields the caller is
//! not changing are re-read from the current file and written back, and the
//! new content replaces the old file with a rename.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::{debug, info, warn};

pub const KEY_WIFI_SSID: &str = "CIRCUITPY_WIFI_SSID";
pub const KEY_WIFI_PASSWORD: &str = "CIRCUITPY_WIFI_PASSWORD";
pub const KEY_ROUTE_ID: &str = "CIRCUITPY_FERRY_ROUTE_ID";
pub const KEY_ROUTE_NAME: &str = "CIRCUITPY_FERRY_ROUTE_NAME";
pub const KEY_STOP_ID: &str = "CIRCUITPY_FERRY_STOP_ID";
pub const KEY_STOP_NAME: &str = "CIRCUITPY_FERRY_STOP_NAME";
pub const KEY_HEADSIGN: &str = "CIRCUITPY_FERRY_HEADSIGN";
pub const KEY_COLOR: &str = "CIRCUITPY_FERRY_COLOR";
pub const KEY_API_KEY: &str = "CIRCUITPY_API_KEY";

/// Boat color used when none is stored.
pub const DEFAULT_COLOR: &str = "teal";

/// Errors that can occur while reading or writing settings.
#[derive(Debug, Error)]
pub enum SettingsError {
    /// Underlying file I/O failed.
    #[error("Settings I/O error: {0}")]
    Io(#[from] io::Error),

    /// The store is unusable (e.g. poisoned lock).
    #[error("Settings store unavailable: {0}")]
    Unavailable(String),
}

/// WiFi network credentials.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WifiCredentials {
    /// Network SSID.
    pub ssid: String,
    /// Network password.
    pub password: String,
}

impl WifiCredentials {
    pub fn new(ssid: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            ssid: ssid.into(),
            password: password.into(),
        }
    }

    /// Both SSID and password are present.
    pub fn is_complete(&self) -> bool {
        !self.ssid.is_empty() && !self.password.is_empty()
    }
}

/// The route/stop/direction the sign counts down for.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FerrySettings {
    /// Full Onestop route id.
    pub route_id: String,
    /// Route display name, e.g. "AS (Astoria)".
    pub route_name: String,
    /// Full Onestop stop id.
    pub stop_id: String,
    /// Stop display name.
    pub stop_name: String,
    /// Trip headsign (direction).
    pub headsign: String,
    /// Boat glyph color.
    pub color: String,
}

impl FerrySettings {
    /// Route, stop and headsign are all present.
    pub fn is_complete(&self) -> bool {
        !self.route_id.is_empty() && !self.stop_id.is_empty() && !self.headsign.is_empty()
    }

    /// Stored color, or the default boat color.
    pub fn color_or_default(&self) -> &str {
        if self.color.is_empty() {
            DEFAULT_COLOR
        } else {
            &self.color
        }
    }
}

/// Everything in the settings file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredSettings {
    pub wifi: Option<WifiCredentials>,
    pub ferry: Option<FerrySettings>,
}

impl StoredSettings {
    /// Stored credentials, only if both fields are non-empty.
    pub fn wifi_credentials(&self) -> Option<&WifiCredentials> {
        self.wifi.as_ref().filter(|w| w.is_complete())
    }

    /// Render the settings file content.
    pub fn to_file_string(&self) -> String {
        let mut out = String::new();
        if let Some(wifi) = &self.wifi {
            if !wifi.ssid.is_empty() {
                push_line(&mut out, KEY_WIFI_SSID, &wifi.ssid);
            }
            if !wifi.password.is_empty() {
                push_line(&mut out, KEY_WIFI_PASSWORD, &wifi.password);
            }
        }
        if let Some(ferry) = &self.ferry {
            push_line(&mut out, KEY_ROUTE_ID, &ferry.route_id);
            push_line(&mut out, KEY_ROUTE_NAME, &ferry.route_name);
            push_line(&mut out, KEY_STOP_ID, &ferry.stop_id);
            push_line(&mut out, KEY_STOP_NAME, &ferry.stop_name);
            push_line(&mut out, KEY_HEADSIGN, &ferry.headsign);
            push_line(&mut out, KEY_COLOR, &ferry.color);
        }
        out
    }

    /// Parse settings file content. Lines without `=` are skipped.
    pub fn from_file_str(content: &str) -> Self {
        let mut values = parse_key_values(content);
        let mut take = |key: &str| values.remove(key).unwrap_or_default();

        let wifi = WifiCredentials {
            ssid: take(KEY_WIFI_SSID),
            password: take(KEY_WIFI_PASSWORD),
        };
        let ferry = FerrySettings {
            route_id: take(KEY_ROUTE_ID),
            route_name: take(KEY_ROUTE_NAME),
            stop_id: take(KEY_STOP_ID),
            stop_name: take(KEY_STOP_NAME),
            headsign: take(KEY_HEADSIGN),
            color: take(KEY_COLOR),
        };

        Self {
            wifi: (!wifi.ssid.is_empty() || !wifi.password.is_empty()).then_some(wifi),
            ferry: (ferry != FerrySettings::default()).then_some(ferry),
        }
    }
}

fn push_line(out: &mut String, key: &str, value: &str) {
    let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
    out.push_str(&format!("{} = \"{}\"\n", key, escaped));
}

/// Split one `KEY = "value"` line on the first `=`, stripping quotes.
///
/// Returns `None` for blank lines and `#` comments.
pub fn parse_line(line: &str) -> Option<Result<(String, String), ()>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }
    let Some((key, value)) = line.split_once('=') else {
        return Some(Err(()));
    };
    Some(Ok((key.trim().to_string(), unquote(value.trim()))))
}

fn unquote(value: &str) -> String {
    let stripped = if value.len() >= 2
        && ((value.starts_with('"') && value.ends_with('"'))
            || (value.starts_with('\'') && value.ends_with('\'')))
    {
        &value[1..value.len() - 1]
    } else {
        return value.to_string();
    };

    if value.starts_with('\'') {
        return stripped.to_string();
    }

    let mut out = String::with_capacity(stripped.len());
    let mut chars = stripped.chars();
    while let Some(c) = chars.next() {
        if c == '\\' {
            match chars.next() {
                Some(next) => out.push(next),
                None => out.push('\\'),
            }
        } else {
            out.push(c);
        }
    }
    out
}

fn parse_key_values(content: &str) -> HashMap<String, String> {
    let mut values = HashMap::new();
    for (index, line) in content.lines().enumerate() {
        match parse_line(line) {
            None => {}
            Some(Ok((key, value))) => {
                values.insert(key, value);
            }
            Some(Err(())) => warn!("Skipping malformed settings line {}", index + 1),
        }
    }
    values
}

/// Read a single key from a secrets file.
///
/// A missing file or key yields an empty string.
pub fn read_secret(path: &Path, key: &str) -> Result<String, SettingsError> {
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => {
            warn!("Secrets file {} not found", path.display());
            return Ok(String::new());
        }
        Err(e) => return Err(e.into()),
    };

    Ok(content
        .lines()
        .filter_map(parse_line)
        .filter_map(Result::ok)
        .find(|(k, _)| k == key)
        .map(|(_, v)| v)
        .unwrap_or_default())
}

// ============================================================================
// Storage
// ============================================================================

/// Abstract settings storage.
///
/// All methods are synchronous so the same trait serves flash-backed and
/// file-backed implementations.
pub trait SettingsStore: Send + Sync {
    /// Load the stored settings. Missing storage yields empty settings.
    fn load(&self) -> Result<StoredSettings, SettingsError>;

    /// Replace the stored settings.
    fn save(&self, settings: &StoredSettings) -> Result<(), SettingsError>;

    /// Store WiFi credentials, keeping any stored ferry settings.
    ///
    /// Fails without writing if the current settings cannot be read.
    fn save_wifi(&self, wifi: &WifiCredentials) -> Result<(), SettingsError> {
        let mut settings = self.load()?;
        settings.wifi = Some(wifi.clone());
        self.save(&settings)
    }

    /// Store ferry settings, keeping the stored WiFi credentials.
    fn save_ferry(&self, ferry: &FerrySettings) -> Result<(), SettingsError> {
        let mut settings = self.load()?;
        settings.ferry = Some(ferry.clone());
        self.save(&settings)
    }

    /// Load, treating unreadable storage as empty.
    fn load_or_default(&self) -> StoredSettings {
        self.load().unwrap_or_else(|e| {
            warn!("Could not read stored settings, starting fresh: {}", e);
            StoredSettings::default()
        })
    }
}

/// File-backed settings (`settings.toml`).
#[derive(Debug, Clone)]
pub struct FileSettingsStore {
    path: PathBuf,
}

impl FileSettingsStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

impl SettingsStore for FileSettingsStore {
    fn load(&self) -> Result<StoredSettings, SettingsError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(StoredSettings::from_file_str(&content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No settings file at {}", self.path.display());
                Ok(StoredSettings::default())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn save(&self, settings: &StoredSettings) -> Result<(), SettingsError> {
        let temp = self.temp_path();
        fs::write(&temp, settings.to_file_string())?;
        if let Err(e) = fs::rename(&temp, &self.path) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }
        info!("Settings written to {}", self.path.display());
        Ok(())
    }
}

/// In-memory settings, for tests and diskless runs.
#[derive(Debug, Default)]
pub struct MemorySettingsStore {
    settings: Mutex<StoredSettings>,
}

impl MemorySettingsStore {
    pub fn new(settings: StoredSettings) -> Self {
        Self {
            settings: Mutex::new(settings),
        }
    }
}

impl SettingsStore for MemorySettingsStore {
    fn load(&self) -> Result<StoredSettings, SettingsError> {
        self.settings
            .lock()
            .map(|s| s.clone())
            .map_err(|e| SettingsError::Unavailable(e.to_string()))
    }

    fn save(&self, settings: &StoredSettings) -> Result<(), SettingsError> {
        let mut stored = self
            .settings
            .lock()
            .map_err(|e| SettingsError::Unavailable(e.to_string()))?;
        *stored = settings.clone();
        Ok(())
    }
}

// ============================================================================
// Pending configuration
// ============================================================================

/// Configuration accumulated across the two portal phases.
///
/// Only becomes durable once both the WiFi and ferry halves are complete.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PendingConfig {
    pub wifi: WifiCredentials,
    /// Short route code as submitted.
    pub route_code: String,
    pub ferry: FerrySettings,
}

impl PendingConfig {
    /// Start from whatever is already stored.
    pub fn from_stored(stored: &StoredSettings) -> Self {
        Self {
            wifi: stored.wifi.clone().unwrap_or_default(),
            ..Default::default()
        }
    }

    /// WiFi half is filled in.
    pub fn has_wifi(&self) -> bool {
        self.wifi.is_complete()
    }

    /// Both halves are filled in.
    pub fn is_complete(&self) -> bool {
        self.has_wifi() && self.ferry.is_complete()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample() -> StoredSettings {
        StoredSettings {
            wifi: Some(WifiCredentials::new("HomeNet", "hunter2")),
            ferry: Some(FerrySettings {
                route_id: "r-dr5ru-as".to_string(),
                route_name: "AS (Astoria)".to_string(),
                stop_id: "s-dr5rvw38kz-astoria".to_string(),
                stop_name: "Astoria".to_string(),
                headsign: "Wall St./Pier 11".to_string(),
                color: "orange".to_string(),
            }),
        }
    }

    #[test]
    fn test_file_format() {
        let text = sample().to_file_string();
        assert!(text.starts_with("CIRCUITPY_WIFI_SSID = \"HomeNet\"\n"));
        assert!(text.contains("CIRCUITPY_FERRY_HEADSIGN = \"Wall St./Pier 11\"\n"));
        assert!(text.contains("CIRCUITPY_FERRY_COLOR = \"orange\"\n"));
        assert_eq!(text.lines().count(), 8);
    }

    #[test]
    fn test_file_round_trip() {
        let settings = sample();
        let parsed = StoredSettings::from_file_str(&settings.to_file_string());
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_quotes_are_escaped() {
        let settings = StoredSettings {
            wifi: Some(WifiCredentials::new("Joe's \"Net\"", "p\\w")),
            ferry: None,
        };
        let parsed = StoredSettings::from_file_str(&settings.to_file_string());
        assert_eq!(parsed, settings);
    }

    #[test]
    fn test_parse_line() {
        assert_eq!(
            parse_line("CIRCUITPY_API_KEY = \"abc=def\""),
            Some(Ok(("CIRCUITPY_API_KEY".to_string(), "abc=def".to_string())))
        );
        assert_eq!(
            parse_line("  KEY='single'  "),
            Some(Ok(("KEY".to_string(), "single".to_string())))
        );
        assert_eq!(
            parse_line("KEY = bare"),
            Some(Ok(("KEY".to_string(), "bare".to_string())))
        );
        assert_eq!(parse_line("   "), None);
        assert_eq!(parse_line("# comment"), None);
        assert_eq!(parse_line("no equals sign"), Some(Err(())));
    }

    #[test]
    fn test_malformed_line_is_skipped() {
        let parsed = StoredSettings::from_file_str(
            "CIRCUITPY_WIFI_SSID = \"HomeNet\"\ngarbage\nCIRCUITPY_WIFI_PASSWORD = \"hunter2\"\n",
        );
        assert_eq!(parsed.wifi_credentials(), Some(&WifiCredentials::new("HomeNet", "hunter2")));
    }

    #[test]
    fn test_wifi_only_file() {
        let parsed =
            StoredSettings::from_file_str("CIRCUITPY_WIFI_SSID = \"a\"\nCIRCUITPY_WIFI_PASSWORD = \"b\"\n");
        assert_eq!(parsed.wifi_credentials(), Some(&WifiCredentials::new("a", "b")));
        assert_eq!(parsed.ferry, None);
    }

    #[test]
    fn test_incomplete_wifi_is_not_credentials() {
        let parsed = StoredSettings::from_file_str("CIRCUITPY_WIFI_SSID = \"a\"\n");
        assert!(parsed.wifi.is_some());
        assert_eq!(parsed.wifi_credentials(), None);
    }

    #[test]
    fn test_read_secret() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("secrets.toml");
        fs::write(
            &path,
            "# api\nOTHER = \"x\"\nCIRCUITPY_API_KEY = 'k=ey'\n",
        )
        .unwrap();
        assert_eq!(read_secret(&path, KEY_API_KEY).unwrap(), "k=ey");
        assert_eq!(read_secret(&path, "MISSING").unwrap(), "");
        assert_eq!(
            read_secret(&dir.path().join("nope.toml"), KEY_API_KEY).unwrap(),
            ""
        );
    }

    #[test]
    fn test_file_store_save_ferry_keeps_wifi() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.toml"));
        assert_eq!(store.load().unwrap(), StoredSettings::default());

        store
            .save_wifi(&WifiCredentials::new("HomeNet", "hunter2"))
            .unwrap();
        store.save_ferry(sample().ferry.as_ref().unwrap()).unwrap();

        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn test_file_store_save_wifi_keeps_ferry() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileSettingsStore::new(dir.path().join("settings.toml"));
        store.save(&sample()).unwrap();

        store.save_wifi(&WifiCredentials::new("Other", "pw")).unwrap();

        let loaded = store.load().unwrap();
        assert_eq!(loaded.wifi, Some(WifiCredentials::new("Other", "pw")));
        assert_eq!(loaded.ferry, sample().ferry);
    }

    #[test]
    fn test_save_ferry_keeps_wifi_despite_stray_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        fs::write(
            &path,
            "CIRCUITPY_WIFI_SSID = \"HomeNet\"\nCIRCUITPY_WIFI_PASSWORD = \"hunter2\"\nstray line\n",
        )
        .unwrap();

        let store = FileSettingsStore::new(&path);
        store.save_ferry(sample().ferry.as_ref().unwrap()).unwrap();

        assert_eq!(store.load().unwrap(), sample());
    }

    /// Store whose current contents cannot be read.
    #[derive(Default)]
    struct UnreadableStore {
        saved: Mutex<Option<StoredSettings>>,
    }

    impl SettingsStore for UnreadableStore {
        fn load(&self) -> Result<StoredSettings, SettingsError> {
            Err(SettingsError::Unavailable("card removed".to_string()))
        }

        fn save(&self, settings: &StoredSettings) -> Result<(), SettingsError> {
            *self.saved.lock().unwrap() = Some(settings.clone());
            Ok(())
        }
    }

    #[test]
    fn test_unreadable_store_is_never_overwritten() {
        let store = UnreadableStore::default();

        assert!(store.save_ferry(sample().ferry.as_ref().unwrap()).is_err());
        assert!(store.save_wifi(&WifiCredentials::new("HomeNet", "hunter2")).is_err());
        assert_eq!(*store.saved.lock().unwrap(), None);
    }

    #[test]
    fn test_failed_write_keeps_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.toml");
        let store = FileSettingsStore::new(&path);
        store.save(&sample()).unwrap();

        // A directory squatting on the temp path makes the write fail.
        fs::create_dir(dir.path().join("settings.toml.tmp")).unwrap();
        assert!(store.save(&StoredSettings::default()).is_err());

        assert_eq!(store.load().unwrap(), sample());
    }

    #[test]
    fn test_pending_config_completion() {
        let mut pending = PendingConfig::default();
        assert!(!pending.is_complete());

        pending.wifi = WifiCredentials::new("HomeNet", "hunter2");
        assert!(pending.has_wifi());
        assert!(!pending.is_complete());

        pending.ferry = sample().ferry.unwrap();
        assert!(pending.is_complete());

        pending.ferry.headsign.clear();
        assert!(!pending.is_complete());
    }

    #[test]
    fn test_memory_store() {
        let store = MemorySettingsStore::default();
        store.save_wifi(&WifiCredentials::new("a", "b")).unwrap();
        assert_eq!(
            store.load().unwrap().wifi_credentials(),
            Some(&WifiCredentials::new("a", "b"))
        );
    }
}
