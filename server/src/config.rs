//! File-backed configuration store.
//!
//! Grounded on `examples/original_source/app/config_service.py`
//! (`PyPreferences`/`ConfigService`) for the load/save shape and validator
//! ranges, adapted to `spec.md` §6's flat `name = literal` wire format in
//! place of the original's `repr()`-based Python source format.

use std::fs;
use std::path::{Path, PathBuf};

use log::info;

use crate::error::Error;

const FILE_NAME: &str = "remotecontrol.cfg";

const DEFAULT_CURSOR_SPEED: f64 = 1.0;
const DEFAULT_CURSOR_ACCELERATION: f64 = 1.0;
const DEFAULT_KEY_PRESS_INTERVAL_MS: u32 = 33;
const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 9036;
const DEFAULT_DEVICE_PATH: &str = "/dev/null";

/// Key-repeat delay before the OS begins auto-repeating a held key. A
/// constant, not persisted to the config file (`spec.md` §4.6).
pub const KEY_REPEAT_DELAY_MS: u32 = 300;
/// Key-repeat interval once auto-repeat has started (~30Hz). A constant,
/// not persisted.
pub const KEY_REPEAT_INTERVAL_MS: u32 = 1000 / 30;

/// The live, validated configuration values.
#[derive(Debug, Clone, PartialEq)]
pub struct Values {
    /// Cursor speed multiplier, in `[0, 2]`.
    pub cursor_speed: f64,
    /// Cursor acceleration multiplier, in `[0, 2]`.
    pub cursor_acceleration: f64,
    /// Milliseconds a `PRESS` action holds a key down, in `[0, 1000]`.
    pub key_press_interval_ms: u32,
    /// Listen host; the literal `"0.0.0.0"` is rewritten to a dual-stack
    /// wildcard at bind time (see `spec.md` §6), not here.
    pub host: String,
    /// Listen port, in `[1, 65535]`.
    pub port: u16,
    /// When set, lowers the log level to `debug`. Controls logging only
    /// (`spec.md` §9's open question), not input behavior.
    pub debug: bool,
    /// Keyboard HID device path.
    pub keyboard_path: String,
    /// Mouse HID device path.
    pub mouse_path: String,
    /// Consumer (media) HID device path.
    pub media_path: String,
}

impl Default for Values {
    fn default() -> Self {
        Self {
            cursor_speed: DEFAULT_CURSOR_SPEED,
            cursor_acceleration: DEFAULT_CURSOR_ACCELERATION,
            key_press_interval_ms: DEFAULT_KEY_PRESS_INTERVAL_MS,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            debug: false,
            keyboard_path: DEFAULT_DEVICE_PATH.to_string(),
            mouse_path: DEFAULT_DEVICE_PATH.to_string(),
            media_path: DEFAULT_DEVICE_PATH.to_string(),
        }
    }
}

/// The process-wide configuration store: loads `remotecontrol.cfg` at
/// startup (creating it empty if absent) and rewrites it in full on every
/// setter call.
pub struct ConfigStore {
    path: PathBuf,
    values: parking_lot::Mutex<Option<Values>>,
}

impl ConfigStore {
    /// Loads the store, preferring `./remotecontrol.cfg` over
    /// `$HOME/remotecontrol.cfg` if both exist; creates an empty file at
    /// whichever path is chosen if neither exists.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be created or read, or if it
    /// contains a malformed line or an out-of-range value.
    pub fn load() -> Result<Self, Error> {
        Self::load_from(None)
    }

    /// Loads the store from `override_path` if given, otherwise falls back
    /// to the cwd-then-`$HOME` lookup `Self::load` uses. Lets a caller (the
    /// `--config` CLI flag) pin an explicit file instead of relying on the
    /// default search order.
    ///
    /// # Errors
    ///
    /// Returns an error if the file can't be created or read, or if it
    /// contains a malformed line or an out-of-range value.
    pub fn load_from(override_path: Option<PathBuf>) -> Result<Self, Error> {
        let path = override_path.unwrap_or_else(resolve_path);
        if !path.exists() {
            fs::write(&path, "").map_err(|source| Error::DeviceWriteError {
                path: path.display().to_string(),
                source,
            })?;
        }

        let contents = fs::read_to_string(&path).map_err(|source| Error::DeviceWriteError {
            path: path.display().to_string(),
            source,
        })?;
        let parsed = parse(&contents)?;
        let values = merge_defaults(parsed)?;

        let store = Self {
            path,
            values: parking_lot::Mutex::new(Some(values)),
        };
        store.save()?;
        log_values(&store.get()?);
        Ok(store)
    }

    /// Returns a snapshot of the current values.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if called before [`Self::load`]
    /// finished (never observable through the public constructor, kept for
    /// symmetry with the setters).
    pub fn get(&self) -> Result<Values, Error> {
        self.values.lock().clone().ok_or(Error::NotInitialized)
    }

    /// Sets `cursor_speed`.
    ///
    /// # Errors
    ///
    /// [`Error::ValueOutOfRange`] if `speed` isn't in `[0, 2]`.
    pub fn set_cursor_speed(&self, speed: f64) -> Result<(), Error> {
        validate_range("cursor_speed", speed, 0.0, 2.0)?;
        self.update(|v| v.cursor_speed = speed)
    }

    /// Sets `cursor_acceleration`.
    ///
    /// # Errors
    ///
    /// [`Error::ValueOutOfRange`] if `acceleration` isn't in `[0, 2]`.
    pub fn set_cursor_acceleration(&self, acceleration: f64) -> Result<(), Error> {
        validate_range("cursor_acceleration", acceleration, 0.0, 2.0)?;
        self.update(|v| v.cursor_acceleration = acceleration)
    }

    /// Sets `key_press_interval`, in milliseconds.
    ///
    /// # Errors
    ///
    /// [`Error::ValueOutOfRange`] if `interval_ms` isn't in `[0, 1000]`.
    pub fn set_key_press_interval(&self, interval_ms: u32) -> Result<(), Error> {
        if interval_ms > 1000 {
            return Err(Error::ValueOutOfRange(
                "key_press_interval must be between 0 and 1000".to_string(),
            ));
        }
        self.update(|v| v.key_press_interval_ms = interval_ms)
    }

    /// Sets `host`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if the store failed to load.
    pub fn set_host(&self, host: String) -> Result<(), Error> {
        self.update(|v| v.host = host)
    }

    /// Sets `port`.
    ///
    /// # Errors
    ///
    /// [`Error::ValueOutOfRange`] if `port` is `0`.
    pub fn set_port(&self, port: u16) -> Result<(), Error> {
        if port == 0 {
            return Err(Error::ValueOutOfRange(
                "port must be between 1 and 65535".to_string(),
            ));
        }
        self.update(|v| v.port = port)
    }

    /// Sets `debug`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if the store failed to load.
    pub fn set_debug(&self, debug: bool) -> Result<(), Error> {
        self.update(|v| v.debug = debug)
    }

    /// Sets `keyboard_path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if the store failed to load.
    pub fn set_keyboard_path(&self, path: String) -> Result<(), Error> {
        self.update(|v| v.keyboard_path = path)
    }

    /// Sets `mouse_path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if the store failed to load.
    pub fn set_mouse_path(&self, path: String) -> Result<(), Error> {
        self.update(|v| v.mouse_path = path)
    }

    /// Sets `media_path`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotInitialized`] if the store failed to load.
    pub fn set_media_path(&self, path: String) -> Result<(), Error> {
        self.update(|v| v.media_path = path)
    }

    fn update(&self, mutate: impl FnOnce(&mut Values)) -> Result<(), Error> {
        let mut guard = self.values.lock();
        let values = guard.as_mut().ok_or(Error::NotInitialized)?;
        mutate(values);
        let snapshot = values.clone();
        drop(guard);
        self.write(&snapshot)?;
        log_values(&snapshot);
        Ok(())
    }

    fn save(&self) -> Result<(), Error> {
        let values = self.get()?;
        self.write(&values)
    }

    fn write(&self, values: &Values) -> Result<(), Error> {
        let contents = serialize(values);
        fs::write(&self.path, contents).map_err(|source| Error::DeviceWriteError {
            path: self.path.display().to_string(),
            source,
        })
    }
}

fn resolve_path() -> PathBuf {
    let local = PathBuf::from(FILE_NAME);
    if local.exists() {
        return local;
    }
    if let Some(home) = dirs_home() {
        return home.join(FILE_NAME);
    }
    local
}

fn dirs_home() -> Option<PathBuf> {
    std::env::var_os("HOME").map(PathBuf::from)
}

fn validate_range(name: &str, value: f64, min: f64, max: f64) -> Result<(), Error> {
    if value < min || value > max {
        return Err(Error::ValueOutOfRange(format!(
            "{name} must be between {min} and {max}"
        )));
    }
    Ok(())
}

/// Raw `name -> literal` pairs as read off disk, before range validation.
#[derive(Debug, Default)]
struct Parsed {
    entries: Vec<(String, String)>,
}

fn parse(contents: &str) -> Result<Parsed, Error> {
    let mut entries = Vec::new();
    for (lineno, line) in contents.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let Some((name, value)) = line.split_once('=') else {
            return Err(Error::ValueOutOfRange(format!(
                "malformed config line {}: {line}",
                lineno + 1
            )));
        };
        entries.push((name.trim().to_string(), value.trim().to_string()));
    }
    Ok(Parsed { entries })
}

fn merge_defaults(parsed: Parsed) -> Result<Values, Error> {
    let mut values = Values::default();
    for (name, raw) in parsed.entries {
        match name.as_str() {
            "cursor_speed" => values.cursor_speed = parse_f64(&raw)?,
            "cursor_acceleration" => values.cursor_acceleration = parse_f64(&raw)?,
            "key_press_interval" => values.key_press_interval_ms = parse_u32(&raw)?,
            "host" => values.host = raw,
            "port" => values.port = parse_u16(&raw)?,
            "debug" => values.debug = raw == "true",
            "keyboard_path" => values.keyboard_path = raw,
            "mouse_path" => values.mouse_path = raw,
            "media_path" => values.media_path = raw,
            _ => {}
        }
    }
    Ok(values)
}

fn parse_f64(raw: &str) -> Result<f64, Error> {
    raw.parse()
        .map_err(|_| Error::ValueOutOfRange(format!("not a number: {raw}")))
}

fn parse_u32(raw: &str) -> Result<u32, Error> {
    raw.parse()
        .map_err(|_| Error::ValueOutOfRange(format!("not an integer: {raw}")))
}

fn parse_u16(raw: &str) -> Result<u16, Error> {
    raw.parse()
        .map_err(|_| Error::ValueOutOfRange(format!("not a port number: {raw}")))
}

fn serialize(values: &Values) -> String {
    format!(
        "cursor_speed = {}\n\
         cursor_acceleration = {}\n\
         key_press_interval = {}\n\
         host = {}\n\
         port = {}\n\
         debug = {}\n\
         keyboard_path = {}\n\
         mouse_path = {}\n\
         media_path = {}\n",
        values.cursor_speed,
        values.cursor_acceleration,
        values.key_press_interval_ms,
        values.host,
        values.port,
        values.debug,
        values.keyboard_path,
        values.mouse_path,
        values.media_path,
    )
}

fn log_values(values: &Values) {
    info!("Host: {}", values.host);
    info!("Port: {}", values.port);
    info!("Debug: {}", values.debug);
    info!("Cursor speed: {}", values.cursor_speed);
    info!("Cursor acceleration: {}", values.cursor_acceleration);
    info!("Key press interval: {}", values.key_press_interval_ms);
    info!("Keyboard path: {}", values.keyboard_path);
    info!("Mouse path: {}", values.mouse_path);
    info!("Media path: {}", values.media_path);
}

/// Rewrites a configured host for binding: the literal `"0.0.0.0"` becomes
/// the dual-stack wildcard `"[::]"`, matching
/// `examples/original_source/app/main.py`'s bind-address handling.
#[must_use]
pub fn bind_host(host: &str) -> &str {
    if host == "0.0.0.0" {
        "[::]"
    } else {
        host
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    // Guards against concurrent tests racing on process cwd / $HOME.
    static ENV_GUARD: StdMutex<()> = StdMutex::new(());

    fn with_temp_home<T>(f: impl FnOnce(&Path) -> T) -> T {
        let _guard = ENV_GUARD.lock().unwrap();
        let dir = std::env::temp_dir().join(format!("hid-input-server-test-{:p}", &f));
        fs::create_dir_all(&dir).unwrap();
        let previous = std::env::var_os("HOME");
        std::env::set_var("HOME", &dir);
        let previous_cwd = std::env::current_dir().unwrap();
        std::env::set_current_dir(&dir).unwrap();

        let result = f(&dir);

        std::env::set_current_dir(previous_cwd).unwrap();
        if let Some(home) = previous {
            std::env::set_var("HOME", home);
        }
        let _ = fs::remove_dir_all(&dir);
        result
    }

    #[test]
    fn load_creates_empty_file_and_defaults() {
        with_temp_home(|dir| {
            let store = ConfigStore::load().unwrap();
            let values = store.get().unwrap();
            assert_eq!(values.port, DEFAULT_PORT);
            assert!(dir.join(FILE_NAME).exists());
        });
    }

    #[test]
    fn set_then_get_round_trips() {
        with_temp_home(|_| {
            let store = ConfigStore::load().unwrap();
            store.set_cursor_speed(1.5).unwrap();
            assert_eq!(store.get().unwrap().cursor_speed, 1.5);
        });
    }

    #[test]
    fn out_of_range_cursor_speed_is_rejected() {
        with_temp_home(|_| {
            let store = ConfigStore::load().unwrap();
            assert!(matches!(
                store.set_cursor_speed(2.1),
                Err(Error::ValueOutOfRange(_))
            ));
        });
    }

    #[test]
    fn port_boundaries() {
        with_temp_home(|_| {
            let store = ConfigStore::load().unwrap();
            assert!(store.set_port(1).is_ok());
            assert!(store.set_port(65535).is_ok());
            assert!(matches!(store.set_port(0), Err(Error::ValueOutOfRange(_))));
        });
    }

    #[test]
    fn zero_zero_zero_zero_rewrites_to_dual_stack_wildcard() {
        assert_eq!(bind_host("0.0.0.0"), "[::]");
        assert_eq!(bind_host("192.168.1.10"), "192.168.1.10");
    }
}
