use std::path::PathBuf;

/// Application-level constants
pub const APP_NAME: &str = "ZenMeds";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Well-known storage key for the serialized treatment list.
pub const TREATMENTS_STORAGE_KEY: &str = "zenmeds_treatments";

/// Polling period of the alarm engine in seconds.
///
/// Must stay well below the detection window so no occurrence can slip
/// between two consecutive ticks.
pub const TICK_INTERVAL_SECS: u64 = 30;

/// Default detection window after a due instant, in minutes.
pub const DEFAULT_DETECTION_WINDOW_MINS: i64 = 5;

/// Default cooldown after an alarm is resolved, in seconds.
pub const DEFAULT_COOLDOWN_SECS: i64 = 5;

/// Get the application data directory
/// ~/ZenMeds/ on all platforms (user-visible, per design requirement)
pub fn app_data_dir() -> PathBuf {
    let home = dirs::home_dir().expect("Cannot determine home directory");
    home.join("ZenMeds")
}

/// Path of the SQLite database file.
pub fn database_path() -> PathBuf {
    app_data_dir().join("zenmeds.db")
}

/// Default log filter when RUST_LOG is unset.
pub fn default_log_filter() -> &'static str {
    "info,zenmeds=debug"
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn app_data_dir_under_home() {
        let dir = app_data_dir();
        let home = dirs::home_dir().unwrap();
        assert!(dir.starts_with(home));
        assert!(dir.ends_with("ZenMeds"));
    }

    #[test]
    fn database_under_app_data() {
        let db = database_path();
        assert!(db.starts_with(app_data_dir()));
    }

    #[test]
    fn tick_period_shorter_than_detection_window() {
        assert!((TICK_INTERVAL_SECS as i64) < DEFAULT_DETECTION_WINDOW_MINS * 60);
    }

    #[test]
    fn app_name_is_zenmeds() {
        assert_eq!(APP_NAME, "ZenMeds");
    }
}
