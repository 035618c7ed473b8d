use crate::config;

/// Load settings, falling back to defaults. Logging is not up yet (its
/// config lives in these settings), so problems go to stderr before the TUI starts.
pub fn load_settings() -> config::Settings {
    match config::Settings::load() {
        Ok(s) => {
            if let Err(msg) = s.validate() {
                eprintln!("coverflow: invalid config, using defaults: {msg}");
                config::Settings::default()
            } else {
                s
            }
        }
        Err(e) => {
            // Config is optional; failures should not prevent the app from starting.
            eprintln!("coverflow: failed to load config, using defaults: {e}");
            config::Settings::default()
        }
    }
}
