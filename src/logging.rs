/// File logger setup.
///
/// The terminal is in raw alternate-screen mode while the game runs, so log
/// output goes to a file instead of stderr. `RUST_LOG` wins over the
/// configured level when set.

use std::fs::File;

use env_logger::{Builder, Env, Target};

use crate::config::LoggingConfig;

/// Install the global logger. Failure only costs us the log, never the game.
pub fn init(config: &LoggingConfig) {
    let file = match File::create(&config.file) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: cannot open log file {}: {e}", config.file.display());
            return;
        }
    };

    let mut builder = Builder::from_env(Env::default().default_filter_or(config.level.as_str()));
    builder.target(Target::Pipe(Box::new(file)));
    builder.format_timestamp_millis();

    if let Err(e) = builder.try_init() {
        eprintln!("Warning: logger already initialised: {e}");
        return;
    }
    log::info!("logging to {} at {}", config.file.display(), config.level);
}
