use std::{error::Error, fmt, path::PathBuf, str::FromStr, time::Duration};

/// Settings of the terminal host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Seed handed to every algorithm. `None` seeds from the OS.
    pub seed: Option<u64>,
    /// Initial pause between two steps of a continuous run.
    pub delay: Duration,
    pub log_file: PathBuf,
    pub log_level: tracing::Level,
    /// How often the input thread checks whether it should exit.
    pub input_poll_timeout: Duration,
    /// Maximum number of grid events buffered between the algorithm and the renderer.
    pub grid_event_buffer: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            seed: None,
            delay: Duration::from_millis(10),
            log_file: PathBuf::from("mazestep.log"),
            log_level: tracing::Level::INFO,
            input_poll_timeout: Duration::from_millis(100),
            grid_event_buffer: 1000,
        }
    }
}

/// An environment variable holding a value that does not parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub var: &'static str,
    pub value: String,
    pub reason: String,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid value {:?} for {}: {}",
            self.value, self.var, self.reason
        )
    }
}

impl Error for ConfigError {}

impl AppConfig {
    pub const SEED_VAR: &'static str = "MAZESTEP_SEED";
    pub const DELAY_VAR: &'static str = "MAZESTEP_DELAY_MS";
    pub const LOG_FILE_VAR: &'static str = "MAZESTEP_LOG_FILE";
    pub const LOG_LEVEL_VAR: &'static str = "MAZESTEP_LOG";

    /// Reads the settings from the process environment, defaulting whatever is unset.
    pub fn from_env() -> Result<Self, ConfigError> {
        AppConfig::from_lookup(|var| std::env::var(var).ok())
    }

    /// Reads the settings through `lookup`. Empty values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|value| !value.trim().is_empty());
        let mut config = AppConfig::default();

        if let Some(seed) = get(Self::SEED_VAR) {
            config.seed = Some(parse(Self::SEED_VAR, &seed)?);
        }
        if let Some(delay) = get(Self::DELAY_VAR) {
            config.delay = Duration::from_millis(parse(Self::DELAY_VAR, &delay)?);
        }
        if let Some(log_file) = get(Self::LOG_FILE_VAR) {
            config.log_file = PathBuf::from(log_file);
        }
        if let Some(level) = get(Self::LOG_LEVEL_VAR) {
            config.log_level = parse(Self::LOG_LEVEL_VAR, &level)?;
        }
        Ok(config)
    }
}

fn parse<T>(var: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    value.trim().parse().map_err(|e: T::Err| ConfigError {
        var,
        value: value.to_string(),
        reason: e.to_string(),
    })
}
