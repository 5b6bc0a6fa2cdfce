use std::env;
use config::{Config, File, ConfigError};
use dotenv::dotenv;

use crate::ecg::analysis::AnalysisSettings;
use crate::session::SessionSettings;

#[derive(serde::Deserialize, Debug, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    #[serde(default)]
    pub analysis: AnalysisSettings,
    #[serde(default)]
    pub session: SessionSettings,
}

#[derive(serde::Deserialize, Debug, Clone)]
pub struct ApplicationSettings {
    pub port: u16,
    pub host: String,
    pub log_level: String,
}

pub fn get_config() -> Result<Settings, ConfigError> {
    let base_path = std::env::current_dir()
        .map_err(|e| ConfigError::Message(format!("Failed to determine the current directory: {}", e)))?;
    let configuration_directory = base_path.join("configuration");

    dotenv().ok();

    let environment: Environment = env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .map_err(ConfigError::Message)?;

    let env_filename = format!("{}.yml", environment.as_str());
    let config = Config::builder()
        .add_source(File::from(configuration_directory.join("base.yml")))
        .add_source(File::from(configuration_directory.join(env_filename)))
        .add_source(
            config::Environment::default()
                .prefix("APP")
                .prefix_separator("__")
                .separator("__")
        )
        .build()?;

    config.try_deserialize::<Settings>()
}

pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{} is not a supported environment. \
                Use either `local` or `production`.",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecg::metrics::HeartRateSource;
    use crate::session::PhaseMinimumsPreset;
    use config::FileFormat;

    #[test]
    fn environment_parsing() {
        assert!(matches!(Environment::try_from("Production".to_string()), Ok(Environment::Production)));
        assert!(Environment::try_from("staging".to_string()).is_err());
    }

    #[test]
    fn partial_sections_fall_back_to_defaults() {
        let yaml = r#"
application:
  host: 127.0.0.1
  port: 8000
  log_level: info
analysis:
  heart_rate_source: rr_intervals
session:
  phase_minimums: production
"#;
        let settings: Settings = Config::builder()
            .add_source(File::from_str(yaml, FileFormat::Yaml))
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();

        assert_eq!(settings.analysis.heart_rate_source, HeartRateSource::RrIntervals);
        assert_eq!(settings.analysis.sampling_rate_hz, 130.0);
        assert_eq!(settings.analysis.hrr_max_points, 5);
        assert_eq!(settings.session.phase_minimums, PhaseMinimumsPreset::Production);
        assert_eq!(settings.session.rest_settling_ms, 10_000);
    }
}
