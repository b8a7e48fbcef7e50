use serde::Deserialize;
use serde_aux::field_attributes::deserialize_number_from_string;

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub db_path: String,
    pub host: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
}

impl Settings {
    /// Reads `.env` if present, then `DB_PATH`, `HOST` and `PORT` from the
    /// environment on top of the defaults.
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenv::dotenv().ok();
        Self::from_source(config::Environment::default())
    }

    fn from_source<S>(source: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        config::Config::builder()
            .set_default("db_path", "trivia.db")?
            .set_default("host", "0.0.0.0")?
            .set_default("port", "8080")?
            .add_source(source)
            .build()?
            .try_deserialize()
    }

    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn env(vars: &[(&str, &str)]) -> config::Environment {
        let source: config::Map<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        config::Environment::default().source(Some(source))
    }

    #[test]
    fn defaults_apply_without_environment() {
        let settings = Settings::from_source(env(&[])).unwrap();
        assert_eq!(settings.db_path, "trivia.db");
        assert_eq!(settings.address(), "0.0.0.0:8080");
    }

    #[test]
    fn environment_overrides_defaults() {
        let settings = Settings::from_source(env(&[
            ("DB_PATH", "/tmp/trivia_test.db"),
            ("PORT", "5000"),
        ]))
        .unwrap();
        assert_eq!(settings.db_path, "/tmp/trivia_test.db");
        assert_eq!(settings.port, 5000);
    }

    #[test]
    fn port_must_be_numeric() {
        assert!(Settings::from_source(env(&[("PORT", "eighty")])).is_err());
    }
}
