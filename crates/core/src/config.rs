use serde::Deserialize;

/// Root application configuration. Loaded from environment variables
/// with the prefix `CUBO__` and an optional TOML config file.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub project_id: Option<String>,
    #[serde(default)]
    pub fetch: FetchConfig,
    #[serde(default)]
    pub journey: JourneyConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct FetchConfig {
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_statuses")]
    pub statuses: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JourneyConfig {
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReportingConfig {
    #[serde(default = "default_dimensions")]
    pub default_dimensions: Vec<String>,
}

// Default functions
fn default_page_size() -> usize {
    1000
}
fn default_statuses() -> Vec<String> {
    vec!["APPROVED".to_string(), "COMPLETE".to_string()]
}
fn default_cache_capacity() -> usize {
    64
}
fn default_dimensions() -> Vec<String> {
    ["status", "product", "offer", "funnel", "utm_source", "utm_campaign"]
        .iter()
        .map(|d| d.to_string())
        .collect()
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            statuses: default_statuses(),
        }
    }
}

impl Default for JourneyConfig {
    fn default() -> Self {
        Self {
            cache_capacity: default_cache_capacity(),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            default_dimensions: default_dimensions(),
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            fetch: FetchConfig::default(),
            journey: JourneyConfig::default(),
            reporting: ReportingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from environment variables and an optional config file.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(true));
        }

        let builder = builder.add_source(
            config::Environment::with_prefix("CUBO")
                .separator("__")
                .try_parsing(true)
                .list_separator(",")
                .with_list_parse_key("fetch.statuses")
                .with_list_parse_key("reporting.default_dimensions"),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.fetch.page_size, 1000);
        assert_eq!(config.fetch.statuses, vec!["APPROVED", "COMPLETE"]);
        assert!(config.project_id.is_none());
        assert!(config
            .reporting
            .default_dimensions
            .contains(&"status".to_string()));
    }

    #[test]
    fn test_partial_deserialize_fills_defaults() {
        let config: AppConfig =
            serde_json::from_str(r#"{"project_id": "p1", "fetch": {"page_size": 50}}"#).unwrap();
        assert_eq!(config.project_id.as_deref(), Some("p1"));
        assert_eq!(config.fetch.page_size, 50);
        assert_eq!(config.fetch.statuses.len(), 2);
        assert_eq!(config.journey.cache_capacity, 64);
    }
}
