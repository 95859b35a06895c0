use crate::config::types::{
    BrowserConfig, CollectorConfig, Config, DelayRange, OutputConfig, PacingConfig, SiteConfig,
    TimeoutConfig,
};
use crate::ConfigError;
use url::Url;

/// Validates the entire configuration
pub fn validate(config: &Config) -> Result<(), ConfigError> {
    validate_site_config(&config.site)?;
    validate_browser_config(&config.browser)?;
    validate_collector_config(&config.collector)?;
    validate_pacing_config(&config.pacing)?;
    validate_timeout_config(&config.timeouts)?;
    validate_output_config(&config.output)?;
    Ok(())
}

/// Validates site configuration
fn validate_site_config(config: &SiteConfig) -> Result<(), ConfigError> {
    let url = Url::parse(&config.base_url)
        .map_err(|e| ConfigError::InvalidUrl(format!("Invalid base-url: {}", e)))?;

    if url.scheme() != "https" {
        return Err(ConfigError::Validation(format!(
            "base-url '{}' must use HTTPS scheme",
            config.base_url
        )));
    }

    for (name, path) in [
        ("home-path", &config.home_path),
        ("bookmarks-path", &config.bookmarks_path),
        ("login-path", &config.login_path),
    ] {
        if !path.starts_with('/') {
            return Err(ConfigError::Validation(format!(
                "{} must start with '/', got '{}'",
                name, path
            )));
        }
    }

    Ok(())
}

/// Validates browser configuration
fn validate_browser_config(config: &BrowserConfig) -> Result<(), ConfigError> {
    if config.session_path.is_empty() {
        return Err(ConfigError::Validation(
            "session-path cannot be empty".to_string(),
        ));
    }

    if config.window_width == 0 || config.window_height == 0 {
        return Err(ConfigError::Validation(format!(
            "window size must be non-zero, got {}x{}",
            config.window_width, config.window_height
        )));
    }

    Ok(())
}

/// Validates collector configuration
fn validate_collector_config(config: &CollectorConfig) -> Result<(), ConfigError> {
    if config.max_scroll_attempts < 1 {
        return Err(ConfigError::Validation(format!(
            "max-scroll-attempts must be >= 1, got {}",
            config.max_scroll_attempts
        )));
    }

    if config.stagnation_threshold < 1 {
        return Err(ConfigError::Validation(format!(
            "stagnation-threshold must be >= 1, got {}",
            config.stagnation_threshold
        )));
    }

    if config.scroll_increment <= 0 {
        return Err(ConfigError::Validation(format!(
            "scroll-increment must be positive, got {}",
            config.scroll_increment
        )));
    }

    Ok(())
}

/// Validates pacing ranges
fn validate_pacing_config(config: &PacingConfig) -> Result<(), ConfigError> {
    validate_range("pacing.scroll", &config.scroll)?;
    validate_range("pacing.settle", &config.settle)?;
    validate_range("pacing.between-items", &config.between_items)?;
    Ok(())
}

fn validate_range(name: &str, range: &DelayRange) -> Result<(), ConfigError> {
    if range.min_ms > range.max_ms {
        return Err(ConfigError::Validation(format!(
            "{} min-ms ({}) must not exceed max-ms ({})",
            name, range.min_ms, range.max_ms
        )));
    }
    Ok(())
}

/// Validates step timeouts
fn validate_timeout_config(config: &TimeoutConfig) -> Result<(), ConfigError> {
    for (name, value) in [
        ("navigation-ms", config.navigation_ms),
        ("auth-navigation-ms", config.auth_navigation_ms),
        ("auth-marker-ms", config.auth_marker_ms),
        ("list-ms", config.list_ms),
        ("detail-ms", config.detail_ms),
    ] {
        if value < 100 {
            return Err(ConfigError::Validation(format!(
                "timeouts.{} must be >= 100ms, got {}ms",
                name, value
            )));
        }
    }
    Ok(())
}

/// Validates output configuration
fn validate_output_config(config: &OutputConfig) -> Result<(), ConfigError> {
    if config.database_path.is_empty() {
        return Err(ConfigError::Validation(
            "database-path cannot be empty".to_string(),
        ));
    }

    if config.output_dir.is_empty() {
        return Err(ConfigError::Validation(
            "output-dir cannot be empty".to_string(),
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(validate(&Config::default()).is_ok());
    }

    #[test]
    fn test_validate_site_config() {
        let mut site = SiteConfig::default();
        assert!(validate_site_config(&site).is_ok());

        site.base_url = "http://x.com".to_string();
        assert!(matches!(
            validate_site_config(&site),
            Err(ConfigError::Validation(_))
        ));

        site.base_url = "not a url".to_string();
        assert!(matches!(
            validate_site_config(&site),
            Err(ConfigError::InvalidUrl(_))
        ));

        let mut site = SiteConfig::default();
        site.bookmarks_path = "i/bookmarks".to_string();
        assert!(validate_site_config(&site).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("r", &DelayRange::new(0, 0)).is_ok());
        assert!(validate_range("r", &DelayRange::new(10, 20)).is_ok());
        assert!(validate_range("r", &DelayRange::new(21, 20)).is_err());
    }

    #[test]
    fn test_validate_collector_config() {
        let mut collector = CollectorConfig::default();
        assert!(validate_collector_config(&collector).is_ok());

        collector.stagnation_threshold = 0;
        assert!(validate_collector_config(&collector).is_err());

        let mut collector = CollectorConfig::default();
        collector.scroll_increment = 0;
        assert!(validate_collector_config(&collector).is_err());
    }

    #[test]
    fn test_validate_timeouts() {
        let mut timeouts = TimeoutConfig::default();
        assert!(validate_timeout_config(&timeouts).is_ok());

        timeouts.detail_ms = 50;
        assert!(validate_timeout_config(&timeouts).is_err());
    }
}
