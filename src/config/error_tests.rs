//! Unit tests for configuration error types

#[cfg(test)]
mod tests {
    use crate::config::error::ConfigError;

    #[test]
    fn test_unknown_database_error() {
        let error = ConfigError::UnknownDatabase("work".to_string());
        assert_eq!(error.to_string(), "Database 'work' does not exist in configuration");
    }

    #[test]
    fn test_database_exists_error() {
        let error = ConfigError::DatabaseExists("work".to_string());
        assert_eq!(error.to_string(), "Database 'work' already exists");
    }

    #[test]
    fn test_missing_home_error() {
        assert_eq!(ConfigError::MissingHome.to_string(), "Could not determine home directory");
    }

    #[test]
    fn test_load_error_conversion() {
        let error: ConfigError = config::ConfigError::Message("bad key".to_string()).into();
        assert!(matches!(error, ConfigError::Load(_)));
        assert!(error.to_string().contains("bad key"));
    }

    #[test]
    fn test_io_error_conversion() {
        let error: ConfigError = std::io::Error::other("disk full").into();
        assert_eq!(error.to_string(), "Config I/O error: disk full");
    }
}
