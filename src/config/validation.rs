use super::{ConfigError, GraylogConfig};

impl GraylogConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(ConfigError::InvalidConfig(
                "Chunk size must be greater than 0".to_string(),
            ));
        }

        if self.port == Some(0) {
            return Err(ConfigError::InvalidConfig(
                "Port must be greater than 0".to_string(),
            ));
        }

        if self.facility.trim().is_empty() {
            return Err(ConfigError::InvalidConfig(
                "Facility must not be empty".to_string(),
            ));
        }

        if self.connection_timeout_secs == 0 {
            return Err(ConfigError::InvalidConfig(
                "Connection timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_validation() {
        let mut config = GraylogConfig::default();
        config.validate().unwrap();

        config.chunk_size = 0;
        assert!(config.validate().is_err());

        config.chunk_size = 1420;
        config.port = Some(0);
        assert!(config.validate().is_err());

        config.port = Some(12201);
        config.facility = "  ".to_string();
        assert!(config.validate().is_err());

        config.facility = "app".to_string();
        config.connection_timeout_secs = 0;
        assert!(config.validate().is_err());
    }
}
