use std::env;

/// Process-level configuration, read once at startup from environment variables.
///
/// Policy knobs (token expiry, login rate limits) live here rather than as
/// hard-coded constants so deployments can tune them without a rebuild.
pub struct Config {
    pub database_url: String,
    pub server_port: u16,
    pub server_host: String,
    /// Lifetime of issued bearer tokens, in hours.
    pub jwt_expiry_hours: i64,
    /// Maximum login attempts per key within one refill window.
    pub login_rate_limit: u32,
    /// Seconds for a fully drained login bucket to refill.
    pub login_rate_window_secs: u64,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            server_port: env::var("SERVER_PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .expect("SERVER_PORT must be a number"),
            server_host: env::var("SERVER_HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            jwt_expiry_hours: env::var("JWT_EXPIRY_HOURS")
                .unwrap_or_else(|_| "24".to_string())
                .parse()
                .expect("JWT_EXPIRY_HOURS must be a number"),
            login_rate_limit: env::var("LOGIN_RATE_LIMIT")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .expect("LOGIN_RATE_LIMIT must be a number"),
            login_rate_window_secs: env::var("LOGIN_RATE_WINDOW_SECS")
                .unwrap_or_else(|_| "300".to_string())
                .parse()
                .expect("LOGIN_RATE_WINDOW_SECS must be a number"),
        }
    }

    pub fn server_url(&self) -> String {
        format!("http://{}:{}", self.server_host, self.server_port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_env() {
        // Set required environment variables
        env::set_var("DATABASE_URL", "postgres://test");
        env::remove_var("SERVER_PORT");
        env::remove_var("SERVER_HOST");

        let config = Config::from_env();

        assert_eq!(config.database_url, "postgres://test");
        assert_eq!(config.server_port, 8080);
        assert_eq!(config.server_host, "127.0.0.1");
        assert_eq!(config.jwt_expiry_hours, 24);
        assert_eq!(config.login_rate_limit, 5);
        assert_eq!(config.login_rate_window_secs, 300);

        // Test custom values
        env::set_var("SERVER_PORT", "3000");
        env::set_var("SERVER_HOST", "0.0.0.0");
        env::set_var("LOGIN_RATE_LIMIT", "10");

        let config = Config::from_env();

        assert_eq!(config.server_port, 3000);
        assert_eq!(config.server_host, "0.0.0.0");
        assert_eq!(config.login_rate_limit, 10);

        env::remove_var("SERVER_PORT");
        env::remove_var("SERVER_HOST");
        env::remove_var("LOGIN_RATE_LIMIT");
    }
}
