use config::{Config, ConfigBuilder, ConfigError, Environment, File, builder::DefaultState};
use std::sync::OnceLock;

use super::AppConfig;

static APP_CONFIG: OnceLock<AppConfig> = OnceLock::new();

/// 内置默认值，保证没有任何配置文件时也能启动
fn with_defaults(
    builder: ConfigBuilder<DefaultState>,
) -> Result<ConfigBuilder<DefaultState>, ConfigError> {
    builder
        .set_default("app.system_name", "Institute Portal")?
        .set_default("app.environment", "development")?
        .set_default("app.log_level", "info")?
        .set_default("server.host", "127.0.0.1")?
        .set_default("server.port", 8080)?
        .set_default("server.unix_socket_path", "")?
        .set_default("server.workers", 0)?
        .set_default("server.max_workers", 8)?
        .set_default("server.timeouts.client_request", 5000)?
        .set_default("server.timeouts.client_disconnect", 1000)?
        .set_default("server.timeouts.keep_alive", 30)?
        .set_default("server.limits.max_payload_size", 64 * 1024 * 1024)?
        .set_default("jwt.secret", "change-me-in-production")?
        .set_default("jwt.token_expiry_days", 7)?
        .set_default("jwt.cookie_name", "auth_token")?
        .set_default("argon2.memory_cost", 19456)?
        .set_default("argon2.time_cost", 2)?
        .set_default("argon2.parallelism", 1)?
        .set_default("database.url", "sqlite://portal.db?mode=rwc")?
        .set_default("database.pool_size", 10)?
        .set_default("database.timeout", 10)?
        .set_default("cache.type", "moka")?
        .set_default("cache.default_ttl", 3600)?
        .set_default("cache.redis.url", "redis://127.0.0.1:6379")?
        .set_default("cache.redis.key_prefix", "portal:")?
        .set_default("cache.redis.pool_size", 10)?
        .set_default("cache.memory.max_capacity", 10000)?
        .set_default("cors.allowed_origins", Vec::<String>::new())?
        .set_default(
            "cors.allowed_methods",
            vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"],
        )?
        .set_default(
            "cors.allowed_headers",
            vec!["Authorization", "Content-Type", "Accept"],
        )?
        .set_default("cors.max_age", 3600)?
        .set_default("upload.dir", "uploads")?
        .set_default("upload.public_url_prefix", "/uploads")?
        .set_default("upload.max_size", 10 * 1024 * 1024)?
        .set_default(
            "upload.allowed_types",
            vec![
                "pdf", "doc", "docx", "xlsx", "xls", "txt", "jpg", "jpeg", "png", "gif",
            ],
        )?
        .set_default("upload.verify_magic_bytes", true)?
        .set_default("workflow.grace_period_hours", 24)
}

impl AppConfig {
    /// 加载配置
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = with_defaults(Config::builder())?
            .add_source(File::with_name("config").required(false))
            .add_source(
                File::with_name(&format!(
                    "config.{}",
                    std::env::var("APP_ENV").unwrap_or_else(|_| "development".into())
                ))
                .required(false),
            )
            // PORTAL_SERVER__PORT=9000 形式的覆盖
            .add_source(
                Environment::with_prefix("PORTAL")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        builder = builder
            .set_override_option("app.environment", std::env::var("APP_ENV").ok())?
            .set_override_option("app.log_level", std::env::var("RUST_LOG").ok())?
            .set_override_option("server.host", std::env::var("SERVER_HOST").ok())?
            .set_override_option("server.port", std::env::var("SERVER_PORT").ok())?
            .set_override_option("server.unix_socket_path", std::env::var("UNIX_SOCKET").ok())?
            .set_override_option("server.workers", std::env::var("CPU_COUNT").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("cache.redis.url", std::env::var("REDIS_URL").ok())?
            .set_override_option("upload.dir", std::env::var("UPLOAD_DIR").ok())?;

        let config = builder.build()?;
        let mut app_config: AppConfig = config.try_deserialize()?;

        if app_config.server.workers == 0 {
            app_config.server.workers = num_cpus::get().min(app_config.server.max_workers);
        }

        Ok(app_config)
    }

    /// 获取全局配置实例
    pub fn get() -> &'static AppConfig {
        APP_CONFIG.get_or_init(|| {
            Self::load().unwrap_or_else(|e| {
                eprintln!("Failed to load configuration: {e}");
                std::process::exit(1);
            })
        })
    }

    /// 初始化配置 (在应用启动时调用)
    pub fn init() -> Result<(), ConfigError> {
        let config = Self::load()?;
        APP_CONFIG
            .set(config)
            .map_err(|_| ConfigError::Message("Configuration already initialized".to_string()))?;
        Ok(())
    }

    pub fn is_production(&self) -> bool {
        self.app.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.app.environment == "development"
    }

    /// 获取服务器绑定地址
    pub fn server_bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }

    /// 获取 Unix 套接字路径 (如果配置了)
    #[cfg(unix)]
    pub fn unix_socket_path(&self) -> Option<&str> {
        if self.server.unix_socket_path.is_empty() {
            None
        } else {
            Some(&self.server.unix_socket_path)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_load_without_files() {
        let config = with_defaults(Config::builder())
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize::<AppConfig>()
            .unwrap();
        assert_eq!(config.jwt.token_expiry_days, 7);
        assert_eq!(config.jwt.cookie_name, "auth_token");
        assert_eq!(config.upload.max_size, 10 * 1024 * 1024);
        assert_eq!(config.upload.allowed_types.len(), 10);
        assert_eq!(config.workflow.grace_period_hours, 24);
        assert_eq!(config.cache.cache_type, "moka");
    }

    #[test]
    fn test_bind_address() {
        let config = AppConfig::get();
        assert_eq!(
            config.server_bind_address(),
            format!("{}:{}", config.server.host, config.server.port)
        );
    }
}
