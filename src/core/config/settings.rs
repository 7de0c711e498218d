use super::parsing::{
    env_first, env_optional, env_or_default, is_supported_upload_extension, parse_bool,
    parse_cors_origins, parse_environment, parse_string_list, parse_u16, parse_u32, parse_u64,
};
use super::secret::load_or_create_secret_key;
use super::types::{
    AdminSettings, ApiSettings, ConfigError, CorsSettings, DatabaseSettings, RedisSettings,
    RuntimeSettings, SecuritySettings, ServerHost, ServerPort, ServerSettings, Settings,
    TelemetrySettings, UploadSettings,
};

const DEFAULT_UPLOAD_EXTENSIONS: &[&str] = &["pdf", "doc", "docx", "jpg", "jpeg", "png"];

impl Settings {
    pub(crate) fn load() -> Result<Self, ConfigError> {
        let host = env_or_default("VERIVIVA_HOST", "0.0.0.0");
        let port = env_first(&["PORT", "VERIVIVA_PORT"]).unwrap_or_else(|| "5000".to_string());

        let environment = parse_environment(
            env_optional("VERIVIVA_ENV").or_else(|| env_optional("ENVIRONMENT")),
        );
        let strict_config = env_optional("VERIVIVA_STRICT_CONFIG")
            .map(|value| parse_bool(&value))
            .unwrap_or(false)
            || environment.is_production();

        let project_name = env_or_default("PROJECT_NAME", "VeriViva API");
        let version = env_or_default("VERSION", env!("CARGO_PKG_VERSION"));
        let api_prefix = env_or_default("API_PREFIX", "/api");

        let env_secret = env_first(&["JWT_SECRET", "SECRET_KEY"]);
        let secret_from_env = env_secret.is_some();
        let secret_key = env_secret.unwrap_or_else(load_or_create_secret_key);

        let access_token_expire_minutes = parse_u64(
            "ACCESS_TOKEN_EXPIRE_MINUTES",
            env_or_default("ACCESS_TOKEN_EXPIRE_MINUTES", "600"),
        )?;
        let algorithm = env_or_default("ALGORITHM", "HS256");

        let cors_origins = parse_cors_origins(env_optional("BACKEND_CORS_ORIGINS"))?;

        let postgres_server = env_or_default("POSTGRES_SERVER", "localhost");
        let postgres_port = parse_u16("POSTGRES_PORT", env_or_default("POSTGRES_PORT", "5432"))?;
        let postgres_user = env_or_default("POSTGRES_USER", "veriviva");
        let postgres_password = env_or_default("POSTGRES_PASSWORD", "");
        let postgres_db = env_or_default("POSTGRES_DB", "veriviva_db");
        let database_url = env_optional("DATABASE_URL");
        let max_connections =
            parse_u32("DATABASE_MAX_CONNECTIONS", env_or_default("DATABASE_MAX_CONNECTIONS", "20"))?;

        let redis_host = env_or_default("REDIS_HOST", "localhost");
        let redis_port = parse_u16("REDIS_PORT", env_or_default("REDIS_PORT", "6379"))?;
        let redis_db = parse_u16("REDIS_DB", env_or_default("REDIS_DB", "0"))?;
        let redis_password = env_or_default("REDIS_PASSWORD", "");

        let upload_dir = env_or_default("UPLOAD_DIR", "uploads");
        let public_base_url = env_or_default("PUBLIC_BASE_URL", "http://localhost:5000")
            .trim_end_matches('/')
            .to_string();
        let max_upload_size_mb =
            parse_u64("MAX_UPLOAD_SIZE_MB", env_or_default("MAX_UPLOAD_SIZE_MB", "10"))?;
        let allowed_extensions = parse_string_list(
            env_optional("ALLOWED_UPLOAD_EXTENSIONS"),
            DEFAULT_UPLOAD_EXTENSIONS,
        );

        let first_admin_enrollment = env_or_default("FIRST_ADMIN_ENROLLMENT", "ADMIN001");
        let first_admin_password = env_or_default("FIRST_ADMIN_PASSWORD", "");

        let log_level = env_or_default("VERIVIVA_LOG_LEVEL", "info");
        let json = env_optional("VERIVIVA_LOG_JSON").map(|value| parse_bool(&value)).unwrap_or(false);
        let prometheus_enabled =
            env_optional("PROMETHEUS_ENABLED").map(|value| parse_bool(&value)).unwrap_or(false);

        let settings = Self {
            server: ServerSettings {
                host: ServerHost::parse(host)?,
                port: ServerPort::parse(port)?,
            },
            runtime: RuntimeSettings { environment, strict_config },
            api: ApiSettings { project_name, version, api_prefix },
            security: SecuritySettings {
                secret_key,
                secret_from_env,
                access_token_expire_minutes,
                algorithm,
            },
            cors: CorsSettings { origins: cors_origins },
            database: DatabaseSettings {
                postgres_server,
                postgres_port,
                postgres_user,
                postgres_password,
                postgres_db,
                database_url,
                max_connections,
            },
            redis: RedisSettings {
                host: redis_host,
                port: redis_port,
                db: redis_db,
                password: redis_password,
            },
            uploads: UploadSettings {
                dir: upload_dir,
                public_base_url,
                max_upload_size_mb,
                allowed_extensions,
            },
            admin: AdminSettings { first_admin_enrollment, first_admin_password },
            telemetry: TelemetrySettings { log_level, json, prometheus_enabled },
        };

        settings.validate()?;
        Ok(settings)
    }

    pub(crate) fn server_addr(&self) -> String {
        format!("{}:{}", self.server.host.0, self.server.port.0)
    }

    pub(crate) fn server_host(&self) -> &str {
        &self.server.host.0
    }

    pub(crate) fn server_port(&self) -> u16 {
        self.server.port.0
    }

    pub(crate) fn api(&self) -> &ApiSettings {
        &self.api
    }

    pub(crate) fn security(&self) -> &SecuritySettings {
        &self.security
    }

    pub(crate) fn cors(&self) -> &CorsSettings {
        &self.cors
    }

    pub(crate) fn database(&self) -> &DatabaseSettings {
        &self.database
    }

    pub(crate) fn redis(&self) -> &RedisSettings {
        &self.redis
    }

    pub(crate) fn uploads(&self) -> &UploadSettings {
        &self.uploads
    }

    pub(crate) fn admin(&self) -> &AdminSettings {
        &self.admin
    }

    pub(crate) fn telemetry(&self) -> &TelemetrySettings {
        &self.telemetry
    }

    pub(crate) fn runtime(&self) -> &RuntimeSettings {
        &self.runtime
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.uploads.allowed_extensions.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "ALLOWED_UPLOAD_EXTENSIONS",
                value: String::from("<empty>"),
            });
        }

        for extension in &self.uploads.allowed_extensions {
            if !is_supported_upload_extension(extension) {
                return Err(ConfigError::InvalidValue {
                    field: "ALLOWED_UPLOAD_EXTENSIONS",
                    value: extension.clone(),
                });
            }
        }

        if self.uploads.max_upload_size_mb == 0 {
            return Err(ConfigError::InvalidValue {
                field: "MAX_UPLOAD_SIZE_MB",
                value: "0".to_string(),
            });
        }

        if self.uploads.dir.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "UPLOAD_DIR",
                value: self.uploads.dir.clone(),
            });
        }

        if self.security.access_token_expire_minutes == 0 {
            return Err(ConfigError::InvalidValue {
                field: "ACCESS_TOKEN_EXPIRE_MINUTES",
                value: "0".to_string(),
            });
        }

        if !self.runtime.strict_config {
            return Ok(());
        }

        if !self.security.secret_from_env {
            return Err(ConfigError::MissingSecret("JWT_SECRET"));
        }
        if self.database.database_url.is_none() && self.database.postgres_password.is_empty() {
            return Err(ConfigError::MissingSecret("POSTGRES_PASSWORD"));
        }
        if self.admin.first_admin_password.is_empty() {
            return Err(ConfigError::MissingSecret("FIRST_ADMIN_PASSWORD"));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support;

    #[tokio::test]
    async fn port_env_overrides_default() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("PORT", "7070");

        let settings = Settings::load().expect("settings");
        assert_eq!(settings.server_port(), 7070);
        assert!(settings.security().secret_from_env);

        std::env::remove_var("PORT");
    }

    #[tokio::test]
    async fn strict_config_requires_first_admin_password() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("VERIVIVA_STRICT_CONFIG", "1");
        std::env::remove_var("FIRST_ADMIN_PASSWORD");

        let err = Settings::load().expect_err("strict config must fail");
        assert!(matches!(err, ConfigError::MissingSecret("FIRST_ADMIN_PASSWORD")));

        std::env::set_var("VERIVIVA_STRICT_CONFIG", "0");
    }

    #[tokio::test]
    async fn unsupported_upload_extension_is_rejected() {
        let _guard = test_support::env_lock().await;
        test_support::set_test_env();
        std::env::set_var("ALLOWED_UPLOAD_EXTENSIONS", "pdf,exe");

        let err = Settings::load().expect_err("exe is not allowed");
        assert!(matches!(
            err,
            ConfigError::InvalidValue { field: "ALLOWED_UPLOAD_EXTENSIONS", .. }
        ));

        std::env::remove_var("ALLOWED_UPLOAD_EXTENSIONS");
    }
}
