use serde::{Deserialize, Serialize};
use std::env;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub jwt: JwtConfig,
    pub admin: AdminConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub access_token_expires_in: i64,  // seconds
    pub refresh_token_expires_in: i64, // seconds
}

/// Bootstrap admin account, ensured at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminConfig {
    pub email: String,
    pub password: String,
}

/// Static payment instructions shown on the order summary page.
/// No gateway is involved; the chosen method is stored as order metadata.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct PaymentConfig {
    #[serde(default)]
    pub qris_image_url: String,
    #[serde(default)]
    pub bca_account_number: String,
    #[serde(default)]
    pub bca_account_name: String,
    #[serde(default)]
    pub seabank_account_number: String,
    #[serde(default)]
    pub seabank_account_name: String,
}

impl Config {
    pub fn from_toml() -> Result<Self, Box<dyn std::error::Error>> {
        let config_path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        use std::io::ErrorKind;

        let config_result = std::fs::read_to_string(&config_path);

        let mut config: Config = match config_result {
            Ok(config_str) => {
                // File present: parse, then let env vars override below
                toml::from_str(&config_str)
                    .map_err(|e| format!("Failed to parse config file: {e}"))?
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                // No file: build entirely from env vars and defaults
                fn get_env(name: &str) -> Option<String> {
                    env::var(name).ok()
                }
                fn get_env_parse<T: std::str::FromStr>(name: &str, default: T) -> T {
                    env::var(name)
                        .ok()
                        .and_then(|v| v.parse::<T>().ok())
                        .unwrap_or(default)
                }

                let database_url = get_env("DATABASE_URL")
                    .ok_or("DATABASE_URL is not set and no config.toml was found")?;

                Config {
                    server: ServerConfig {
                        host: get_env("SERVER_HOST").unwrap_or_else(|| "0.0.0.0".to_string()),
                        port: get_env_parse("SERVER_PORT", 8080u16),
                    },
                    database: DatabaseConfig {
                        url: database_url,
                        max_connections: get_env_parse("DB_MAX_CONNECTIONS", 10u32),
                    },
                    jwt: JwtConfig {
                        secret: get_env("JWT_SECRET")
                            .unwrap_or_else(|| "change-me-in-production".to_string()),
                        access_token_expires_in: get_env_parse("JWT_ACCESS_EXPIRES_IN", 7200i64),
                        refresh_token_expires_in: get_env_parse(
                            "JWT_REFRESH_EXPIRES_IN",
                            2_592_000i64,
                        ),
                    },
                    admin: AdminConfig {
                        email: get_env("ADMIN_EMAIL")
                            .unwrap_or_else(|| "admin@keyshop.local".to_string()),
                        password: get_env("ADMIN_PASSWORD")
                            .unwrap_or_else(|| "ChangeMe123".to_string()),
                    },
                    payment: PaymentConfig {
                        qris_image_url: get_env("PAYMENT_QRIS_IMAGE_URL").unwrap_or_default(),
                        bca_account_number: get_env("PAYMENT_BCA_ACCOUNT_NUMBER")
                            .unwrap_or_default(),
                        bca_account_name: get_env("PAYMENT_BCA_ACCOUNT_NAME").unwrap_or_default(),
                        seabank_account_number: get_env("PAYMENT_SEABANK_ACCOUNT_NUMBER")
                            .unwrap_or_default(),
                        seabank_account_name: get_env("PAYMENT_SEABANK_ACCOUNT_NAME")
                            .unwrap_or_default(),
                    },
                }
            }
            Err(e) => {
                return Err(format!("Failed to read config file {config_path}: {e}").into());
            }
        };

        // Env overrides apply even when the file exists
        if let Ok(v) = env::var("SERVER_HOST") {
            config.server.host = v;
        }
        if let Ok(v) = env::var("SERVER_PORT")
            && let Ok(p) = v.parse()
        {
            config.server.port = p;
        }
        if let Ok(v) = env::var("DATABASE_URL") {
            config.database.url = v;
        }
        if let Ok(v) = env::var("DB_MAX_CONNECTIONS")
            && let Ok(mc) = v.parse()
        {
            config.database.max_connections = mc;
        }
        if let Ok(v) = env::var("JWT_SECRET") {
            config.jwt.secret = v;
        }
        if let Ok(v) = env::var("JWT_ACCESS_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.access_token_expires_in = n;
        }
        if let Ok(v) = env::var("JWT_REFRESH_EXPIRES_IN")
            && let Ok(n) = v.parse()
        {
            config.jwt.refresh_token_expires_in = n;
        }
        if let Ok(v) = env::var("ADMIN_EMAIL") {
            config.admin.email = v;
        }
        if let Ok(v) = env::var("ADMIN_PASSWORD") {
            config.admin.password = v;
        }
        if let Ok(v) = env::var("PAYMENT_QRIS_IMAGE_URL") {
            config.payment.qris_image_url = v;
        }
        if let Ok(v) = env::var("PAYMENT_BCA_ACCOUNT_NUMBER") {
            config.payment.bca_account_number = v;
        }
        if let Ok(v) = env::var("PAYMENT_BCA_ACCOUNT_NAME") {
            config.payment.bca_account_name = v;
        }
        if let Ok(v) = env::var("PAYMENT_SEABANK_ACCOUNT_NUMBER") {
            config.payment.seabank_account_number = v;
        }
        if let Ok(v) = env::var("PAYMENT_SEABANK_ACCOUNT_NAME") {
            config.payment.seabank_account_name = v;
        }

        Ok(config)
    }
}
