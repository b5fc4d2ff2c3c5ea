use std::{env, net::SocketAddr, time::Duration};

use super::env::{
    AppConfig, CacheBackend, CacheConfig, ConfigError, DirectoryConfig, JudgeConfig, LogFormat,
    LoggingConfig, ServerConfig, WebContentConfig,
};

pub const DEFAULT_JUDGE_API_URL: &str =
    "https://generativelanguage.googleapis.com/v1beta/openai/chat/completions";
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

pub fn load_config() -> Result<AppConfig, ConfigError> {
    AppConfig::from_env()
}

impl AppConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_key = env::var("API_KEY")
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("API_KEY"))?;

        let bind_raw = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8000".to_string());
        let bind_addr = bind_raw
            .parse::<SocketAddr>()
            .map_err(|_| ConfigError::Invalid {
                key: "BIND_ADDR",
                value: bind_raw.clone(),
            })?;

        let allowed_origins = env::var("ALLOWED_ORIGINS")
            .map(|value| split_list(&value, ','))
            .unwrap_or_else(|_| {
                vec![
                    "http://localhost:5173".to_string(),
                    "http://localhost:4173".to_string(),
                ]
            });

        let server = ServerConfig {
            api_key,
            bind_addr,
            allowed_origins,
        };

        let judge = JudgeConfig {
            api_key: env::var("JUDGE_API_KEY")
                .or_else(|_| env::var("GOOGLE_API_KEY"))
                .ok()
                .filter(|v| !v.is_empty()),
            api_url: env::var("JUDGE_API_URL").unwrap_or_else(|_| DEFAULT_JUDGE_API_URL.to_string()),
            model: env::var("JUDGE_MODEL").unwrap_or_else(|_| "gemini-2.0-flash-001".to_string()),
            timeout: Duration::from_millis(parse_num("JUDGE_TIMEOUT").unwrap_or(60_000)),
        };

        let web = WebContentConfig {
            fetch_timeout: Duration::from_millis(
                parse_num("WEBPAGE_FETCH_TIMEOUT").unwrap_or(30_000),
            ),
            min_content_length: parse_num("WEBPAGE_MIN_CONTENT_LENGTH").unwrap_or(50),
            content_max_length: parse_num("WEBPAGE_CONTENT_MAX_LENGTH").unwrap_or(20_000),
        };

        let cache = CacheConfig {
            backend: parse_backend(env::var("CACHE_BACKEND").ok())?,
            ttl: parse_num("CACHE_TTL_SECS")
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_CACHE_TTL),
            cache_degraded: env::var("CACHE_DEGRADED_RESULTS")
                .map(|v| parse_flag(&v))
                .unwrap_or(false),
        };

        let directories = DirectoryConfig {
            logs_dir: env::var("LOGS_DIR").unwrap_or_else(|_| "logs".to_string()),
            data_dir: env::var("DATA_DIR").unwrap_or_else(|_| "data".to_string()),
            db_filename: env::var("DB_FILENAME")
                .unwrap_or_else(|_| "analysis_cache.db".to_string()),
        };

        let logging = LoggingConfig {
            level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            format: match env::var("LOG_FORMAT").as_deref() {
                Ok("json") => LogFormat::Json,
                _ => LogFormat::Text,
            },
        };

        Ok(Self {
            server,
            judge,
            web,
            cache,
            directories,
            logging,
        })
    }
}

fn parse_num<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|value| value.trim().parse::<T>().ok())
}

fn parse_backend(value: Option<String>) -> Result<CacheBackend, ConfigError> {
    match value.as_deref().map(str::trim) {
        None | Some("") | Some("sqlite") => Ok(CacheBackend::Sqlite),
        Some("memory") => Ok(CacheBackend::Memory),
        Some(other) => Err(ConfigError::Invalid {
            key: "CACHE_BACKEND",
            value: other.to_string(),
        }),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

fn split_list(value: &str, separator: char) -> Vec<String> {
    value
        .split(separator)
        .map(|part| part.trim().to_string())
        .filter(|part| !part.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backend_defaults_to_sqlite() {
        assert_eq!(parse_backend(None).unwrap(), CacheBackend::Sqlite);
        assert_eq!(
            parse_backend(Some("memory".into())).unwrap(),
            CacheBackend::Memory
        );
        assert!(matches!(
            parse_backend(Some("redis".into())),
            Err(ConfigError::Invalid { key: "CACHE_BACKEND", .. })
        ));
    }

    #[test]
    fn flags_and_lists() {
        assert!(parse_flag(" TRUE "));
        assert!(!parse_flag("nope"));
        assert_eq!(
            split_list("http://a, ,http://b ", ','),
            vec!["http://a".to_string(), "http://b".to_string()]
        );
    }
}
