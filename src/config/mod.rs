pub mod env;
mod loader;

pub use env::{AppConfig, CacheBackend, DirectoryConfig, JudgeConfig, LogFormat, WebContentConfig};
pub use loader::load_config;
#[cfg(test)]
pub use loader::DEFAULT_CACHE_TTL;
