//! Environment variable helpers

use std::env;

/// Environment variable utilities
#[derive(Debug)]
pub struct EnvUtils;

impl EnvUtils {
    /// Get an environment variable with a default value
    pub fn get_var_or_default(key: &str, default: &str) -> String {
        env::var(key).unwrap_or_else(|_| default.to_string())
    }

    /// Get an environment variable and parse it to a specific type
    pub fn get_var_parsed<T>(key: &str) -> Option<T>
    where
        T: std::str::FromStr,
    {
        env::var(key).ok()?.trim().parse().ok()
    }

    /// Read a boolean switch such as `1`, `true`, `yes`, `off`
    pub fn get_var_bool(key: &str) -> Option<bool> {
        let value = env::var(key).ok()?;
        match value.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" | "" => Some(false),
            _ => None,
        }
    }

    /// Check if running in CI environment
    pub fn is_ci() -> bool {
        env::var("CI").is_ok() || env::var("CONTINUOUS_INTEGRATION").is_ok()
    }

    /// Set environment variable (mainly for testing)
    pub fn set_var<K, V>(key: K, value: V)
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        unsafe { env::set_var(key.as_ref(), value.as_ref()) }
    }

    /// Remove environment variable (mainly for testing)
    pub fn remove_var<K: AsRef<str>>(key: K) {
        unsafe { env::remove_var(key.as_ref()) }
    }
}
