use std::path::PathBuf;

/// Environment variable that relocates the app directory.
pub const ROOT_ENV: &str = "CHANTAG_ROOT";

/// Returns the root chantag directory path.
///
/// Resolution order:
/// 1. `CHANTAG_ROOT` environment variable (if set)
/// 2. Current working directory + `.chantag`
pub fn chantag_root() -> PathBuf {
    match std::env::var(ROOT_ENV) {
        Ok(root) if !root.is_empty() => PathBuf::from(root),
        _ => PathBuf::from(".chantag"),
    }
}

/// Path of the YAML configuration file.
pub fn config_path() -> PathBuf {
    chantag_root().join("config.yaml")
}

/// Path of the on-disk cache file used by the CLI.
pub fn cache_file_path() -> PathBuf {
    chantag_root().join("cache.json")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_chantag_root_default() {
        // SAFETY: We use #[serial] to ensure single-threaded access
        unsafe { std::env::remove_var(ROOT_ENV) };
        assert_eq!(chantag_root(), PathBuf::from(".chantag"));
        assert_eq!(config_path(), PathBuf::from(".chantag/config.yaml"));
    }

    #[test]
    #[serial]
    fn test_chantag_root_with_env_var() {
        // SAFETY: We use #[serial] to ensure single-threaded access
        unsafe { std::env::set_var(ROOT_ENV, "/custom/path/.chantag") };
        assert_eq!(chantag_root(), PathBuf::from("/custom/path/.chantag"));
        assert_eq!(
            cache_file_path(),
            PathBuf::from("/custom/path/.chantag/cache.json")
        );
        unsafe { std::env::remove_var(ROOT_ENV) };
    }
}
