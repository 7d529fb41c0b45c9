use std::fs;
use std::path::{Path, PathBuf};

use crate::config::ShaderCacheConfig;

/// Resolved shader cache locations and save options.
///
/// A directory that cannot be set up disables that side of the cache;
/// rendering continues without it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShaderCache {
    user_dir: Option<PathBuf>,
    res_dir: Option<PathBuf>,
    save_compressed: bool,
    save_compressed_zstd: bool,
    save_debug: bool,
}

impl ShaderCache {
    pub fn configure(config: &ShaderCacheConfig) -> Self {
        let mut cache = Self {
            save_compressed: config.compress,
            save_compressed_zstd: config.use_zstd,
            save_debug: !config.strip_debug,
            ..Self::default()
        };

        if !(config.enabled || config.force) {
            return cache;
        }

        match &config.user_dir {
            None => log::error!("no shader cache directory configured; no shader caching will happen"),
            Some(base) => {
                let dir = base.join("shader_cache");
                match fs::create_dir_all(&dir) {
                    Ok(()) => {
                        log::debug!("shader cache at {}", dir.display());
                        cache.user_dir = Some(dir);
                    }
                    Err(err) => log::error!(
                        "can't create shader cache folder {}, no shader caching will happen: {err}",
                        dir.display()
                    ),
                }
            }
        }

        cache.res_dir = config.res_dir.as_ref().filter(|dir| dir.is_dir()).cloned();
        cache
    }

    pub fn user_dir(&self) -> Option<&Path> {
        self.user_dir.as_deref()
    }

    pub fn res_dir(&self) -> Option<&Path> {
        self.res_dir.as_deref()
    }

    pub fn is_enabled(&self) -> bool {
        self.user_dir.is_some()
    }

    pub fn save_compressed(&self) -> bool {
        self.save_compressed
    }

    pub fn save_compressed_zstd(&self) -> bool {
        self.save_compressed_zstd
    }

    pub fn save_debug(&self) -> bool {
        self.save_debug
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn creates_cache_folder_under_user_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = ShaderCache::configure(&ShaderCacheConfig {
            enabled: true,
            user_dir: Some(tmp.path().to_path_buf()),
            ..ShaderCacheConfig::default()
        });

        let dir = tmp.path().join("shader_cache");
        assert!(dir.is_dir());
        assert_eq!(cache.user_dir(), Some(dir.as_path()));
        assert!(cache.is_enabled());
    }

    #[test]
    fn unwritable_location_disables_caching() {
        let tmp = tempfile::tempdir().unwrap();
        let file = tmp.path().join("not_a_dir");
        fs::write(&file, b"x").unwrap();

        let cache = ShaderCache::configure(&ShaderCacheConfig {
            enabled: true,
            user_dir: Some(file),
            ..ShaderCacheConfig::default()
        });
        assert!(!cache.is_enabled());
    }

    #[test]
    fn disabled_touches_nothing() {
        let tmp = tempfile::tempdir().unwrap();
        let cache = ShaderCache::configure(&ShaderCacheConfig {
            enabled: false,
            user_dir: Some(tmp.path().to_path_buf()),
            res_dir: Some(tmp.path().to_path_buf()),
            ..ShaderCacheConfig::default()
        });

        assert!(!tmp.path().join("shader_cache").exists());
        assert_eq!(cache.user_dir(), None);
        assert_eq!(cache.res_dir(), None);
    }

    #[test]
    fn forced_cache_keeps_existing_res_dir_only() {
        let tmp = tempfile::tempdir().unwrap();
        let user = tmp.path().join("user");
        let res = tmp.path().join("res");
        fs::create_dir(&res).unwrap();

        let cache = ShaderCache::configure(&ShaderCacheConfig {
            force: true,
            strip_debug: true,
            compress: true,
            user_dir: Some(user.clone()),
            res_dir: Some(res.clone()),
            ..ShaderCacheConfig::default()
        });
        assert_eq!(cache.res_dir(), Some(res.as_path()));
        assert!(cache.save_compressed());
        assert!(!cache.save_debug());

        let missing = ShaderCache::configure(&ShaderCacheConfig {
            force: true,
            user_dir: Some(user),
            res_dir: Some(tmp.path().join("missing")),
            ..ShaderCacheConfig::default()
        });
        assert_eq!(missing.res_dir(), None);
    }
}
