//! Cache admission policy.
//!
//! Only large binary assets are worth holding in memory: a response is
//! cacheable when its extension is listed and its body reaches `min_size`.

use std::collections::HashSet;
use std::time::Duration;

use crate::config::CacheConfig;

/// Resolved cache policy, built once from [`CacheConfig`].
#[derive(Debug, Clone)]
pub struct CachePolicy {
    pub enabled: bool,
    pub max_size: u64,
    pub min_size: u64,
    image_types: HashSet<String>,
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    pub fn from_config(config: &CacheConfig) -> Self {
        Self {
            enabled: config.enabled,
            max_size: config.max_size.as_u64(),
            min_size: config.min_size.as_u64(),
            image_types: config
                .image_types
                .iter()
                .map(|ext| ext.trim_start_matches('.').to_ascii_lowercase())
                .collect(),
            ttl: config.max_time.map(|t| t.as_duration()),
        }
    }

    /// Whether `ext` (no leading dot, any case) is an admissible type.
    pub fn accepts_extension(&self, ext: &str) -> bool {
        self.image_types.contains(&ext.to_ascii_lowercase())
    }

    /// Whether a body of `len` bytes with extension `ext` should be cached.
    pub fn is_cacheable(&self, ext: &str, len: u64) -> bool {
        self.accepts_extension(ext) && len >= self.min_size
    }

    /// Whether a response is worth buffering for a possible cache insert.
    ///
    /// A declared `Content-Length` outside `[min_size, max_size]` rules the
    /// response out before any byte is read.
    pub fn may_cache(&self, ext: Option<&str>, content_length: Option<u64>) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(ext) = ext else {
            return false;
        };
        if !self.accepts_extension(ext) {
            return false;
        }
        content_length.map_or(true, |len| len >= self.min_size && len <= self.max_size)
    }
}

/// Extension of the last path segment, lower-cased, without the dot.
pub fn extension_of(path: &str) -> Option<String> {
    let segment = path.rsplit('/').next().unwrap_or(path);
    let (_, ext) = segment.rsplit_once('.')?;
    if ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
