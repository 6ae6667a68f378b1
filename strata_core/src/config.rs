// Copyright 2026 the Strata Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tunable parameters for tiling, painting and scrolling.
//!
//! Each config is a plain `Copy` struct with named presets. All of them can
//! also be deserialized from JSON; missing fields keep their default values.

use core::fmt;

use serde::Deserialize;

/// Environment variable overriding the CPU painting thread count.
pub const CPU_PAINTING_THREADS_ENV: &str = "STRATA_CPU_PAINTING_THREADS";

/// Environment variable overriding the GPU painting thread count.
pub const GPU_PAINTING_THREADS_ENV: &str = "STRATA_GPU_PAINTING_THREADS";

/// Upper bound on automatically sized CPU painting pools.
const MAX_CPU_PAINTING_THREADS: usize = 8;

/// Error returned when a config cannot be loaded.
#[derive(Debug)]
pub enum ConfigError {
    /// The input was not valid JSON or did not match the config shape.
    Parse(serde_json::Error),
    /// A value was syntactically valid but out of range.
    Invalid(&'static str),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "malformed config: {err}"),
            Self::Invalid(what) => write!(f, "invalid config: {what}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Parse(err) => Some(err),
            Self::Invalid(_) => None,
        }
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        Self::Parse(err)
    }
}

/// Tiled backing store parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TilingConfig {
    /// Edge length of a square tile in scaled pixels.
    pub tile_size: i32,
    /// Tiles of look-ahead added around the visible rect when creating tiles.
    pub coverage_margin_tiles: i32,
    /// Tiles of slack kept around the visible rect before evicting.
    ///
    /// Must be at least `coverage_margin_tiles` so freshly created tiles are
    /// not evicted in the same update.
    pub keep_margin_tiles: i32,
    /// Upper bound on tile buffers painting asynchronously at once.
    pub max_concurrent_tile_renders: usize,
}

impl TilingConfig {
    /// Desktop defaults: 512 px tiles, one tile of look-ahead.
    #[must_use]
    pub const fn desktop() -> Self {
        Self {
            tile_size: 512,
            coverage_margin_tiles: 1,
            keep_margin_tiles: 2,
            max_concurrent_tile_renders: 8,
        }
    }

    /// Low-memory preset: 256 px tiles and no look-ahead.
    #[must_use]
    pub const fn low_memory() -> Self {
        Self {
            tile_size: 256,
            coverage_margin_tiles: 0,
            keep_margin_tiles: 1,
            max_concurrent_tile_renders: 4,
        }
    }

    /// Parses a config from JSON and validates it.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the JSON is malformed or a value is out of
    /// range.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.tile_size <= 0 {
            return Err(ConfigError::Invalid("tile_size must be positive"));
        }
        if config.coverage_margin_tiles < 0 || config.keep_margin_tiles < config.coverage_margin_tiles
        {
            return Err(ConfigError::Invalid(
                "keep_margin_tiles must be at least coverage_margin_tiles",
            ));
        }
        if config.max_concurrent_tile_renders == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrent_tile_renders must be positive",
            ));
        }
        Ok(config)
    }
}

impl Default for TilingConfig {
    fn default() -> Self {
        Self::desktop()
    }
}

/// Painting engine parameters.
///
/// `None` thread counts mean "size automatically"; see
/// [`number_of_cpu_painting_threads`](Self::number_of_cpu_painting_threads).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PaintingConfig {
    /// Explicit CPU painting pool size.
    pub cpu_painting_threads: Option<usize>,
    /// Explicit GPU painting pool size.
    pub gpu_painting_threads: Option<usize>,
    /// Whether accelerated (GPU) tile painting is available.
    pub gpu_painting_enabled: bool,
}

impl PaintingConfig {
    /// Everything painted synchronously on the calling thread.
    #[must_use]
    pub const fn synchronous() -> Self {
        Self {
            cpu_painting_threads: Some(0),
            gpu_painting_threads: Some(0),
            gpu_painting_enabled: false,
        }
    }

    /// Parses a config from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] if the JSON is malformed.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Number of CPU painting threads.
    ///
    /// Resolution order: the `STRATA_CPU_PAINTING_THREADS` environment
    /// variable, the explicit config value, then half the available CPUs
    /// clamped to `1..=8`.
    #[must_use]
    pub fn number_of_cpu_painting_threads(&self) -> usize {
        if let Some(n) = env_thread_count(CPU_PAINTING_THREADS_ENV) {
            return n;
        }
        self.cpu_painting_threads.unwrap_or_else(|| {
            (num_cpus::get() / 2).clamp(1, MAX_CPU_PAINTING_THREADS)
        })
    }

    /// Number of GPU painting threads.
    ///
    /// Resolution order: the `STRATA_GPU_PAINTING_THREADS` environment
    /// variable, the explicit config value, then one thread when GPU painting
    /// is enabled and none otherwise.
    #[must_use]
    pub fn number_of_gpu_painting_threads(&self) -> usize {
        if let Some(n) = env_thread_count(GPU_PAINTING_THREADS_ENV) {
            return n;
        }
        self.gpu_painting_threads
            .unwrap_or(usize::from(self.gpu_painting_enabled))
    }
}

fn env_thread_count(var: &str) -> Option<usize> {
    let value = std::env::var(var).ok()?;
    match value.trim().parse::<usize>() {
        Ok(n) => Some(n),
        Err(err) => {
            log::warn!("ignoring {var}={value:?}: {err}");
            None
        }
    }
}

/// Scrolling tree parameters.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScrollingConfig {
    /// Whether scroll snapping animates instead of jumping.
    pub scroll_animator_enabled: bool,
    /// Snap animation speed in pixels per second.
    pub snap_animation_speed: f64,
}

impl ScrollingConfig {
    /// Animated snapping at 2000 px/s.
    #[must_use]
    pub const fn animated() -> Self {
        Self {
            scroll_animator_enabled: true,
            snap_animation_speed: 2000.0,
        }
    }

    /// Snapping jumps to its destination immediately.
    #[must_use]
    pub const fn immediate() -> Self {
        Self {
            scroll_animator_enabled: false,
            snap_animation_speed: 2000.0,
        }
    }

    /// Parses a config from JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the JSON is malformed or the speed is not
    /// positive.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        if config.snap_animation_speed.is_nan() || config.snap_animation_speed <= 0.0 {
            return Err(ConfigError::Invalid("snap_animation_speed must be positive"));
        }
        Ok(config)
    }
}

impl Default for ScrollingConfig {
    fn default() -> Self {
        Self::animated()
    }
}
