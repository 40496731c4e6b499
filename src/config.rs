//! Engine configuration loaded from TOML
//!
//! Lengths are in dp and converted with `screen.density`; times are in ms.
//! Every section has defaults, so a partial file (or none) is fine.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScreenConfig {
    pub width: f64,
    pub height: f64,
    /// Pixels per dp
    pub density: f64,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: 720.0,
            height: 1440.0,
            density: 2.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GridConfig {
    pub columns: usize,
    pub rows: usize,
    /// Show two panels side by side (foldables)
    pub two_panel: bool,
    /// Height of the drop target bar at the top of the screen (dp)
    pub drop_bar_height: f64,
}

impl Default for GridConfig {
    fn default() -> Self {
        Self {
            columns: 4,
            rows: 5,
            two_panel: false,
            drop_bar_height: 48.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DragConfig {
    /// Vertical (or horizontal, in vertical bar layout) velocity a fling must
    /// beat to count as fling-to-delete, dp/s. Negative is up/left.
    pub fling_to_delete_min_velocity: f64,
    /// Maximum angle between the fling and the delete direction
    pub max_fling_degrees: f64,
    /// Velocity clamp, dp/s
    pub max_fling_velocity: f64,
    /// Width of the edge zones that page the workspace during a drag (dp)
    pub scroll_zone: f64,
    pub scroll_delay_ms: u64,
    pub rescroll_delay_ms: u64,
    /// Movement since the last page scroll below which the longer delay applies (dp)
    pub window_touch_slop: f64,
    /// Drop target bar sits on the left instead of the top
    pub vertical_bar_layout: bool,
    pub drop_animation_ms: u64,
}

impl Default for DragConfig {
    fn default() -> Self {
        Self {
            fling_to_delete_min_velocity: -1500.0,
            max_fling_degrees: 35.0,
            max_fling_velocity: 8000.0,
            scroll_zone: 20.0,
            scroll_delay_ms: 500,
            rescroll_delay_ms: 750,
            window_touch_slop: 16.0,
            vertical_bar_layout: false,
            drop_animation_ms: 300,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub reorder_timeout_ms: u64,
    pub long_press_ms: u64,
    /// Movement that cancels a long press (dp)
    pub touch_slop: f64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            reorder_timeout_ms: 650,
            long_press_ms: 500,
            touch_slop: 8.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PinchConfig {
    /// Workspace scale in overview mode
    pub overview_scale: f64,
    /// Progress velocity (per second) that decides the outcome on release
    pub commit_velocity: f64,
}

impl Default for PinchConfig {
    fn default() -> Self {
        Self {
            overview_scale: 0.58,
            commit_velocity: 1.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollConfig {
    /// Last scroll delta below which a touch down stops a settling fling (dp)
    pub delta_threshold_dp: f64,
    /// Velocity multiplier applied per frame while settling
    pub fling_friction: f64,
    pub frame_interval_ms: u64,
    /// Height of one row in the all apps list (dp)
    pub row_height: f64,
}

impl Default for ScrollConfig {
    fn default() -> Self {
        Self {
            delta_threshold_dp: 4.0,
            fling_friction: 0.9,
            frame_interval_ms: 16,
            row_height: 72.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemBarsConfig {
    /// Ask for transparent status/navigation bars where supported
    pub transparent: bool,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub screen: ScreenConfig,
    pub grid: GridConfig,
    pub drag: DragConfig,
    pub timing: TimingConfig,
    pub pinch: PinchConfig,
    pub scroll: ScrollConfig,
    pub system_bars: SystemBarsConfig,
}

impl EngineConfig {
    /// Default location: $XDG_CONFIG_HOME/flick/dnd.toml or ~/.config/flick/dnd.toml
    pub fn config_path() -> Option<PathBuf> {
        std::env::var("XDG_CONFIG_HOME")
            .map(PathBuf::from)
            .or_else(|_| std::env::var("HOME").map(|h| PathBuf::from(h).join(".config")))
            .ok()
            .map(|dir| dir.join("flick/dnd.toml"))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|source| Error::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&contents)?;
        tracing::info!("Loaded engine config from {:?}", path);
        Ok(config)
    }

    /// Load an explicit file, else the default location, else defaults
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        if let Some(path) = Self::config_path() {
            if path.exists() {
                return Self::load_from(&path);
            }
        }
        tracing::info!("No engine config found, using defaults");
        Ok(Self::default())
    }

    /// Convert dp to px
    pub fn px(&self, dp: f64) -> f64 {
        dp * self.screen.density
    }
}
