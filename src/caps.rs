//! Platform capability probing
//!
//! Features the platform may lack are probed once at start-up. Asking for an
//! unsupported feature is a logged no-op, never an error.

use std::path::PathBuf;

use tracing::{debug, info};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlatformCaps {
    /// Wayland display socket, if a compositor is running
    pub wayland_display: Option<PathBuf>,
    /// Compositor can draw translucent status and navigation bars
    pub transparent_bars: bool,
}

impl PlatformCaps {
    /// Probe the running environment
    pub fn detect() -> Self {
        let caps = Self::from_env(|key| std::env::var(key).ok());
        info!(?caps, "Platform capabilities");
        caps
    }

    /// Probe through an environment lookup
    pub fn from_env(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let wayland_display = match (lookup("XDG_RUNTIME_DIR"), lookup("WAYLAND_DISPLAY")) {
            (Some(runtime), Some(display)) => Some(PathBuf::from(runtime).join(display)),
            _ => None,
        };
        let socket_present = wayland_display.as_ref().is_some_and(|p| p.exists());
        debug!(?wayland_display, socket_present, "Probed Wayland display");

        // FLICK_OPAQUE_BARS forces the fallback even on a capable compositor
        let forced_opaque = lookup("FLICK_OPAQUE_BARS").is_some_and(|v| v != "0");
        Self {
            transparent_bars: socket_present && !forced_opaque,
            wayland_display,
        }
    }
}

/// Status and navigation bar appearance
#[derive(Debug)]
pub struct SystemBars {
    supported: bool,
    transparent: bool,
}

impl SystemBars {
    pub fn new(caps: &PlatformCaps) -> Self {
        Self {
            supported: caps.transparent_bars,
            transparent: false,
        }
    }

    /// Request transparent bars. Returns the state actually in effect.
    pub fn set_transparent(&mut self, transparent: bool) -> bool {
        if !self.supported {
            debug!(transparent, "Transparent system bars unsupported, ignoring");
            return self.transparent;
        }
        if self.transparent != transparent {
            info!(transparent, "System bar transparency changed");
            self.transparent = transparent;
        }
        self.transparent
    }

    pub fn is_transparent(&self) -> bool {
        self.transparent
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_display_means_no_transparency() {
        let caps = PlatformCaps::from_env(|_| None);
        assert_eq!(caps, PlatformCaps::default());

        let mut bars = SystemBars::new(&caps);
        assert!(!bars.set_transparent(true));
        assert!(!bars.is_transparent());
    }

    #[test]
    fn test_missing_socket_degrades() {
        let caps = PlatformCaps::from_env(|key| match key {
            "XDG_RUNTIME_DIR" => Some("/nonexistent/run".to_string()),
            "WAYLAND_DISPLAY" => Some("wayland-9".to_string()),
            _ => None,
        });
        assert_eq!(caps.wayland_display, Some(PathBuf::from("/nonexistent/run/wayland-9")));
        assert!(!caps.transparent_bars);
    }

    #[test]
    fn test_supported_bars_toggle() {
        let caps = PlatformCaps {
            wayland_display: None,
            transparent_bars: true,
        };
        let mut bars = SystemBars::new(&caps);
        assert!(bars.set_transparent(true));
        assert!(!bars.set_transparent(false));
    }
}
