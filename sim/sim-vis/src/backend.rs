//! Backend selection and capability negotiation.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::VisError;

/// Rendering backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum Backend {
    /// Software top-down renderer with image capture.
    #[default]
    Raster,
    /// No rendering; the loop still runs the scene calls.
    Headless,
}

impl Backend {
    /// Backends built into this binary, preferred first.
    #[must_use]
    pub fn compiled() -> &'static [Self] {
        #[cfg(feature = "raster")]
        {
            &[Self::Raster, Self::Headless]
        }
        #[cfg(not(feature = "raster"))]
        {
            &[Self::Headless]
        }
    }

    /// Whether this backend is built in.
    #[must_use]
    pub fn is_compiled(self) -> bool {
        Self::compiled().contains(&self)
    }

    /// What the backend can do.
    #[must_use]
    pub fn capabilities(self) -> Capabilities {
        match self {
            Self::Raster => Capabilities {
                framebuffer: true,
                image_capture: true,
            },
            Self::Headless => Capabilities {
                framebuffer: false,
                image_capture: false,
            },
        }
    }

    /// Lowercase name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Raster => "raster",
            Self::Headless => "headless",
        }
    }
}

impl fmt::Display for Backend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Backend {
    type Err = VisError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "raster" => Ok(Self::Raster),
            "headless" | "none" => Ok(Self::Headless),
            other => Err(VisError::UnknownBackend(other.to_string())),
        }
    }
}

/// Features a backend offers the loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Rendering produces pixels.
    pub framebuffer: bool,
    /// `write_image` can save frames.
    pub image_capture: bool,
}

/// Outcome of backend negotiation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Negotiated {
    /// Backend asked for.
    pub requested: Backend,
    /// Backend that will be used.
    pub chosen: Backend,
    /// Capabilities of the chosen backend.
    pub capabilities: Capabilities,
}

impl Negotiated {
    /// Whether the request could not be honoured.
    #[must_use]
    pub fn fell_back(&self) -> bool {
        self.requested != self.chosen
    }
}

/// Pick the requested backend if it is built in, otherwise the first one that is.
#[must_use]
pub fn negotiate(requested: Backend) -> Negotiated {
    negotiate_among(requested, Backend::compiled())
}

fn negotiate_among(requested: Backend, available: &[Backend]) -> Negotiated {
    let chosen = if available.contains(&requested) {
        requested
    } else {
        available.first().copied().unwrap_or(Backend::Headless)
    };
    if chosen == requested {
        info!(backend = %chosen, "visual system selected");
    } else {
        warn!(
            requested = %requested,
            chosen = %chosen,
            "requested visual backend not available, falling back"
        );
    }
    Negotiated {
        requested,
        chosen,
        capabilities: chosen.capabilities(),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_always_compiled() {
        assert!(Backend::Headless.is_compiled());
        assert_eq!(Backend::compiled().last(), Some(&Backend::Headless));
    }

    #[test]
    fn test_negotiate_available_backend() {
        let n = negotiate(Backend::Headless);
        assert_eq!(n.chosen, Backend::Headless);
        assert!(!n.fell_back());
        assert!(!n.capabilities.image_capture);
    }

    #[test]
    fn test_negotiate_falls_back() {
        let n = negotiate_among(Backend::Raster, &[Backend::Headless]);
        assert_eq!(n.requested, Backend::Raster);
        assert_eq!(n.chosen, Backend::Headless);
        assert!(n.fell_back());
        assert_eq!(n.capabilities, Backend::Headless.capabilities());
    }

    #[cfg(feature = "raster")]
    #[test]
    fn test_raster_compiled_by_default() {
        let n = negotiate(Backend::Raster);
        assert_eq!(n.chosen, Backend::Raster);
        assert!(n.capabilities.image_capture);
    }

    #[test]
    fn test_parse() {
        assert_eq!("Raster".parse::<Backend>().unwrap(), Backend::Raster);
        assert_eq!("headless".parse::<Backend>().unwrap(), Backend::Headless);
        assert!(matches!(
            "vsg".parse::<Backend>(),
            Err(VisError::UnknownBackend(_))
        ));
        assert_eq!(Backend::Headless.to_string(), "headless");
    }
}
