//! Error types for configuration loading and route requests.
//!
//! Search outcomes such as "no path" are not errors; they are reported through
//! [`SearchStatus`](crate::aystar::SearchStatus).

use std::path::PathBuf;

use thiserror::Error;

use crate::rail_map::RailType;
use crate::track::{Track, Trackdir};

/// Errors raised while loading or validating a [`RouterConfig`](crate::config::RouterConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error("invalid value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Errors raised while editing a [`RailMap`](crate::rail_map::RailMap).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MapError {
    #[error("tile ({x}, {y}) is outside the {size_x}x{size_y} map")]
    OutOfBounds { x: u32, y: u32, size_x: u32, size_y: u32 },

    #[error("tile ({x}, {y}) has no {track:?} track")]
    NoTrack { x: u32, y: u32, track: Track },

    #[error("tile ({x}, {y}) is a depot or waypoint")]
    NotPlainRail { x: u32, y: u32 },

    #[error("tile ({x}, {y}) carries {existing:?}, not {requested:?}")]
    RailTypeMismatch { x: u32, y: u32, existing: RailType, requested: RailType },

    #[error("signals on tile ({x}, {y}) need a single track or two parallel tracks")]
    SignalsNotAllowed { x: u32, y: u32 },

    #[error("tile ({x}, {y}) has no signal facing {trackdir:?}")]
    NoSignal { x: u32, y: u32, trackdir: Trackdir },

    #[error("waypoints need a diagonal track, got {0:?}")]
    NonDiagonalWaypoint(Track),
}

/// Errors raised when a route request can not be turned into a search.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RouteError {
    #[error("route request has no source nodes")]
    NoSources,

    #[error("route request has no targets")]
    NoTargets,

    #[error("tile ({x}, {y}) is outside the {size_x}x{size_y} map")]
    OutOfBounds { x: u32, y: u32, size_x: u32, size_y: u32 },

    #[error("tile ({x}, {y}) has no track for {trackdir:?}")]
    MissingTrack { x: u32, y: u32, trackdir: Trackdir },

    #[error("raw value {0:#04x} is not a valid trackdir")]
    InvalidTrackdir(u8),

    #[error("raw value {0:#04x} is not a valid track")]
    InvalidTrack(u8),

    #[error("raw value {0:#04x} is not a valid direction")]
    InvalidDirection(u8),
}
