//! Time-sliced A* pathfinding for trains on a tile grid.
//!
//! Search nodes are directed track segments (a trackdir on a tile). The
//! generic engine lives in [`aystar`]; [`router`] plugs in rail movement
//! rules on top of a [`RailMap`]. Python bindings are available with the
//! `python` feature.

pub mod aystar;
pub mod config;
pub mod error;
pub mod node_list;
pub mod rail_map;
pub mod router;
pub mod signal;
pub mod topology;
pub mod track;
pub mod types;

#[cfg(feature = "python")]
mod python;

pub use aystar::{AyStar, AyStarCallbacks, PathNodeRef, SearchStatus};
pub use config::{CostSettings, RouterConfig, SearchSettings, SignalPolicy};
pub use error::{ConfigError, MapError, RouteError};
pub use node_list::{NodeId, NodeList, PathNode};
pub use rail_map::{RailMap, RailTile, RailTileType, RailType};
pub use router::{find_route, RailRouter, RouteRequest, RouteResult, RouteSearch, RouteTarget};
pub use signal::{SignalState, SignalType};
pub use track::{DiagDirection, Direction, Track, TrackBits, Trackdir, TrackdirBits};
pub use types::{AyStarNode, SearchStats, Tile};

#[cfg(feature = "python")]
use pyo3::prelude::*;

/// Python module
#[cfg(feature = "python")]
#[pymodule]
fn rail_router(m: &Bound<'_, PyModule>) -> PyResult<()> {
    m.add("__version__", env!("CARGO_PKG_VERSION"))?;
    m.add_class::<python::PyRailMap>()?;
    m.add_class::<python::PyRouteSearch>()?;
    m.add_class::<python::SearchSnapshot>()?;
    m.add_function(wrap_pyfunction!(python::find_route, m)?)?;
    Ok(())
}
