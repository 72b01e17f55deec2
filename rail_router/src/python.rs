//! Python bindings, built with the `python` feature.
//!
//! Nodes cross the boundary as `(x, y, trackdir)` tuples with the raw
//! trackdir value; tracks, directions and rail types are raw integers too.

use std::collections::HashMap;

use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;

use crate::aystar::SearchStatus;
use crate::config::RouterConfig;
use crate::error::{ConfigError, MapError, RouteError};
use crate::node_list::NodeState;
use crate::rail_map::{RailMap, RailType};
use crate::router::{self, RouteRequest, RouteSearch, RouteTarget};
use crate::signal::SignalState;
use crate::track::{DiagDirection, Track, Trackdir};
use crate::types::{AyStarNode, Tile};

type PyNode = (u32, u32, u8);

impl From<RouteError> for PyErr {
    fn from(err: RouteError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

impl From<MapError> for PyErr {
    fn from(err: MapError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

impl From<ConfigError> for PyErr {
    fn from(err: ConfigError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

fn trackdir_from_raw(raw: u8) -> Result<Trackdir, RouteError> {
    Trackdir::from_raw(raw).ok_or(RouteError::InvalidTrackdir(raw))
}

fn track_from_raw(raw: u8) -> Result<Track, RouteError> {
    Track::from_raw(raw).ok_or(RouteError::InvalidTrack(raw))
}

fn rail_type_from_raw(raw: u8) -> PyResult<RailType> {
    RailType::from_raw(raw).ok_or_else(|| PyValueError::new_err(format!("invalid rail type {raw}")))
}

fn signal_state(green: bool) -> SignalState {
    if green {
        SignalState::Green
    } else {
        SignalState::Red
    }
}

fn decode_node((x, y, td): PyNode) -> Result<AyStarNode, RouteError> {
    Ok(AyStarNode::new(Tile::new(x, y), trackdir_from_raw(td)?))
}

#[inline]
fn encode_node(node: &AyStarNode) -> PyNode {
    (node.tile.x, node.tile.y, node.trackdir as u8)
}

fn build_request(
    sources: Vec<PyNode>,
    target_tiles: Vec<(u32, u32)>,
    target_nodes: Option<Vec<PyNode>>,
    ignore_start_as_goal: bool,
) -> Result<RouteRequest, RouteError> {
    let sources = sources.into_iter().map(decode_node).collect::<Result<Vec<_>, _>>()?;
    let mut target = RouteTarget::from_tiles(target_tiles.into_iter().map(|(x, y)| Tile::new(x, y)));
    for node in target_nodes.unwrap_or_default() {
        target.add_node(decode_node(node)?);
    }
    Ok(RouteRequest { sources, target, ignore_start_as_goal })
}

fn load_config(config_yaml: Option<&str>) -> Result<RouterConfig, ConfigError> {
    match config_yaml {
        Some(yaml) => RouterConfig::from_yaml_str(yaml),
        None => Ok(RouterConfig::default()),
    }
}

/// Rail layout exposed to Python
#[pyclass(name = "RailMap")]
#[derive(Clone)]
pub struct PyRailMap {
    inner: RailMap,
}

#[pymethods]
impl PyRailMap {
    #[new]
    pub fn new(size_x: u32, size_y: u32) -> Self {
        Self { inner: RailMap::new(size_x, size_y) }
    }

    #[getter]
    pub fn size_x(&self) -> u32 {
        self.inner.size_x()
    }

    #[getter]
    pub fn size_y(&self) -> u32 {
        self.inner.size_y()
    }

    /// Create a deep copy of this map
    #[pyo3(name = "clone")]
    pub fn py_clone(&self) -> Self {
        self.clone()
    }

    #[pyo3(signature = (x, y, track, rail_type=0))]
    pub fn set_track(&mut self, x: u32, y: u32, track: u8, rail_type: u8) -> PyResult<()> {
        let track = track_from_raw(track)?;
        Ok(self.inner.set_track(Tile::new(x, y), track, rail_type_from_raw(rail_type)?)?)
    }

    pub fn remove_track(&mut self, x: u32, y: u32, track: u8) -> PyResult<bool> {
        Ok(self.inner.remove_track(Tile::new(x, y), track_from_raw(track)?)?)
    }

    /// Add a signal facing trains that drive along `trackdir`
    #[pyo3(signature = (x, y, trackdir, green=true))]
    pub fn set_signal(&mut self, x: u32, y: u32, trackdir: u8, green: bool) -> PyResult<()> {
        Ok(self.inner.set_signal(Tile::new(x, y), trackdir_from_raw(trackdir)?, signal_state(green))?)
    }

    #[pyo3(signature = (x, y, track, green=true))]
    pub fn set_two_way_signal(&mut self, x: u32, y: u32, track: u8, green: bool) -> PyResult<()> {
        Ok(self.inner.set_two_way_signal(Tile::new(x, y), track_from_raw(track)?, signal_state(green))?)
    }

    pub fn set_signal_state(&mut self, x: u32, y: u32, trackdir: u8, green: bool) -> PyResult<()> {
        Ok(self.inner.set_signal_state(Tile::new(x, y), trackdir_from_raw(trackdir)?, signal_state(green))?)
    }

    pub fn remove_signals(&mut self, x: u32, y: u32, track: u8) -> PyResult<()> {
        Ok(self.inner.remove_signals(Tile::new(x, y), track_from_raw(track)?)?)
    }

    /// Place a depot with its entrance on edge `facing` (0=NE, 1=SE, 2=SW, 3=NW)
    #[pyo3(signature = (x, y, facing, rail_type=0))]
    pub fn set_depot(&mut self, x: u32, y: u32, facing: u8, rail_type: u8) -> PyResult<()> {
        let facing = DiagDirection::from_raw(facing).ok_or(RouteError::InvalidDirection(facing))?;
        Ok(self.inner.set_depot(Tile::new(x, y), facing, rail_type_from_raw(rail_type)?)?)
    }

    #[pyo3(signature = (x, y, track, rail_type=0))]
    pub fn set_waypoint(&mut self, x: u32, y: u32, track: u8, rail_type: u8) -> PyResult<()> {
        let track = track_from_raw(track)?;
        Ok(self.inner.set_waypoint(Tile::new(x, y), track, rail_type_from_raw(rail_type)?)?)
    }

    pub fn has_track(&self, x: u32, y: u32, track: u8) -> PyResult<bool> {
        Ok(self.inner.has_track(Tile::new(x, y), track_from_raw(track)?))
    }

    /// Raw track bit set of a tile (0 for no rail)
    pub fn track_bits(&self, x: u32, y: u32) -> u8 {
        self.inner.track_bits(Tile::new(x, y)).bits()
    }

    pub fn is_signal_blocked(&self, x: u32, y: u32, trackdir: u8) -> PyResult<bool> {
        Ok(self.inner.is_signal_blocked(Tile::new(x, y), trackdir_from_raw(trackdir)?))
    }
}

/// Search state snapshot for visualization
#[pyclass]
#[derive(Clone)]
pub struct SearchSnapshot {
    #[pyo3(get)]
    pub batch: u32,
    #[pyo3(get)]
    pub expanded: u32,
    #[pyo3(get)]
    pub status: String,
    #[pyo3(get)]
    pub open_count: usize,
    #[pyo3(get)]
    pub closed_count: usize,
    #[pyo3(get)]
    pub found: bool,
    #[pyo3(get)]
    pub path: Option<Vec<PyNode>>,
    /// Closed nodes (sampled if too large)
    #[pyo3(get)]
    pub closed_nodes: Vec<PyNode>,
    /// Open nodes (sampled if too large)
    #[pyo3(get)]
    pub open_nodes: Vec<PyNode>,
}

#[pymethods]
impl SearchSnapshot {
    fn __repr__(&self) -> String {
        format!(
            "SearchSnapshot(batch={}, status={}, open={}, closed={}, found={})",
            self.batch, self.status, self.open_count, self.closed_count, self.found
        )
    }
}

/// Batch-stepped route search for visualization and cooperative scheduling
#[pyclass(name = "RouteSearch")]
pub struct PyRouteSearch {
    inner: RouteSearch,
}

#[pymethods]
impl PyRouteSearch {
    #[new]
    #[pyo3(signature = (max_search_nodes=None, max_path_cost=None, loops_per_tick=None, config_yaml=None))]
    pub fn new(
        max_search_nodes: Option<u32>,
        max_path_cost: Option<i32>,
        loops_per_tick: Option<u32>,
        config_yaml: Option<&str>,
    ) -> PyResult<Self> {
        let mut config = load_config(config_yaml)?;
        if let Some(n) = max_search_nodes {
            config.search.max_search_nodes = n;
        }
        if let Some(cost) = max_path_cost {
            config.search.max_path_cost = cost;
        }
        if let Some(loops) = loops_per_tick {
            config.search.loops_per_tick = loops;
        }
        config.validate()?;
        Ok(Self { inner: RouteSearch::new(&config) })
    }

    /// Initialize the search with sources and targets
    #[pyo3(signature = (map, sources, target_tiles, target_nodes=None, ignore_start_as_goal=false))]
    pub fn init(
        &mut self,
        map: &PyRailMap,
        sources: Vec<PyNode>,
        target_tiles: Vec<(u32, u32)>,
        target_nodes: Option<Vec<PyNode>>,
        ignore_start_as_goal: bool,
    ) -> PyResult<()> {
        let request = build_request(sources, target_tiles, target_nodes, ignore_start_as_goal)?;
        Ok(self.inner.init(&map.inner, &request)?)
    }

    /// Run one batch, returns snapshot of current state
    pub fn step(&mut self, map: &PyRailMap) -> SearchSnapshot {
        self.inner.step(&map.inner);
        self.create_snapshot()
    }

    pub fn is_done(&self) -> bool {
        self.inner.is_done()
    }

    pub fn get_path(&self) -> Option<Vec<PyNode>> {
        self.inner.path().map(|path| path.iter().map(encode_node).collect())
    }

    pub fn get_status(&self) -> &'static str {
        self.inner.status().as_str()
    }

    pub fn get_stats(&self) -> HashMap<String, f64> {
        self.inner.stats().to_map()
    }
}

impl PyRouteSearch {
    fn create_snapshot(&self) -> SearchSnapshot {
        const MAX_NODES: usize = 50000;

        let nodes = self.inner.aystar().nodes();
        let collect = |state: NodeState| -> Vec<PyNode> {
            nodes
                .iter()
                .filter(|(_, n)| n.state == state)
                .take(MAX_NODES)
                .map(|(_, n)| encode_node(&n.key))
                .collect()
        };

        let stats = self.inner.stats();
        SearchSnapshot {
            batch: stats.batches,
            expanded: stats.nodes_expanded,
            status: self.inner.status().as_str().to_string(),
            open_count: nodes.open_count(),
            closed_count: nodes.closed_count(),
            found: self.inner.status() == SearchStatus::Found,
            path: self.get_path(),
            closed_nodes: collect(NodeState::Closed),
            open_nodes: collect(NodeState::Open),
        }
    }
}

/// Route from `sources` to the nearest target in one call.
/// Returns (path or None, status, stats).
#[pyfunction]
#[pyo3(signature = (map, sources, target_tiles, target_nodes=None, ignore_start_as_goal=false, config_yaml=None))]
pub fn find_route(
    map: &PyRailMap,
    sources: Vec<PyNode>,
    target_tiles: Vec<(u32, u32)>,
    target_nodes: Option<Vec<PyNode>>,
    ignore_start_as_goal: bool,
    config_yaml: Option<&str>,
) -> PyResult<(Option<Vec<PyNode>>, &'static str, HashMap<String, f64>)> {
    let config = load_config(config_yaml)?;
    let request = build_request(sources, target_tiles, target_nodes, ignore_start_as_goal)?;
    let result = router::find_route(&map.inner, &request, &config)?;
    let path = result.path.map(|path| path.iter().map(encode_node).collect());
    Ok((path, result.status.as_str(), result.stats.to_map()))
}
