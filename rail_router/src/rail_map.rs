//! Sparse rail tile map: track layout, signals, depots and waypoints.
//!
//! Only tiles that carry rail are stored. Everything else reads as empty.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::MapError;
use crate::signal::{signal_against_trackdir, signal_along_trackdir, signal_on_track, SignalState, SignalType};
use crate::topology::diagdir_to_diag_trackdir;
use crate::track::{DiagDirection, Track, TrackBits, Trackdir, TrackdirBits};
use crate::types::Tile;

/// Rail gauge. Trains only move between tiles of the same type.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum RailType {
    #[default]
    Rail = 0,
    Mono = 1,
    Maglev = 2,
}

impl RailType {
    pub const fn from_raw(raw: u8) -> Option<RailType> {
        match raw {
            0 => Some(RailType::Rail),
            1 => Some(RailType::Mono),
            2 => Some(RailType::Maglev),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum RailTileType {
    /// Plain track
    Normal,
    /// Plain track with at least one signal
    Signals,
    /// Depot whose entrance is on the given edge
    Depot(DiagDirection),
    Waypoint,
}

/// One rail tile.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RailTile {
    pub rail_type: RailType,
    pub kind: RailTileType,
    pub tracks: TrackBits,
    signals_present: u8,
    signals_green: u8,
    signal_type: SignalType,
    semaphores: bool,
}

impl RailTile {
    fn new(kind: RailTileType, tracks: TrackBits, rail_type: RailType) -> Self {
        Self {
            rail_type,
            kind,
            tracks,
            signals_present: 0,
            signals_green: 0,
            signal_type: SignalType::Normal,
            semaphores: false,
        }
    }

    #[inline]
    pub fn is_plain(&self) -> bool {
        matches!(self.kind, RailTileType::Normal | RailTileType::Signals)
    }

    #[inline]
    pub fn has_signals(&self) -> bool {
        self.kind == RailTileType::Signals
    }

    #[inline]
    pub fn has_signal_on_track(&self, track: Track) -> bool {
        self.tracks.contains(track.bits()) && self.signals_present & signal_on_track(track) != 0
    }

    /// Signal facing a train that drives along `trackdir`
    #[inline]
    pub fn has_signal_on_trackdir(&self, trackdir: Trackdir) -> bool {
        self.tracks.contains(trackdir.track().bits()) && self.signals_present & signal_along_trackdir(trackdir) != 0
    }

    #[inline]
    pub fn has_signal_against_trackdir(&self, trackdir: Trackdir) -> bool {
        self.tracks.contains(trackdir.track().bits()) && self.signals_present & signal_against_trackdir(trackdir) != 0
    }

    pub fn signal_state(&self, trackdir: Trackdir) -> Option<SignalState> {
        if !self.has_signal_on_trackdir(trackdir) {
            return None;
        }
        if self.signals_green & signal_along_trackdir(trackdir) != 0 {
            Some(SignalState::Green)
        } else {
            Some(SignalState::Red)
        }
    }

    /// A one-way signal that only faces the opposite direction.
    #[inline]
    pub fn is_one_way_against(&self, trackdir: Trackdir) -> bool {
        self.has_signal_against_trackdir(trackdir) && !self.has_signal_on_trackdir(trackdir)
    }

    #[inline]
    pub fn is_red_along(&self, trackdir: Trackdir) -> bool {
        self.signal_state(trackdir) == Some(SignalState::Red)
    }

    #[inline]
    pub fn signal_type(&self) -> SignalType {
        self.signal_type
    }

    #[inline]
    pub fn has_semaphores(&self) -> bool {
        self.semaphores
    }

    fn clear_signals(&mut self, mask: u8) {
        self.signals_present &= !mask;
        self.signals_green &= !mask;
        if self.signals_present == 0 && self.kind == RailTileType::Signals {
            self.kind = RailTileType::Normal;
        }
    }
}

/// Rail layout of a rectangular map
#[derive(Clone, Debug, Default)]
pub struct RailMap {
    size_x: u32,
    size_y: u32,
    tiles: FxHashMap<u64, RailTile>,
}

impl RailMap {
    pub fn new(size_x: u32, size_y: u32) -> Self {
        Self { size_x, size_y, tiles: FxHashMap::default() }
    }

    #[inline]
    pub fn size_x(&self) -> u32 {
        self.size_x
    }

    #[inline]
    pub fn size_y(&self) -> u32 {
        self.size_y
    }

    #[inline]
    pub fn contains(&self, tile: Tile) -> bool {
        tile.x < self.size_x && tile.y < self.size_y
    }

    /// Number of tiles carrying rail
    pub fn rail_tile_count(&self) -> usize {
        self.tiles.len()
    }

    fn check_bounds(&self, tile: Tile) -> Result<(), MapError> {
        if self.contains(tile) {
            Ok(())
        } else {
            Err(MapError::OutOfBounds { x: tile.x, y: tile.y, size_x: self.size_x, size_y: self.size_y })
        }
    }

    #[inline]
    pub fn get(&self, tile: Tile) -> Option<&RailTile> {
        self.tiles.get(&tile.as_key())
    }

    /// Tile across the `diagdir` edge, if it lies on the map.
    #[inline]
    pub fn neighbour_tile(&self, tile: Tile, diagdir: DiagDirection) -> Option<Tile> {
        tile.step(diagdir).filter(|&t| self.contains(t))
    }

    // ========== Queries ==========

    #[inline]
    pub fn is_rail(&self, tile: Tile) -> bool {
        self.get(tile).is_some()
    }

    pub fn tile_type(&self, tile: Tile) -> Option<RailTileType> {
        self.get(tile).map(|t| t.kind)
    }

    pub fn rail_type(&self, tile: Tile) -> Option<RailType> {
        self.get(tile).map(|t| t.rail_type)
    }

    /// Entrance edge of a depot tile
    pub fn depot_direction(&self, tile: Tile) -> Option<DiagDirection> {
        match self.tile_type(tile)? {
            RailTileType::Depot(facing) => Some(facing),
            _ => None,
        }
    }

    pub fn track_bits(&self, tile: Tile) -> TrackBits {
        self.get(tile).map_or(TrackBits::empty(), |t| t.tracks)
    }

    pub fn trackdir_bits(&self, tile: Tile) -> TrackdirBits {
        TrackdirBits::from_track_bits(self.track_bits(tile))
    }

    #[inline]
    pub fn has_track(&self, tile: Tile, track: Track) -> bool {
        self.track_bits(tile).contains(track.bits())
    }

    pub fn has_signals(&self, tile: Tile) -> bool {
        self.get(tile).is_some_and(RailTile::has_signals)
    }

    pub fn has_signal_on_track(&self, tile: Tile, track: Track) -> bool {
        self.get(tile).is_some_and(|t| t.has_signal_on_track(track))
    }

    pub fn has_signal_on_trackdir(&self, tile: Tile, trackdir: Trackdir) -> bool {
        self.get(tile).is_some_and(|t| t.has_signal_on_trackdir(trackdir))
    }

    pub fn signal_state(&self, tile: Tile, trackdir: Trackdir) -> Option<SignalState> {
        self.get(tile)?.signal_state(trackdir)
    }

    pub fn signal_type(&self, tile: Tile) -> Option<SignalType> {
        self.get(tile).filter(|t| t.has_signals()).map(RailTile::signal_type)
    }

    pub fn has_semaphores(&self, tile: Tile) -> bool {
        self.get(tile).is_some_and(|t| t.has_signals() && t.semaphores)
    }

    pub fn is_one_way_against(&self, tile: Tile, trackdir: Trackdir) -> bool {
        self.get(tile).is_some_and(|t| t.is_one_way_against(trackdir))
    }

    /// Whether a train driving along `trackdir` is stopped on this tile:
    /// a red signal facing it, or a one-way signal facing the other way.
    pub fn is_signal_blocked(&self, tile: Tile, trackdir: Trackdir) -> bool {
        self.get(tile).is_some_and(|t| t.is_red_along(trackdir) || t.is_one_way_against(trackdir))
    }

    // ========== Editing ==========

    /// Lay `track` on `tile`, creating a plain rail tile when needed.
    pub fn set_track(&mut self, tile: Tile, track: Track, rail_type: RailType) -> Result<(), MapError> {
        self.check_bounds(tile)?;
        match self.tiles.get_mut(&tile.as_key()) {
            Some(existing) => {
                if !existing.is_plain() {
                    return Err(MapError::NotPlainRail { x: tile.x, y: tile.y });
                }
                if existing.rail_type != rail_type {
                    return Err(MapError::RailTypeMismatch {
                        x: tile.x,
                        y: tile.y,
                        existing: existing.rail_type,
                        requested: rail_type,
                    });
                }
                let tracks = existing.tracks | track.bits();
                if existing.has_signals() && !signals_fit(tracks) {
                    return Err(MapError::SignalsNotAllowed { x: tile.x, y: tile.y });
                }
                existing.tracks = tracks;
            }
            None => {
                self.tiles.insert(tile.as_key(), RailTile::new(RailTileType::Normal, track.bits(), rail_type));
            }
        }
        Ok(())
    }

    /// Lay several tracks at once.
    pub fn set_tracks(&mut self, tile: Tile, tracks: TrackBits, rail_type: RailType) -> Result<(), MapError> {
        for track in tracks.tracks() {
            self.set_track(tile, track, rail_type)?;
        }
        Ok(())
    }

    /// Remove `track` and its signals. Returns whether the track was there.
    /// Removing the track of a depot or waypoint removes the whole tile.
    pub fn remove_track(&mut self, tile: Tile, track: Track) -> Result<bool, MapError> {
        self.check_bounds(tile)?;
        let key = tile.as_key();
        let Some(existing) = self.tiles.get_mut(&key) else {
            return Ok(false);
        };
        if !existing.tracks.contains(track.bits()) {
            return Ok(false);
        }
        if !existing.is_plain() {
            self.tiles.remove(&key);
            return Ok(true);
        }
        existing.tracks.remove(track.bits());
        existing.clear_signals(signal_on_track(track));
        if existing.tracks.is_empty() {
            self.tiles.remove(&key);
        }
        Ok(true)
    }

    /// Remove everything from `tile`.
    pub fn clear_tile(&mut self, tile: Tile) -> bool {
        self.tiles.remove(&tile.as_key()).is_some()
    }

    fn plain_tile_mut(&mut self, tile: Tile, track: Track) -> Result<&mut RailTile, MapError> {
        self.check_bounds(tile)?;
        let existing = self
            .tiles
            .get_mut(&tile.as_key())
            .filter(|t| t.tracks.contains(track.bits()))
            .ok_or(MapError::NoTrack { x: tile.x, y: tile.y, track })?;
        if !existing.is_plain() {
            return Err(MapError::NotPlainRail { x: tile.x, y: tile.y });
        }
        Ok(existing)
    }

    fn signal_tile_mut(&mut self, tile: Tile, track: Track) -> Result<&mut RailTile, MapError> {
        let existing = self.plain_tile_mut(tile, track)?;
        if !signals_fit(existing.tracks) {
            return Err(MapError::SignalsNotAllowed { x: tile.x, y: tile.y });
        }
        Ok(existing)
    }

    /// Put a signal facing trains that drive along `trackdir`.
    pub fn set_signal(&mut self, tile: Tile, trackdir: Trackdir, state: SignalState) -> Result<(), MapError> {
        let existing = self.signal_tile_mut(tile, trackdir.track())?;
        let bit = signal_along_trackdir(trackdir);
        existing.signals_present |= bit;
        match state {
            SignalState::Green => existing.signals_green |= bit,
            SignalState::Red => existing.signals_green &= !bit,
        }
        existing.kind = RailTileType::Signals;
        Ok(())
    }

    /// Put signals facing both directions of `track`.
    pub fn set_two_way_signal(&mut self, tile: Tile, track: Track, state: SignalState) -> Result<(), MapError> {
        let trackdir = track.to_trackdir();
        self.set_signal(tile, trackdir, state)?;
        self.set_signal(tile, trackdir.reverse(), state)
    }

    /// Change the aspect of an existing signal.
    pub fn set_signal_state(&mut self, tile: Tile, trackdir: Trackdir, state: SignalState) -> Result<(), MapError> {
        let existing = self.plain_tile_mut(tile, trackdir.track())?;
        if !existing.has_signal_on_trackdir(trackdir) {
            return Err(MapError::NoSignal { x: tile.x, y: tile.y, trackdir });
        }
        let bit = signal_along_trackdir(trackdir);
        match state {
            SignalState::Green => existing.signals_green |= bit,
            SignalState::Red => existing.signals_green &= !bit,
        }
        Ok(())
    }

    pub fn remove_signals(&mut self, tile: Tile, track: Track) -> Result<(), MapError> {
        let existing = self.plain_tile_mut(tile, track)?;
        existing.clear_signals(signal_on_track(track));
        Ok(())
    }

    /// Set the signal type and semaphore flag shared by all signals on `tile`.
    pub fn set_signal_variant(&mut self, tile: Tile, signal_type: SignalType, semaphores: bool) -> Result<(), MapError> {
        self.check_bounds(tile)?;
        let existing = self
            .tiles
            .get_mut(&tile.as_key())
            .filter(|t| t.has_signals())
            .ok_or(MapError::SignalsNotAllowed { x: tile.x, y: tile.y })?;
        existing.signal_type = signal_type;
        existing.semaphores = semaphores;
        Ok(())
    }

    /// Replace `tile` with a depot whose entrance faces `facing`.
    pub fn set_depot(&mut self, tile: Tile, facing: DiagDirection, rail_type: RailType) -> Result<(), MapError> {
        self.check_bounds(tile)?;
        let track = diagdir_to_diag_trackdir(facing).track();
        self.tiles.insert(tile.as_key(), RailTile::new(RailTileType::Depot(facing), track.bits(), rail_type));
        Ok(())
    }

    /// Replace `tile` with a waypoint on the diagonal `track`.
    pub fn set_waypoint(&mut self, tile: Tile, track: Track, rail_type: RailType) -> Result<(), MapError> {
        self.check_bounds(tile)?;
        if !track.is_diagonal() {
            return Err(MapError::NonDiagonalWaypoint(track));
        }
        self.tiles.insert(tile.as_key(), RailTile::new(RailTileType::Waypoint, track.bits(), rail_type));
        Ok(())
    }
}

/// Signal bits are shared between crossing tracks, so signals only go on a
/// lone track or a pair of parallel ones.
fn signals_fit(tracks: TrackBits) -> bool {
    tracks.bits().count_ones() == 1 || tracks == TrackBits::HORIZONTAL || tracks == TrackBits::VERTICAL
}
