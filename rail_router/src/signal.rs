//! Signal encoding on rail tiles.
//!
//! A tile stores one presence byte and one state byte. Each track owns two
//! bits in each byte, one per travel direction, so a track can carry a signal
//! facing either way (or both).

use serde::{Deserialize, Serialize};

use crate::track::{Track, Trackdir, TRACKDIR_END, TRACK_END};

/// Kind of signal installed on a tile. Signal types cannot be mixed on one tile.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SignalType {
    #[default]
    Normal = 0,
    /// Presignal block entry
    Entry = 1,
    /// Presignal block exit
    Exit = 2,
    /// Presignal inter-block
    Combo = 3,
}

#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub enum SignalState {
    Red = 0,
    Green = 1,
}

/// Bit storing the signal that faces a train driving along each trackdir.
static SIGNAL_ALONG_TRACKDIR: [u8; TRACKDIR_END] = [
    0x80, 0x80, 0x80, 0x20, 0x40, 0x10, 0, 0,
    0x40, 0x40, 0x40, 0x10, 0x80, 0x20,
];

/// Bit storing the signal that faces against each trackdir.
static SIGNAL_AGAINST_TRACKDIR: [u8; TRACKDIR_END] = [
    0x40, 0x40, 0x40, 0x10, 0x80, 0x20, 0, 0,
    0x80, 0x80, 0x80, 0x20, 0x40, 0x10,
];

/// Both signal bits belonging to each track.
static SIGNAL_ON_TRACK: [u8; TRACK_END] = [0xC0, 0xC0, 0xC0, 0x30, 0xC0, 0x30];

#[inline]
pub fn signal_along_trackdir(trackdir: Trackdir) -> u8 {
    SIGNAL_ALONG_TRACKDIR[trackdir.index()]
}

#[inline]
pub fn signal_against_trackdir(trackdir: Trackdir) -> u8 {
    SIGNAL_AGAINST_TRACKDIR[trackdir.index()]
}

#[inline]
pub fn signal_on_track(track: Track) -> u8 {
    SIGNAL_ON_TRACK[track.index()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_along_and_against_partition_track_bits() {
        for td in Trackdir::ALL {
            let along = signal_along_trackdir(td);
            let against = signal_against_trackdir(td);
            assert_eq!(along & against, 0);
            assert_eq!(along | against, signal_on_track(td.track()));
            assert_eq!(along, signal_against_trackdir(td.reverse()));
        }
    }

    #[test]
    fn test_parallel_tracks_use_distinct_bits() {
        assert_eq!(signal_on_track(Track::Upper) & signal_on_track(Track::Lower), 0);
        assert_eq!(signal_on_track(Track::Left) & signal_on_track(Track::Right), 0);
    }
}
