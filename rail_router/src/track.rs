//! Tracks, trackdirs and compass directions on a rail tile.
//!
//! Raw encodings are kept bit-compatible with the classic rail map layout:
//! trackdirs use 0-5 for one travel direction and 8-13 for the other, so
//! `trackdir & 7` always yields the underlying track.

use bitflags::bitflags;

/// Number of track slots on a tile.
pub const TRACK_END: usize = 6;
/// Size of trackdir-indexed tables (includes the unused 6 and 7 slots).
pub const TRACKDIR_END: usize = 14;
/// Number of four-way directions.
pub const DIAGDIR_END: usize = 4;
/// Number of eight-way directions.
pub const DIR_END: usize = 8;

/// Raw sentinel for "no track".
pub const INVALID_TRACK: u8 = 0xFF;
/// Raw sentinel for "no trackdir".
pub const INVALID_TRACKDIR: u8 = 0xFF;

/// One of the six undirected track pieces that can occupy a tile.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Track {
    Diag1 = 0,
    Diag2 = 1,
    Upper = 2,
    Lower = 3,
    Left = 4,
    Right = 5,
}

impl Track {
    pub const ALL: [Track; TRACK_END] = [
        Track::Diag1,
        Track::Diag2,
        Track::Upper,
        Track::Lower,
        Track::Left,
        Track::Right,
    ];

    /// Decode a raw track value. Returns None for the sentinel and anything >= 6.
    #[inline]
    pub const fn from_raw(raw: u8) -> Option<Track> {
        if Self::is_valid_raw(raw) {
            Some(Self::ALL[raw as usize])
        } else {
            None
        }
    }

    #[inline]
    pub const fn is_valid_raw(raw: u8) -> bool {
        (raw as usize) < TRACK_END
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The single-bit set containing this track.
    #[inline]
    pub const fn bits(self) -> TrackBits {
        TrackBits::from_bits_retain(1 << self as u8)
    }

    /// The canonical trackdir for this track (the one pointing between N and SE).
    #[inline]
    pub const fn to_trackdir(self) -> Trackdir {
        Trackdir::ALL[self as usize]
    }

    #[inline]
    pub const fn is_diagonal(self) -> bool {
        matches!(self, Track::Diag1 | Track::Diag2)
    }
}

/// A track combined with a direction of travel along it.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Trackdir {
    Diag1Ne = 0,
    Diag2Se = 1,
    UpperE = 2,
    LowerE = 3,
    LeftS = 4,
    RightS = 5,
    // 6 and 7 are intentionally unused
    Diag1Sw = 8,
    Diag2Nw = 9,
    UpperW = 10,
    LowerW = 11,
    LeftN = 12,
    RightN = 13,
}

impl Trackdir {
    /// All valid trackdirs in ascending raw order.
    pub const ALL: [Trackdir; 12] = [
        Trackdir::Diag1Ne,
        Trackdir::Diag2Se,
        Trackdir::UpperE,
        Trackdir::LowerE,
        Trackdir::LeftS,
        Trackdir::RightS,
        Trackdir::Diag1Sw,
        Trackdir::Diag2Nw,
        Trackdir::UpperW,
        Trackdir::LowerW,
        Trackdir::LeftN,
        Trackdir::RightN,
    ];

    #[inline]
    pub const fn from_raw(raw: u8) -> Option<Trackdir> {
        if !Self::is_valid_raw(raw) {
            return None;
        }
        let dense = (raw & 7) + if raw & 8 != 0 { 6 } else { 0 };
        Some(Self::ALL[dense as usize])
    }

    #[inline]
    pub const fn is_valid_raw(raw: u8) -> bool {
        (raw as usize) < TRACKDIR_END && (raw & 7) < TRACK_END as u8
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The underlying track, obtained by masking off the direction bit.
    #[inline]
    pub const fn track(self) -> Track {
        Track::ALL[(self as u8 & 7) as usize]
    }

    #[inline]
    pub const fn bits(self) -> TrackdirBits {
        TrackdirBits::from_bits_retain(1 << self as u8)
    }

    #[inline]
    pub const fn is_diagonal(self) -> bool {
        self.track().is_diagonal()
    }
}

/// Four-way direction, i.e. the tile edge crossed when leaving a tile.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum DiagDirection {
    Ne = 0,
    Se = 1,
    Sw = 2,
    Nw = 3,
}

impl DiagDirection {
    pub const ALL: [DiagDirection; DIAGDIR_END] = [
        DiagDirection::Ne,
        DiagDirection::Se,
        DiagDirection::Sw,
        DiagDirection::Nw,
    ];

    #[inline]
    pub const fn from_raw(raw: u8) -> Option<DiagDirection> {
        if (raw as usize) < DIAGDIR_END {
            Some(Self::ALL[raw as usize])
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// The eight-way direction pointing the same way.
    #[inline]
    pub const fn to_direction(self) -> Direction {
        Direction::ALL[self as usize * 2 + 1]
    }

    /// Tile offset (dx, dy) of the neighbour across this edge.
    /// x grows towards SW, y grows towards SE.
    #[inline]
    pub const fn offset(self) -> (i32, i32) {
        match self {
            DiagDirection::Ne => (-1, 0),
            DiagDirection::Se => (0, 1),
            DiagDirection::Sw => (1, 0),
            DiagDirection::Nw => (0, -1),
        }
    }
}

/// Eight-way compass direction.
#[repr(u8)]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum Direction {
    N = 0,
    Ne = 1,
    E = 2,
    Se = 3,
    S = 4,
    Sw = 5,
    W = 6,
    Nw = 7,
}

impl Direction {
    pub const ALL: [Direction; DIR_END] = [
        Direction::N,
        Direction::Ne,
        Direction::E,
        Direction::Se,
        Direction::S,
        Direction::Sw,
        Direction::W,
        Direction::Nw,
    ];

    #[inline]
    pub const fn from_raw(raw: u8) -> Option<Direction> {
        if (raw as usize) < DIR_END {
            Some(Self::ALL[raw as usize])
        } else {
            None
        }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[inline]
    pub const fn reverse(self) -> Direction {
        Direction::ALL[(self as usize + 4) & 7]
    }

    /// NE, SE, SW and NW map onto a tile edge; the others run through corners.
    #[inline]
    pub const fn to_diagdir(self) -> Option<DiagDirection> {
        if self as u8 & 1 == 1 {
            Some(DiagDirection::ALL[(self as u8 >> 1) as usize])
        } else {
            None
        }
    }
}

bitflags! {
    /// Set of tracks present on (or reachable within) a tile.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TrackBits: u8 {
        const DIAG1 = 1 << 0;
        const DIAG2 = 1 << 1;
        const UPPER = 1 << 2;
        const LOWER = 1 << 3;
        const LEFT  = 1 << 4;
        const RIGHT = 1 << 5;

        const CROSS      = Self::DIAG1.bits() | Self::DIAG2.bits();
        const HORIZONTAL = Self::UPPER.bits() | Self::LOWER.bits();
        const VERTICAL   = Self::LEFT.bits() | Self::RIGHT.bits();
    }
}

/// Raw mask of all valid track bits.
pub const TRACK_BIT_MASK: u8 = 0x3F;

bitflags! {
    /// Set of trackdirs. Bit n is trackdir n, so bits 6, 7, 14 and 15 are never set.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TrackdirBits: u16 {
        const DIAG1_NE = 1 << 0;
        const DIAG2_SE = 1 << 1;
        const UPPER_E  = 1 << 2;
        const LOWER_E  = 1 << 3;
        const LEFT_S   = 1 << 4;
        const RIGHT_S  = 1 << 5;
        const DIAG1_SW = 1 << 8;
        const DIAG2_NW = 1 << 9;
        const UPPER_W  = 1 << 10;
        const LOWER_W  = 1 << 11;
        const LEFT_N   = 1 << 12;
        const RIGHT_N  = 1 << 13;
    }
}

/// Raw mask of all valid trackdir bits.
pub const TRACKDIR_BIT_MASK: u16 = 0x3F3F;
/// Raw sentinel for "no trackdir bits".
pub const INVALID_TRACKDIR_BIT: u16 = 0xFFFF;

impl TrackBits {
    /// Iterate the tracks in ascending order.
    pub fn tracks(self) -> impl Iterator<Item = Track> {
        let mut remaining = self.bits() & TRACK_BIT_MASK;
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let bit = remaining.trailing_zeros() as u8;
            remaining &= remaining - 1;
            Track::from_raw(bit)
        })
    }
}

impl TrackdirBits {
    /// Both travel directions of every track in `tracks`.
    #[inline]
    pub const fn from_track_bits(tracks: TrackBits) -> TrackdirBits {
        let raw = (tracks.bits() & TRACK_BIT_MASK) as u16;
        TrackdirBits::from_bits_retain(raw | (raw << 8))
    }

    /// The tracks that have at least one trackdir in this set.
    #[inline]
    pub const fn to_track_bits(self) -> TrackBits {
        let raw = self.bits();
        TrackBits::from_bits_retain(((raw | (raw >> 8)) as u8) & TRACK_BIT_MASK)
    }

    /// Iterate the trackdirs in ascending raw order.
    pub fn trackdirs(self) -> impl Iterator<Item = Trackdir> {
        let mut remaining = self.bits() & TRACKDIR_BIT_MASK;
        std::iter::from_fn(move || {
            while remaining != 0 {
                let bit = remaining.trailing_zeros() as u8;
                remaining &= remaining - 1;
                if let Some(td) = Trackdir::from_raw(bit) {
                    return Some(td);
                }
            }
            None
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trackdir_raw_gap() {
        assert!(Trackdir::from_raw(6).is_none());
        assert!(Trackdir::from_raw(7).is_none());
        assert!(Trackdir::from_raw(14).is_none());
        assert!(Trackdir::from_raw(INVALID_TRACKDIR).is_none());
        for td in Trackdir::ALL {
            assert_eq!(Trackdir::from_raw(td as u8), Some(td));
        }
    }

    #[test]
    fn test_track_from_trackdir_by_mask() {
        assert_eq!(Trackdir::Diag1Sw.track(), Track::Diag1);
        assert_eq!(Trackdir::RightN.track(), Track::Right);
        assert_eq!(Trackdir::LowerE.track(), Track::Lower);
        for track in Track::ALL {
            assert_eq!(track.to_trackdir() as u8, track as u8);
        }
    }

    #[test]
    fn test_trackdir_bits_layout() {
        assert_eq!(TrackdirBits::all().bits(), TRACKDIR_BIT_MASK);
        assert_eq!(TrackBits::all().bits(), TRACK_BIT_MASK);
        assert_eq!(Trackdir::LeftN.bits(), TrackdirBits::LEFT_N);
        assert_eq!(Track::Lower.bits(), TrackBits::LOWER);
    }

    #[test]
    fn test_track_bits_roundtrip_through_trackdir_bits() {
        let tracks = TrackBits::DIAG1 | TrackBits::RIGHT;
        let tds = TrackdirBits::from_track_bits(tracks);
        assert_eq!(
            tds,
            TrackdirBits::DIAG1_NE | TrackdirBits::DIAG1_SW | TrackdirBits::RIGHT_S | TrackdirBits::RIGHT_N
        );
        assert_eq!(tds.to_track_bits(), tracks);
        assert_eq!(
            tds.trackdirs().collect::<Vec<_>>(),
            vec![Trackdir::Diag1Ne, Trackdir::RightS, Trackdir::Diag1Sw, Trackdir::RightN]
        );
    }

    #[test]
    fn test_directions() {
        assert_eq!(DiagDirection::Se.to_direction(), Direction::Se);
        assert_eq!(Direction::Nw.to_diagdir(), Some(DiagDirection::Nw));
        assert_eq!(Direction::N.to_diagdir(), None);
        assert_eq!(Direction::E.reverse(), Direction::W);
        assert_eq!(DiagDirection::Ne.offset(), (-1, 0));
    }
}
