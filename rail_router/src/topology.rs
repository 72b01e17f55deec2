//! Static adjacency tables describing how trackdirs connect.
//!
//! Every table is indexed by the raw value of its argument. Trackdir tables
//! keep filler entries at 6 and 7 so the raw value can be used directly; those
//! slots are unreachable through the typed API.

use crate::track::{
    DiagDirection, Direction, Track, TrackBits, Trackdir, TrackdirBits, DIAGDIR_END, DIR_END,
    TRACKDIR_END, TRACK_END,
};

use Trackdir::*;

/// Straight-ahead continuation of each trackdir on the next tile.
static NEXT_TRACKDIR: [Trackdir; TRACKDIR_END] = [
    Diag1Ne, Diag2Se, LowerE, UpperE, RightS, LeftS,
    Diag1Ne, Diag1Ne, // unused
    Diag1Sw, Diag2Nw, LowerW, UpperW, RightN, LeftN,
];

/// Tracks making a 90 degree crossing with each track.
static TRACK_CROSSES_TRACKS: [TrackBits; TRACK_END] = [
    TrackBits::DIAG2,
    TrackBits::DIAG1,
    TrackBits::VERTICAL,
    TrackBits::VERTICAL,
    TrackBits::HORIZONTAL,
    TrackBits::HORIZONTAL,
];

/// Tile edge crossed when leaving the tile along each trackdir.
static TRACKDIR_TO_EXITDIR: [DiagDirection; TRACKDIR_END] = [
    DiagDirection::Ne, DiagDirection::Se, DiagDirection::Ne,
    DiagDirection::Se, DiagDirection::Sw, DiagDirection::Se,
    DiagDirection::Ne, DiagDirection::Ne, // unused
    DiagDirection::Sw, DiagDirection::Nw, DiagDirection::Nw,
    DiagDirection::Sw, DiagDirection::Nw, DiagDirection::Ne,
];

static TRACK_EXITDIR_TO_TRACKDIR: [[Option<Trackdir>; DIAGDIR_END]; TRACK_END] = [
    //  NE            SE             SW             NW
    [Some(Diag1Ne), None,          Some(Diag1Sw), None],
    [None,          Some(Diag2Se), None,          Some(Diag2Nw)],
    [Some(UpperE),  None,          None,          Some(UpperW)],
    [None,          Some(LowerE),  Some(LowerW),  None],
    [None,          None,          Some(LeftS),   Some(LeftN)],
    [Some(RightN),  Some(RightS),  None,          None],
];

static TRACK_DIRECTION_TO_TRACKDIR: [[Option<Trackdir>; DIR_END]; TRACK_END] = [
    //  N            NE             E             SE             S            SW             W             NW
    [None,         Some(Diag1Ne), None,         None,          None,        Some(Diag1Sw), None,         None],
    [None,         None,          None,         Some(Diag2Se), None,        None,          None,         Some(Diag2Nw)],
    [None,         None,          Some(UpperE), None,          None,        None,          Some(UpperW), None],
    [None,         None,          Some(LowerE), None,          None,        None,          Some(LowerW), None],
    [Some(LeftN),  None,          None,         None,          Some(LeftS), None,          None,         None],
    [Some(RightN), None,          None,         None,          Some(RightS), None,         None,         None],
];

static DIAGDIR_TO_DIAG_TRACKDIR: [Trackdir; DIAGDIR_END] = [Diag1Ne, Diag2Se, Diag1Sw, Diag2Nw];

/// Trackdirs that can be entered on the next tile after leaving through an edge.
static EXITDIR_REACHES_TRACKDIRS: [TrackdirBits; DIAGDIR_END] = [
    TrackdirBits::DIAG1_NE.union(TrackdirBits::LOWER_E).union(TrackdirBits::LEFT_N),
    TrackdirBits::DIAG2_SE.union(TrackdirBits::LEFT_S).union(TrackdirBits::UPPER_E),
    TrackdirBits::DIAG1_SW.union(TrackdirBits::UPPER_W).union(TrackdirBits::RIGHT_S),
    TrackdirBits::DIAG2_NW.union(TrackdirBits::RIGHT_N).union(TrackdirBits::LOWER_W),
];

static TRACKDIR_CROSSES_TRACKDIRS: [TrackdirBits; TRACKDIR_END] = {
    let diag1 = TrackdirBits::DIAG1_NE.union(TrackdirBits::DIAG1_SW);
    let diag2 = TrackdirBits::DIAG2_SE.union(TrackdirBits::DIAG2_NW);
    let horizontal = TrackdirBits::UPPER_E
        .union(TrackdirBits::UPPER_W)
        .union(TrackdirBits::LOWER_E)
        .union(TrackdirBits::LOWER_W);
    let vertical = TrackdirBits::LEFT_S
        .union(TrackdirBits::LEFT_N)
        .union(TrackdirBits::RIGHT_S)
        .union(TrackdirBits::RIGHT_N);
    [
        diag2, diag1, vertical, vertical, horizontal, horizontal,
        TrackdirBits::empty(), TrackdirBits::empty(), // unused
        diag2, diag1, vertical, vertical, horizontal, horizontal,
    ]
};

static REVERSE_DIAGDIR: [DiagDirection; DIAGDIR_END] = [
    DiagDirection::Sw,
    DiagDirection::Nw,
    DiagDirection::Ne,
    DiagDirection::Se,
];

static REVERSE_TRACKDIR: [Trackdir; TRACKDIR_END] = [
    Diag1Sw, Diag2Nw, UpperW, LowerW, LeftN, RightN,
    Diag1Ne, Diag1Ne, // unused
    Diag1Ne, Diag2Se, UpperE, LowerE, LeftS, RightS,
];

/// The trackdir you end up on when going straight ahead. Diagonal trackdirs
/// map to themselves, straight ones alternate between their two halves.
#[inline]
pub fn next_trackdir(trackdir: Trackdir) -> Trackdir {
    NEXT_TRACKDIR[trackdir.index()]
}

/// All tracks that make a 90 degree crossing with `track`.
#[inline]
pub fn track_crosses_tracks(track: Track) -> TrackBits {
    TRACK_CROSSES_TRACKS[track.index()]
}

/// The edge through which a tile is left when following `trackdir`.
#[inline]
pub fn trackdir_to_exitdir(trackdir: Trackdir) -> DiagDirection {
    TRACKDIR_TO_EXITDIR[trackdir.index()]
}

/// The trackdir of `track` that exits through `diagdir`, if the track touches that edge.
#[inline]
pub fn track_exitdir_to_trackdir(track: Track, diagdir: DiagDirection) -> Option<Trackdir> {
    TRACK_EXITDIR_TO_TRACKDIR[track.index()][diagdir.index()]
}

/// The trackdir of `track` running in the eight-way direction `dir`.
#[inline]
pub fn track_direction_to_trackdir(track: Track, dir: Direction) -> Option<Trackdir> {
    TRACK_DIRECTION_TO_TRACKDIR[track.index()][dir.index()]
}

/// The diagonal trackdir running towards `diagdir`.
#[inline]
pub fn diagdir_to_diag_trackdir(diagdir: DiagDirection) -> Trackdir {
    DIAGDIR_TO_DIAG_TRACKDIR[diagdir.index()]
}

/// Trackdirs on the next tile reachable after leaving through `diagdir`.
#[inline]
pub fn exitdir_reaches_trackdirs(diagdir: DiagDirection) -> TrackdirBits {
    EXITDIR_REACHES_TRACKDIRS[diagdir.index()]
}

/// Trackdirs reachable on the next tile when following `trackdir` off this one.
/// There is no direct table; it goes through the exit direction.
#[inline]
pub fn trackdir_reaches_trackdirs(trackdir: Trackdir) -> TrackdirBits {
    exitdir_reaches_trackdirs(trackdir_to_exitdir(trackdir))
}

/// All trackdirs that make a 90 degree crossing with `trackdir`.
#[inline]
pub fn trackdir_crosses_trackdirs(trackdir: Trackdir) -> TrackdirBits {
    TRACKDIR_CROSSES_TRACKDIRS[trackdir.index()]
}

#[inline]
pub fn reverse_diagdir(diagdir: DiagDirection) -> DiagDirection {
    REVERSE_DIAGDIR[diagdir.index()]
}

#[inline]
pub fn reverse_trackdir(trackdir: Trackdir) -> Trackdir {
    REVERSE_TRACKDIR[trackdir.index()]
}

/// Raw-value variant of [`reverse_trackdir`] for callers holding packed data.
#[inline]
pub fn reverse_trackdir_raw(raw: u8) -> u8 {
    debug_assert!(Trackdir::is_valid_raw(raw), "invalid trackdir {raw}");
    raw ^ 8
}

impl Trackdir {
    #[inline]
    pub fn reverse(self) -> Trackdir {
        reverse_trackdir(self)
    }

    #[inline]
    pub fn next(self) -> Trackdir {
        next_trackdir(self)
    }

    #[inline]
    pub fn exitdir(self) -> DiagDirection {
        trackdir_to_exitdir(self)
    }

    #[inline]
    pub fn reaches(self) -> TrackdirBits {
        trackdir_reaches_trackdirs(self)
    }
}

impl DiagDirection {
    #[inline]
    pub fn reverse(self) -> DiagDirection {
        reverse_diagdir(self)
    }
}
