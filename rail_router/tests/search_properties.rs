//! Property tests: optimality against brute force, time-slicing invariance
//! and determinism.

use std::collections::BTreeMap;

use proptest::prelude::*;
use rail_router::{
    find_route, AyStar, AyStarCallbacks, AyStarNode, PathNodeRef, RailMap, RailType, RouteRequest, RouteTarget,
    RouterConfig, SearchSettings, SearchStatus, Tile, TrackBits, Trackdir,
};

/// Weighted digraph; node i is tile (i, 0).
struct Graph {
    edges: BTreeMap<(u32, u32), i32>,
    goal: u32,
}

fn graph_node(i: u32) -> AyStarNode {
    AyStarNode::new(Tile::new(i, 0), Trackdir::Diag2Se)
}

impl AyStarCallbacks for Graph {
    fn calculate_g(&mut self, node: &AyStarNode, parent: PathNodeRef<'_>) -> Option<i32> {
        self.edges.get(&(parent.tile().x, node.tile.x)).copied()
    }

    fn calculate_h(&mut self, _node: &AyStarNode, _parent: Option<PathNodeRef<'_>>) -> i32 {
        0
    }

    fn get_neighbours(&mut self, current: PathNodeRef<'_>, neighbours: &mut Vec<AyStarNode>) {
        let from = current.tile().x;
        neighbours.extend(self.edges.keys().filter(|&&(a, _)| a == from).map(|&(_, b)| graph_node(b)));
    }

    fn is_end_node(&mut self, current: PathNodeRef<'_>) -> bool {
        current.tile().x == self.goal
    }
}

fn bellman_ford(n: u32, edges: &BTreeMap<(u32, u32), i32>, goal: u32) -> Option<i32> {
    let mut dist: Vec<Option<i32>> = vec![None; n as usize];
    dist[0] = Some(0);
    for _ in 0..n {
        for (&(a, b), &w) in edges {
            if let Some(da) = dist[a as usize] {
                if dist[b as usize].map_or(true, |db| da + w < db) {
                    dist[b as usize] = Some(da + w);
                }
            }
        }
    }
    dist[goal as usize]
}

fn graph_strategy() -> impl Strategy<Value = (u32, BTreeMap<(u32, u32), i32>)> {
    (2u32..9).prop_flat_map(|n| {
        let edge = (0..n, 0..n, 0i32..20);
        (Just(n), prop::collection::vec(edge, 0..30)).prop_map(|(n, raw)| {
            let mut edges = BTreeMap::new();
            for (a, b, w) in raw {
                let entry = edges.entry((a, b)).or_insert(w);
                *entry = (*entry).min(w);
            }
            (n, edges)
        })
    })
}

/// Random 4x4 layout with Diag1 guaranteed on the start tile.
fn layout_strategy() -> impl Strategy<Value = (Vec<u8>, (u32, u32), (u32, u32))> {
    (prop::collection::vec(0u8..64, 16), (0u32..4, 0u32..4), (0u32..4, 0u32..4))
}

fn build_map(tracks: &[u8], start: (u32, u32)) -> RailMap {
    let mut map = RailMap::new(4, 4);
    for (i, &bits) in tracks.iter().enumerate() {
        let tile = Tile::new(i as u32 % 4, i as u32 / 4);
        let mut bits = TrackBits::from_bits_truncate(bits);
        if (tile.x, tile.y) == start {
            bits |= TrackBits::DIAG1;
        }
        map.set_tracks(tile, bits, RailType::Rail).unwrap();
    }
    map
}

fn request(start: (u32, u32), target: (u32, u32)) -> RouteRequest {
    RouteRequest::new(
        vec![AyStarNode::new(Tile::new(start.0, start.1), Trackdir::Diag1Ne)],
        RouteTarget::from_tiles([Tile::new(target.0, target.1)]),
    )
}

fn unlimited() -> RouterConfig {
    let mut config = RouterConfig::default();
    config.search.max_search_nodes = 0;
    config
}

proptest! {
    #[test]
    fn engine_matches_bellman_ford((n, edges) in graph_strategy()) {
        let goal = n - 1;
        let expected = bellman_ford(n, &edges, goal);
        let mut graph = Graph { edges, goal };
        let mut aystar = AyStar::new(SearchSettings { max_search_nodes: 0, ..Default::default() });
        aystar.add_start_node(&mut graph, graph_node(0), 0);
        let status = aystar.run_until_done(&mut graph);

        match expected {
            Some(cost) => {
                prop_assert_eq!(status, SearchStatus::Found);
                prop_assert_eq!(aystar.end_node().map(|n| n.g()), Some(cost));
                let path = aystar.path().unwrap();
                prop_assert_eq!(path.first(), Some(&graph_node(0)));
                prop_assert_eq!(path.last(), Some(&graph_node(goal)));
            }
            None => prop_assert_eq!(status, SearchStatus::Exhausted),
        }
    }

    #[test]
    fn astar_cost_matches_dijkstra((tracks, start, target) in layout_strategy()) {
        let map = build_map(&tracks, start);
        let request = request(start, target);

        let astar = find_route(&map, &request, &unlimited()).unwrap();
        let mut dijkstra_config = unlimited();
        dijkstra_config.costs.heuristic_weight = 0.0;
        let dijkstra = find_route(&map, &request, &dijkstra_config).unwrap();

        prop_assert_eq!(astar.status, dijkstra.status);
        prop_assert_eq!(astar.cost, dijkstra.cost);
    }

    #[test]
    fn time_slicing_does_not_change_result(
        (tracks, start, target) in layout_strategy(),
        loops_per_tick in 1u32..6,
    ) {
        let map = build_map(&tracks, start);
        let request = request(start, target);

        let whole = find_route(&map, &request, &unlimited()).unwrap();
        let mut sliced_config = unlimited();
        sliced_config.search.loops_per_tick = loops_per_tick;
        let sliced = find_route(&map, &request, &sliced_config).unwrap();

        prop_assert_eq!(whole.status, sliced.status);
        prop_assert_eq!(&whole.path, &sliced.path);
        prop_assert_eq!(whole.cost, sliced.cost);
        prop_assert_eq!(whole.stats.nodes_expanded, sliced.stats.nodes_expanded);
        prop_assert!(sliced.stats.batches >= whole.stats.batches);
    }

    #[test]
    fn repeated_searches_are_identical((tracks, start, target) in layout_strategy()) {
        let map = build_map(&tracks, start);
        let request = request(start, target);
        let first = find_route(&map, &request, &unlimited()).unwrap();
        let second = find_route(&map, &request, &unlimited()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn found_paths_are_connected((tracks, start, target) in layout_strategy()) {
        let map = build_map(&tracks, start);
        let result = find_route(&map, &request(start, target), &unlimited()).unwrap();
        if let Some(path) = result.path {
            prop_assert_eq!(path.last().map(|n| n.tile), Some(Tile::new(target.0, target.1)));
            for pair in path.windows(2) {
                let (from, to) = (pair[0], pair[1]);
                prop_assert!(map.has_track(to.tile, to.trackdir.track()));
                prop_assert!(to.trackdir.bits().intersects(from.trackdir.reaches()));
                prop_assert_eq!(map.neighbour_tile(from.tile, from.trackdir.exitdir()), Some(to.tile));
            }
        }
    }

    #[test]
    fn cost_ceiling_is_never_exceeded(
        (tracks, start, target) in layout_strategy(),
        ceiling in 1i32..800,
    ) {
        let map = build_map(&tracks, start);
        let request = request(start, target);
        let mut config = unlimited();
        config.search.max_path_cost = ceiling;
        let capped = find_route(&map, &request, &config).unwrap();
        let free = find_route(&map, &request, &unlimited()).unwrap();

        if let Some(cost) = capped.cost {
            prop_assert!(cost <= ceiling);
            prop_assert_eq!(Some(cost), free.cost);
        }
        if free.cost.is_some_and(|c| c <= ceiling) {
            prop_assert_eq!(capped.status, SearchStatus::Found);
        }
    }
}
