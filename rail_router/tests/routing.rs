//! End-to-end routing scenarios on small hand-built maps.

use rail_router::{
    find_route, AyStarNode, CostSettings, DiagDirection, RailMap, RailType, RouteRequest, RouteSearch,
    RouteTarget, RouterConfig, SearchSettings, SearchStatus, SignalPolicy, SignalState, Tile, Track, Trackdir,
};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn node(x: u32, y: u32, td: Trackdir) -> AyStarNode {
    AyStarNode::new(Tile::new(x, y), td)
}

/// Diag1 track on tiles (1, 0) ..= (len, 0)
fn corridor(len: u32) -> RailMap {
    let mut map = RailMap::new(len + 2, 2);
    for x in 1..=len {
        map.set_track(Tile::new(x, 0), Track::Diag1, RailType::Rail).unwrap();
    }
    map
}

fn unit_config() -> RouterConfig {
    RouterConfig {
        search: SearchSettings::default(),
        costs: CostSettings { tile_length: 1, straight_length: 1, curve_penalty: 0, ..Default::default() },
    }
}

/// From the far end of a 4-tile corridor towards (1, 0)
fn corridor_request() -> RouteRequest {
    RouteRequest::new(vec![node(4, 0, Trackdir::Diag1Ne)], RouteTarget::from_tiles([Tile::new(1, 0)]))
}

#[test]
fn straight_corridor_is_found() {
    init_logging();
    let map = corridor(4);
    let result = find_route(&map, &corridor_request(), &unit_config()).unwrap();
    assert_eq!(result.status, SearchStatus::Found);
    assert_eq!(result.cost, Some(3));
    assert_eq!(
        result.path.unwrap(),
        vec![
            node(4, 0, Trackdir::Diag1Ne),
            node(3, 0, Trackdir::Diag1Ne),
            node(2, 0, Trackdir::Diag1Ne),
            node(1, 0, Trackdir::Diag1Ne),
        ]
    );
    assert_eq!(result.stats.nodes_expanded, 3);
    assert_eq!(result.stats.path_length, 4);
    assert_eq!(result.stats.initial_h, 3);
}

#[test]
fn missing_segment_exhausts() {
    let mut map = corridor(4);
    map.remove_track(Tile::new(2, 0), Track::Diag1).unwrap();
    let result = find_route(&map, &corridor_request(), &unit_config()).unwrap();
    assert_eq!(result.status, SearchStatus::Exhausted);
    assert_eq!(result.path, None);
    assert_eq!(result.cost, None);
}

#[test]
fn opposing_one_way_signal_blocks() {
    let mut map = corridor(4);
    map.set_signal(Tile::new(2, 0), Trackdir::Diag1Sw, SignalState::Green).unwrap();
    let result = find_route(&map, &corridor_request(), &unit_config()).unwrap();
    assert_eq!(result.status, SearchStatus::Exhausted);
    assert_eq!(result.stats.invalid_edges, 1);
}

#[test]
fn red_signal_penalized_or_forbidden() {
    let mut map = corridor(4);
    map.set_signal(Tile::new(2, 0), Trackdir::Diag1Ne, SignalState::Red).unwrap();
    let mut config = unit_config();

    let result = find_route(&map, &corridor_request(), &config).unwrap();
    assert_eq!(result.status, SearchStatus::Found);
    assert_eq!(result.cost, Some(3 + config.costs.red_signal_penalty));

    config.costs.signal_policy = SignalPolicy::Forbid;
    let result = find_route(&map, &corridor_request(), &config).unwrap();
    assert_eq!(result.status, SearchStatus::Exhausted);
}

#[test]
fn curve_costs_straight_length_plus_penalty() {
    // (2, 0) Diag1 heading NE, then the Lower piece on (1, 0) bends towards SE
    let mut map = RailMap::new(4, 4);
    map.set_track(Tile::new(2, 0), Track::Diag1, RailType::Rail).unwrap();
    map.set_track(Tile::new(1, 0), Track::Lower, RailType::Rail).unwrap();
    map.set_track(Tile::new(1, 1), Track::Diag2, RailType::Rail).unwrap();
    let config = RouterConfig::default();
    let request = RouteRequest::new(vec![node(2, 0, Trackdir::Diag1Ne)], RouteTarget::from_tiles([Tile::new(1, 1)]));
    let result = find_route(&map, &request, &config).unwrap();
    assert_eq!(result.status, SearchStatus::Found);
    let path = result.path.unwrap();
    assert_eq!(path, vec![node(2, 0, Trackdir::Diag1Ne), node(1, 0, Trackdir::LowerE), node(1, 1, Trackdir::Diag2Se)]);
    let costs = &config.costs;
    // curve onto LowerE, then LowerE -> Diag2Se is a curve again
    assert_eq!(
        result.cost,
        Some(costs.straight_length + costs.curve_penalty + costs.tile_length + costs.curve_penalty)
    );
}

#[test]
fn depot_turnaround() {
    let mut map = RailMap::new(8, 4);
    map.set_depot(Tile::new(2, 2), DiagDirection::Sw, RailType::Rail).unwrap();
    for x in 3..=5 {
        map.set_track(Tile::new(x, 2), Track::Diag1, RailType::Rail).unwrap();
    }
    let config = RouterConfig::default();
    let request = RouteRequest::new(vec![node(3, 2, Trackdir::Diag1Ne)], RouteTarget::from_tiles([Tile::new(5, 2)]));
    let result = find_route(&map, &request, &config).unwrap();
    assert_eq!(result.status, SearchStatus::Found);
    assert_eq!(
        result.path.unwrap(),
        vec![
            node(3, 2, Trackdir::Diag1Ne),
            node(2, 2, Trackdir::Diag1Ne),
            node(2, 2, Trackdir::Diag1Sw),
            node(3, 2, Trackdir::Diag1Sw),
            node(4, 2, Trackdir::Diag1Sw),
            node(5, 2, Trackdir::Diag1Sw),
        ]
    );
    assert_eq!(result.cost, Some(4 * config.costs.tile_length + config.costs.depot_reverse_penalty));
}

#[test]
fn ignore_start_as_goal_forces_a_real_route() {
    let mut map = RailMap::new(4, 2);
    map.set_depot(Tile::new(0, 0), DiagDirection::Sw, RailType::Rail).unwrap();
    map.set_track(Tile::new(1, 0), Track::Diag1, RailType::Rail).unwrap();
    let config = RouterConfig::default();
    let mut request = RouteRequest::new(vec![node(1, 0, Trackdir::Diag1Ne)], RouteTarget::from_tiles([Tile::new(1, 0)]));

    let result = find_route(&map, &request, &config).unwrap();
    assert_eq!(result.status, SearchStatus::Found);
    assert_eq!(result.cost, Some(0));
    assert_eq!(result.path.unwrap().len(), 1);

    request.ignore_start_as_goal = true;
    let result = find_route(&map, &request, &config).unwrap();
    assert_eq!(result.status, SearchStatus::Found);
    assert_eq!(result.path.unwrap().last(), Some(&node(1, 0, Trackdir::Diag1Sw)));
    assert_eq!(result.cost, Some(2 * config.costs.tile_length + config.costs.depot_reverse_penalty));
}

#[test]
fn exact_node_target() {
    let map = corridor(4);
    // only the SW-bound direction on (1, 0) counts, which is never reached
    let request = RouteRequest::new(
        vec![node(4, 0, Trackdir::Diag1Ne)],
        RouteTarget::from_nodes([node(1, 0, Trackdir::Diag1Sw)]),
    );
    let result = find_route(&map, &request, &unit_config()).unwrap();
    assert_eq!(result.status, SearchStatus::Exhausted);

    let request = RouteRequest::new(
        vec![node(4, 0, Trackdir::Diag1Ne)],
        RouteTarget::from_nodes([node(2, 0, Trackdir::Diag1Ne)]),
    );
    let result = find_route(&map, &request, &unit_config()).unwrap();
    assert_eq!(result.cost, Some(2));
}

#[test]
fn node_limit_stops_search() {
    let map = corridor(30);
    let mut config = unit_config();
    config.search.max_search_nodes = 5;
    let request = RouteRequest::new(vec![node(30, 0, Trackdir::Diag1Ne)], RouteTarget::from_tiles([Tile::new(1, 0)]));
    let result = find_route(&map, &request, &config).unwrap();
    assert_eq!(result.status, SearchStatus::NodeLimit);
    assert_eq!(result.stats.nodes_expanded, 5);
    assert_eq!(result.path, None);
}

#[test]
fn cost_ceiling_reports_cost_limit() {
    let map = corridor(4);
    let mut config = unit_config();
    config.search.max_path_cost = 2;
    let result = find_route(&map, &corridor_request(), &config).unwrap();
    assert_eq!(result.status, SearchStatus::CostLimit);
    assert_eq!(result.stats.cost_limit_discards, 1);

    config.search.max_path_cost = 3;
    let result = find_route(&map, &corridor_request(), &config).unwrap();
    assert_eq!(result.status, SearchStatus::Found);
}

#[test]
fn stepping_one_iteration_per_batch() {
    let map = corridor(4);
    let mut config = unit_config();
    config.search.loops_per_tick = 1;
    let mut search = RouteSearch::new(&config);
    search.init(&map, &corridor_request()).unwrap();
    assert_eq!(search.status(), SearchStatus::Running);

    // three expansions, then the goal pop
    for _ in 0..3 {
        assert_eq!(search.step(&map), SearchStatus::Running);
        assert!(search.path().is_none());
    }
    assert_eq!(search.step(&map), SearchStatus::Found);
    assert!(search.is_done());
    assert_eq!(search.path().map(|p| p.len()), Some(4));
    assert_eq!(search.stats().batches, 4);

    // terminal status sticks
    assert_eq!(search.step(&map), SearchStatus::Found);
    assert_eq!(search.stats().batches, 4);

    // re-init starts from scratch
    search.init(&map, &corridor_request()).unwrap();
    assert_eq!(search.status(), SearchStatus::Running);
    assert!(search.path().is_none());
    assert_eq!(search.run(&map), SearchStatus::Found);
}

#[test]
fn config_from_yaml_drives_costs() {
    let yaml = "search:\n  max_search_nodes: 0\ncosts:\n  tile_length: 10\n  straight_length: 7\n";
    let config = RouterConfig::from_yaml_str(yaml).unwrap();
    let map = corridor(4);
    let result = find_route(&map, &corridor_request(), &config).unwrap();
    assert_eq!(result.cost, Some(30));
}

#[test]
fn oversized_heuristic_weight_still_finds_route() {
    let yaml = "costs:\n  tile_length: 1\n  straight_length: 1\n  curve_penalty: 0\n  heuristic_weight: 1.0e10\n";
    let config = RouterConfig::from_yaml_str(yaml).unwrap();
    let result = find_route(&corridor(4), &corridor_request(), &config).unwrap();
    assert_eq!(result.status, SearchStatus::Found);
    assert_eq!(result.cost, Some(3));
    assert_eq!(result.stats.initial_h, i32::MAX);
}

#[test]
fn distant_tiles_on_a_huge_map_stay_distinct() {
    // two corridors 2^28 tiles apart must not share search records
    let far = 1u32 << 28;
    let mut map = RailMap::new(far + 8, 2);
    for x in 1..=4 {
        map.set_track(Tile::new(x, 0), Track::Diag1, RailType::Rail).unwrap();
        map.set_track(Tile::new(far + x, 0), Track::Diag1, RailType::Rail).unwrap();
    }
    let request = RouteRequest::new(
        vec![node(4, 0, Trackdir::Diag1Ne), node(far + 4, 0, Trackdir::Diag1Ne)],
        RouteTarget::from_tiles([Tile::new(1, 0)]),
    );
    let result = find_route(&map, &request, &unit_config()).unwrap();
    assert_eq!(result.status, SearchStatus::Found);
    assert_eq!(result.cost, Some(3));
    assert_eq!(result.path.unwrap().first(), Some(&node(4, 0, Trackdir::Diag1Ne)));
}

#[test]
fn invalid_request_is_rejected_up_front() {
    let map = corridor(4);
    let request = RouteRequest::new(vec![node(4, 1, Trackdir::Diag1Ne)], RouteTarget::from_tiles([Tile::new(1, 0)]));
    assert!(find_route(&map, &request, &unit_config()).is_err());
}
