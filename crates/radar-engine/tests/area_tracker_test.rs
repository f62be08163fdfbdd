//! Area lifecycle integration tests: target resolution, clustering, entity
//! events and the exported API.

use radar_core::{GridCoord, RawTargetIndex, TargetTable, TileLabels};
use radar_engine::{
    AreaError, AreaSnapshot, AreaTracker, CancelSignal, EngineConfig, RadarApi, RouteError,
    RouteUpdate, SharedAgent,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::runtime::Handle;
use tokio::time::{sleep, timeout};

const TARGETS: &str = r#"{
    "*": [
        { "Name": "waypoint", "DisplayName": "Waypoint" }
    ],
    "Crypt*": [
        { "Name": "sarcophagus*", "DisplayName": "Sarcophagus", "ExpectedCount": 2, "TargetType": "Entity" },
        { "Name": "exit", "DisplayName": "Exit" }
    ]
}"#;

fn fast_config() -> EngineConfig {
    EngineConfig {
        poll_interval: Duration::from_millis(10),
        pause_check_interval: Duration::from_millis(10),
        ..EngineConfig::default()
    }
}

fn open_rows(width: usize, height: usize) -> Vec<Vec<u8>> {
    vec![vec![5; width]; height]
}

fn labels(entries: &[(&str, (i32, i32))]) -> RawTargetIndex {
    let mut index = RawTargetIndex::default();
    for (label, (x, y)) in entries {
        index.insert(label, GridCoord::new(*x, *y));
    }
    index
}

fn crypt() -> AreaSnapshot {
    AreaSnapshot {
        name: "CryptLower".into(),
        grid: open_rows(30, 20),
        labels: labels(&[("waypoint", (2, 2)), ("exit", (27, 17)), ("exit", (28, 17))]),
        tiles: Vec::new(),
        tile_columns: 0,
    }
}

fn tracker(config: EngineConfig) -> AreaTracker {
    let agent = Arc::new(SharedAgent::new(GridCoord::new(10, 10)));
    AreaTracker::new(
        config,
        agent,
        TargetTable::from_json(TARGETS).unwrap(),
        Handle::current(),
    )
}

async fn wait_until<F: Fn() -> bool>(what: &str, condition: F) {
    let result = timeout(Duration::from_secs(5), async {
        while !condition() {
            sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(result.is_ok(), "timed out waiting for {what}");
}

#[tokio::test]
async fn area_change_routes_to_every_present_target() {
    let tracker = tracker(fast_config());
    tracker.area_change(crypt()).unwrap();

    let locations = tracker.locations();
    assert_eq!(locations.len(), 2, "sarcophagus has no matches yet");
    assert_eq!(locations["waypoint"].locations, vec![GridCoord::new(2, 2)]);
    assert_eq!(locations["exit"].display_name, "Exit");
    assert_eq!(locations["exit"].locations.len(), 1);

    let manager = tracker.manager().clone();
    wait_until("two routes", || manager.table().len() == 2).await;
    assert_eq!(tracker.area_name().as_deref(), Some("CryptLower"));
}

#[tokio::test]
async fn disabled_pathfinding_only_clusters() {
    let tracker = tracker(EngineConfig {
        pathfinding_enabled: false,
        ..fast_config()
    });
    tracker.area_change(crypt()).unwrap();
    assert_eq!(tracker.locations().len(), 2);
    assert!(!tracker.manager().is_running());
    assert!(matches!(tracker.restart(), Err(RouteError::NotStarted)));
}

#[tokio::test]
async fn other_areas_only_see_wildcard_targets() {
    let tracker = tracker(fast_config());
    let mut town = crypt();
    town.name = "Town".into();
    tracker.area_change(town).unwrap();

    let locations = tracker.locations();
    assert_eq!(locations.keys().collect::<Vec<_>>(), vec!["waypoint"]);
}

#[tokio::test]
async fn entity_events_add_new_destinations_once() {
    let tracker = tracker(fast_config());
    tracker.area_change(crypt()).unwrap();
    let manager = tracker.manager().clone();
    wait_until("initial routes", || manager.table().len() == 2).await;

    let added = tracker.entity_added("sarcophagus_large", GridCoord::new(20, 3));
    assert_eq!(added, vec![GridCoord::new(20, 3)]);
    wait_until("entity route", || manager.table().contains(GridCoord::new(20, 3))).await;

    // Same entity reported again.
    assert!(tracker.entity_added("sarcophagus_large", GridCoord::new(20, 3)).is_empty());
    // Labels that no entity target tracks are ignored.
    assert!(tracker.entity_added("exit", GridCoord::new(5, 5)).is_empty());

    let added = tracker.entity_added("sarcophagus_small", GridCoord::new(4, 15));
    assert_eq!(added, vec![GridCoord::new(4, 15)]);
    assert_eq!(tracker.locations()["sarcophagus*"].locations.len(), 2);
}

#[tokio::test]
async fn entity_outside_grid_is_rejected() {
    let tracker = tracker(fast_config());
    tracker.area_change(crypt()).unwrap();
    assert!(tracker.entity_added("sarcophagus", GridCoord::new(300, 3)).is_empty());
    assert!(!tracker.locations().contains_key("sarcophagus*"));
}

#[tokio::test]
async fn malformed_grid_stops_routing() {
    let tracker = tracker(fast_config());
    tracker.area_change(crypt()).unwrap();
    assert!(tracker.manager().is_running());

    let broken = AreaSnapshot {
        name: "CryptBroken".into(),
        grid: vec![vec![5, 5], vec![5]],
        ..AreaSnapshot::default()
    };
    assert!(matches!(tracker.area_change(broken), Err(AreaError::Grid(_))));
    assert!(!tracker.manager().is_running());
    assert_eq!(tracker.area_name(), None);
}

#[tokio::test]
async fn reload_targets_reresolves_current_area() {
    let tracker = tracker(fast_config());
    tracker.area_change(crypt()).unwrap();
    let first_session = tracker.manager().session().unwrap().id;

    let mut areas = HashMap::new();
    areas.insert(
        "*".to_string(),
        serde_json::from_str(r#"[{ "Name": "exit", "DisplayName": "Way out" }]"#).unwrap(),
    );
    tracker.reload_targets(TargetTable::new(areas));

    let locations = tracker.locations();
    assert_eq!(locations.len(), 1);
    assert_eq!(locations["exit"].display_name, "Way out");
    assert_ne!(tracker.manager().session().unwrap().id, first_session);
    assert_eq!(tracker.manager().destinations(), locations["exit"].locations);
}

#[tokio::test]
async fn tile_labels_feed_the_index() {
    let tracker = tracker(EngineConfig {
        include_tile_paths: true,
        ..fast_config()
    });
    let snapshot = AreaSnapshot {
        name: "CryptTiles".into(),
        grid: open_rows(50, 50),
        labels: RawTargetIndex::default(),
        tiles: vec![
            TileLabels::default(),
            TileLabels {
                path: Some("waypoint".into()),
                detail_name: None,
            },
        ],
        tile_columns: 2,
    };
    tracker.area_change(snapshot).unwrap();
    assert_eq!(tracker.locations()["waypoint"].locations, vec![GridCoord::new(23, 0)]);
}

#[tokio::test]
async fn cluster_target_is_side_effect_free() {
    let tracker = tracker(fast_config());
    assert_eq!(tracker.cluster_target("exit", 1).unwrap(), None);

    tracker.area_change(crypt()).unwrap();
    let session = tracker.manager().session().unwrap().id;

    let exit = tracker.cluster_target("exit", 2).unwrap().unwrap();
    assert_eq!(exit.display_name, "Exit");
    assert_eq!(exit.locations.len(), 2);
    assert_eq!(tracker.cluster_target("nothing*", 3).unwrap(), None);
    assert_eq!(tracker.cluster_target("exit", 0).unwrap().unwrap().locations, vec![]);

    // Clustering neither restarts routing nor changes stored locations.
    assert_eq!(tracker.manager().session().unwrap().id, session);
    assert_eq!(tracker.locations()["exit"].locations.len(), 1);
}

#[tokio::test]
async fn request_route_through_the_api() {
    let tracker = tracker(fast_config());
    let api: &dyn RadarApi = &tracker;
    assert!(matches!(
        api.request_route(GridCoord::new(1, 1), Box::new(|_: RouteUpdate| {}), CancelSignal::new()),
        Err(RouteError::NotStarted)
    ));

    tracker.area_change(crypt()).unwrap();
    let updates: Arc<Mutex<Vec<RouteUpdate>>> = Arc::default();
    let sink = updates.clone();
    let cancel = CancelSignal::new();
    let handle = api
        .request_route(
            GridCoord::new(25, 5),
            Box::new(move |update: RouteUpdate| sink.lock().unwrap().push(update)),
            cancel.clone(),
        )
        .unwrap();
    wait_until("first update", || !updates.lock().unwrap().is_empty()).await;
    assert!(matches!(updates.lock().unwrap()[0], RouteUpdate::Path(_)));

    wait_until("table routes", || api.routes().len() == 2).await;
    tracker.stop();
    timeout(Duration::from_secs(2), handle).await.unwrap().unwrap();
    assert!(api.routes().is_empty());
}

#[tokio::test]
async fn bad_entity_report_does_not_poison_its_target() {
    let tracker = tracker(fast_config());
    tracker.area_change(crypt()).unwrap();
    let manager = tracker.manager().clone();

    assert!(tracker.entity_added("sarcophagus", GridCoord::new(300, 3)).is_empty());
    assert_eq!(
        tracker.entity_added("sarcophagus", GridCoord::new(5, 5)),
        vec![GridCoord::new(5, 5)]
    );
    wait_until("entity route", || manager.table().contains(GridCoord::new(5, 5))).await;

    let clustered = tracker.cluster_target("sarcophagus*", 2).unwrap().unwrap();
    assert_eq!(clustered.locations, vec![GridCoord::new(5, 5)]);
}

#[test]
fn tracker_is_driven_from_a_plain_thread() {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .unwrap();
    let agent = Arc::new(SharedAgent::new(GridCoord::new(10, 10)));
    let tracker = AreaTracker::new(
        fast_config(),
        agent,
        TargetTable::from_json(TARGETS).unwrap(),
        runtime.handle().clone(),
    );

    tracker.area_change(crypt()).unwrap();
    assert_eq!(
        tracker.entity_added("sarcophagus_large", GridCoord::new(20, 3)),
        vec![GridCoord::new(20, 3)]
    );
    let manager = tracker.manager().clone();
    runtime.block_on(wait_until("three routes", || manager.table().len() == 3));
    tracker.stop();
}
