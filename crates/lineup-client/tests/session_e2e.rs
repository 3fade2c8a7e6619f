// End-to-end tests for the lineup client.
//
// A throwaway HTTP server stands in for the LineupLogic API. The session runs
// its real event loop against the real HTTP gateway, and the tests observe it
// through the UI channel the console would normally consume.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use lineup_client::config::SessionDefaults;
use lineup_client::gateway::{HttpGateway, QueryGateway};
use lineup_client::protocol::{ApiStatus, SessionSnapshot, UiUpdate, UserCommand};
use lineup_client::recommendations::RecommendationPanel;
use lineup_client::render::{ConsoleSink, RenderSink, EMPTY_RECOMMENDATIONS};
use lineup_client::roster::RosterPanel;
use lineup_client::session::{self, Session};

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

// ===========================================================================
// Test helpers
// ===========================================================================

type Route = dyn Fn(&str) -> (u16, String) + Send + Sync;

/// Serve HTTP/1.1 on a throwaway port until the test ends. Each request
/// target is passed to `route`; every request line is recorded.
async fn spawn_api(route: Arc<Route>) -> (String, Arc<Mutex<Vec<String>>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let log = Arc::new(Mutex::new(Vec::new()));
    let requests = log.clone();

    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let route = route.clone();
            let requests = requests.clone();
            tokio::spawn(async move {
                let mut buf = vec![0u8; 8192];
                let n = socket.read(&mut buf).await.unwrap_or(0);
                let request = String::from_utf8_lossy(&buf[..n]).to_string();
                let line = request.lines().next().unwrap_or_default().to_string();
                let target = line.split_whitespace().nth(1).unwrap_or("/").to_string();
                requests.lock().unwrap().push(line);

                let (status, body) = route(&target);
                let response = format!(
                    "HTTP/1.1 {status} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.flush().await;
            });
        }
    });

    (format!("http://{addr}"), log)
}

/// The league used by every scenario: one team with two rostered players.
fn league_route(target: &str) -> (u16, String) {
    let path = target.split('?').next().unwrap_or_default();
    match path {
        "/health" => (200, r#"{"ok":true}"#.to_string()),
        "/league/nba/teams" => (
            200,
            r#"{"team_count":1,"days_window":7,"teams":[{"team_id":1,"team_name":"Alpha","wins":4,"losses":1}]}"#
                .to_string(),
        ),
        "/league/nba/roster" => (
            200,
            r#"{"team":"Alpha","days_window":7,"roster":[
                {"playerId":10,"name":"Ten","position":"PG","proTeam":"BOS","games_next_n_days":3},
                {"playerId":11,"name":"Eleven","position":"C"}
            ]}"#
                .to_string(),
        ),
        "/league/nba/recommendations/waivers" if target.contains("drop_player_id=10") => (
            200,
            r#"{"team":"Alpha","days_window":7,"drop_player_id":10,"drop_candidates_used":[{"playerId":10}],"recommendations":[]}"#
                .to_string(),
        ),
        "/league/nba/recommendations/waivers" if target.contains("drop_player_id=11") => (
            404,
            r#"{"detail":"drop_player_id not found on roster"}"#.to_string(),
        ),
        "/league/nba/recommendations/waivers" => (
            200,
            r#"{"team":"Alpha","days_window":7,"recommendations":[
                {"add":{"playerId":40,"name":"Forty"},"drop":{"playerId":11,"name":"Eleven"},"expected_gain_next_n_days":12.5}
            ]}"#
                .to_string(),
        ),
        _ => (404, r#"{"detail":"Not Found"}"#.to_string()),
    }
}

struct Running {
    cmd_tx: mpsc::Sender<UserCommand>,
    ui_rx: mpsc::Receiver<UiUpdate>,
    handle: JoinHandle<anyhow::Result<()>>,
}

fn start(base_url: String) -> Running {
    let gateway: Arc<dyn QueryGateway> =
        Arc::new(HttpGateway::new(base_url, Duration::from_secs(5)).unwrap());
    let (cmd_tx, cmd_rx) = mpsc::channel(16);
    let (outcome_tx, outcome_rx) = mpsc::channel(16);
    let (ui_tx, ui_rx) = mpsc::channel(256);
    let session = Session::new(&SessionDefaults::default(), gateway, outcome_tx);
    let handle = tokio::spawn(session::run(cmd_rx, outcome_rx, ui_tx, session));
    Running {
        cmd_tx,
        ui_rx,
        handle,
    }
}

/// Wait for the first snapshot matching `pred`.
async fn wait_for(
    ui_rx: &mut mpsc::Receiver<UiUpdate>,
    pred: impl Fn(&SessionSnapshot) -> bool,
) -> SessionSnapshot {
    tokio::time::timeout(Duration::from_secs(10), async {
        loop {
            match ui_rx.recv().await {
                Some(UiUpdate::Snapshot(s)) if pred(&s) => return *s,
                Some(_) => continue,
                None => panic!("session closed the UI channel"),
            }
        }
    })
    .await
    .expect("timed out waiting for snapshot")
}

fn idle_with_recommendations(s: &SessionSnapshot) -> bool {
    s.in_flight == 0
        && matches!(
            s.recommendations,
            RecommendationPanel::Ready(_) | RecommendationPanel::Empty(_) | RecommendationPanel::Failed(_)
        )
}

async fn quit(running: Running) {
    running.cmd_tx.send(UserCommand::Quit).await.unwrap();
    running.handle.await.unwrap().unwrap();
}

// ===========================================================================
// Scenarios
// ===========================================================================

#[tokio::test]
async fn drop_filter_scenario_ends_in_empty_state() {
    let (base, requests) = spawn_api(Arc::new(league_route)).await;
    let mut running = start(base);

    // Initial load: teams -> roster -> unfiltered recommendations.
    let initial = wait_for(&mut running.ui_rx, idle_with_recommendations).await;
    assert_eq!(initial.api_status, ApiStatus::Online);
    assert_eq!(initial.params.team_id, Some(1));
    match &initial.roster {
        RosterPanel::Ready(r) => assert!(r.contains(10)),
        other => panic!("expected roster, got {other:?}"),
    }
    match &initial.recommendations {
        RecommendationPanel::Ready(set) => {
            assert_eq!(set.drop_filter, None);
            assert_eq!(set.recommendations[0].expected_gain_in_window, Some(12.5));
        }
        other => panic!("expected recommendations, got {other:?}"),
    }

    // Pick player 10 as the drop candidate.
    running
        .cmd_tx
        .send(UserCommand::SelectDrop { player_id: 10 })
        .await
        .unwrap();
    let filtered = wait_for(&mut running.ui_rx, |s| {
        idle_with_recommendations(s) && s.selection.selected_drop_id == Some(10)
    })
    .await;

    let set = match &filtered.recommendations {
        RecommendationPanel::Empty(set) => set.clone(),
        other => panic!("expected empty result, got {other:?}"),
    };
    assert_eq!(set.drop_filter, Some(10));
    assert_eq!(set.drop_candidates_used.len(), 1);

    let mut buf = Vec::new();
    ConsoleSink::new(&mut buf)
        .render(&UiUpdate::Snapshot(Box::new(filtered)))
        .unwrap();
    let text = String::from_utf8(buf).unwrap();
    assert!(text.contains(EMPTY_RECOMMENDATIONS), "{text}");
    assert!(text.contains("Drop filter: Ten (#10)"));

    let log = requests.lock().unwrap().clone();
    let recs: Vec<_> = log
        .iter()
        .filter(|l| l.contains("/recommendations/waivers"))
        .collect();
    assert_eq!(recs.len(), 2, "{log:?}");
    assert!(recs[1].contains(
        "team_id=1&days=7&pool_size=300&limit=10&drop_player_id=10"
    ));
    // Selecting a drop candidate does not refetch the roster.
    assert_eq!(log.iter().filter(|l| l.contains("/roster")).count(), 1);

    quit(running).await;
}

#[tokio::test]
async fn server_rejection_is_shown_verbatim() {
    let (base, _requests) = spawn_api(Arc::new(league_route)).await;
    let mut running = start(base);
    wait_for(&mut running.ui_rx, idle_with_recommendations).await;

    running
        .cmd_tx
        .send(UserCommand::SelectDrop { player_id: 11 })
        .await
        .unwrap();
    let failed = wait_for(&mut running.ui_rx, |s| {
        idle_with_recommendations(s) && s.selection.selected_drop_id == Some(11)
    })
    .await;

    assert_eq!(
        failed.recommendations,
        RecommendationPanel::Failed(
            r#"HTTP 404: {"detail":"drop_player_id not found on roster"}"#.to_string()
        )
    );
    assert!(matches!(failed.roster, RosterPanel::Ready(_)));
    assert_eq!(failed.api_status, ApiStatus::Online);

    quit(running).await;
}

#[tokio::test]
async fn unreachable_api_is_reported_and_reconnect_retries() {
    // Grab a free port, then close it so nothing is listening.
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let mut running = start(format!("http://{addr}"));
    let down = wait_for(&mut running.ui_rx, |s| {
        s.in_flight == 0 && s.api_status == ApiStatus::Unreachable
    })
    .await;
    assert_eq!(down.params.team_id, None);

    // Nothing is listening yet, so a retry lands in the same state.
    running.cmd_tx.send(UserCommand::Reconnect).await.unwrap();
    wait_for(&mut running.ui_rx, |s| s.api_status == ApiStatus::Checking).await;
    wait_for(&mut running.ui_rx, |s| {
        s.in_flight == 0 && s.api_status == ApiStatus::Unreachable
    })
    .await;

    quit(running).await;
}
