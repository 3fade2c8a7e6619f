// Rendering sink and console front end.
//
// The session task pushes `UiUpdate`s; a `RenderSink` turns them into
// output. `ConsoleSink` writes plain text to any `io::Write`. `run` is the
// console event loop: it renders updates as they arrive and forwards parsed
// input lines to the session as commands.

use std::fmt::Display;
use std::io::{self, Write};

use anyhow::Context;
use chrono::{DateTime, Local, TimeZone};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::input::{self, HELP};
use crate::model::{Player, Recommendation, RecommendationSet, RosterSnapshot, SelectionState, Team};
use crate::params::ParameterSnapshot;
use crate::protocol::{ApiStatus, SessionSnapshot, TeamsPanel, UiUpdate, UserCommand};
use crate::recommendations::RecommendationPanel;
use crate::roster::RosterPanel;

pub const EMPTY_RECOMMENDATIONS: &str = "No positive-gain recommendations for this window.";

const UNKNOWN: &str = "unknown";
const MISSING: &str = "-";

/// Presents session updates to the user.
pub trait RenderSink {
    fn render(&mut self, update: &UiUpdate) -> io::Result<()>;
}

/// Plain-text sink. Every snapshot is printed in full.
pub struct ConsoleSink<W: Write> {
    out: W,
}

impl<W: Write> ConsoleSink<W> {
    pub fn new(out: W) -> Self {
        ConsoleSink { out }
    }
}

impl<W: Write> RenderSink for ConsoleSink<W> {
    fn render(&mut self, update: &UiUpdate) -> io::Result<()> {
        match update {
            UiUpdate::Snapshot(snapshot) => {
                let text = format_snapshot(snapshot);
                self.out.write_all(text.as_bytes())?;
            }
            UiUpdate::Notice(text) => writeln!(self.out, "! {text}")?,
        }
        self.out.flush()
    }
}

// ---------------------------------------------------------------------------
// Console event loop
// ---------------------------------------------------------------------------

/// Run the console front end until the user quits, input ends, or the
/// session closes the update channel.
///
/// Pending updates are rendered before the next input line is read.
pub async fn run<R, S>(
    mut ui_rx: mpsc::Receiver<UiUpdate>,
    cmd_tx: mpsc::Sender<UserCommand>,
    input: R,
    sink: &mut S,
) -> anyhow::Result<()>
where
    R: AsyncBufRead + Unpin,
    S: RenderSink,
{
    let mut lines = input.lines();

    loop {
        tokio::select! {
            biased;

            update = ui_rx.recv() => {
                match update {
                    Some(update) => sink.render(&update).context("failed to render update")?,
                    None => {
                        debug!("UI channel closed");
                        break;
                    }
                }
            }

            line = lines.next_line() => {
                let Some(line) = line.context("failed to read console input")? else {
                    info!("Console input closed, quitting");
                    let _ = cmd_tx.send(UserCommand::Quit).await;
                    break;
                };
                match input::parse_command(&line) {
                    Some(UserCommand::Quit) => {
                        let _ = cmd_tx.send(UserCommand::Quit).await;
                        break;
                    }
                    Some(cmd) => {
                        if cmd_tx.send(cmd).await.is_err() {
                            break;
                        }
                    }
                    None if line.trim().is_empty() => {}
                    None => sink
                        .render(&UiUpdate::Notice(HELP.to_string()))
                        .context("failed to render update")?,
                }
            }
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Formatting
// ---------------------------------------------------------------------------

pub fn text_or_unknown(value: Option<&str>) -> &str {
    value.filter(|s| !s.is_empty()).unwrap_or(UNKNOWN)
}

/// One decimal place, or `-` when missing.
pub fn format_number(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| format!("{v:.1}"))
        .unwrap_or_else(|| MISSING.to_string())
}

pub fn format_count(value: Option<u32>) -> String {
    value
        .map(|v| v.to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

/// Signed gain, e.g. `+12.5`.
pub fn format_gain(value: Option<f64>) -> String {
    value
        .filter(|v| v.is_finite())
        .map(|v| format!("{v:+.1}"))
        .unwrap_or_else(|| MISSING.to_string())
}

pub fn format_updated<Tz>(at: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: Display,
{
    format!("updated {}", at.format("%H:%M:%S"))
}

pub fn format_api_status(status: &ApiStatus) -> String {
    match status {
        ApiStatus::Checking => "API: checking...".to_string(),
        ApiStatus::Online => "API: online".to_string(),
        ApiStatus::Unreachable => "API: not reachable (type `reconnect` to retry)".to_string(),
        ApiStatus::Error(text) => format!("API: error ({text})"),
    }
}

pub fn format_params(params: &ParameterSnapshot) -> String {
    let team = match params.team_id {
        Some(id) => format!("{} (#{id})", text_or_unknown(params.team_name.as_deref())),
        None => "none".to_string(),
    };
    format!(
        "Team: {team} | days {} | pool {} | limit {}",
        params.days, params.pool_size, params.limit
    )
}

pub fn format_team(team: &Team, active: bool) -> String {
    let marker = if active { '*' } else { ' ' };
    let record = match (team.wins, team.losses) {
        (None, None) => MISSING.to_string(),
        (w, l) => format!("{}-{}", format_count(w), format_count(l)),
    };
    format!(
        "  {marker} [{}] {} ({record})",
        team.id,
        text_or_unknown(team.name.as_deref())
    )
}

fn format_player_id(player: &Player) -> String {
    player
        .player_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| MISSING.to_string())
}

pub fn format_roster_player(player: &Player, selected: bool) -> String {
    let marker = if selected { '>' } else { ' ' };
    format!(
        "  {marker} [{}] {} {} {} {} | games {} | fppg {} | proj {} | avg {} / proj avg {}",
        format_player_id(player),
        text_or_unknown(player.name.as_deref()),
        text_or_unknown(player.position.as_deref()),
        text_or_unknown(player.pro_team.as_deref()),
        text_or_unknown(player.injury_status.as_deref()),
        format_count(player.games_in_window),
        format_number(player.fantasy_ppg_used),
        format_number(player.projected_points_in_window),
        format_number(player.avg_points),
        format_number(player.projected_avg_points),
    )
}

/// The requested window, plus the server's when it reports a different one.
pub fn format_window(requested: u32, reported: Option<u32>) -> String {
    match reported {
        Some(days) if days != requested => format!("{requested} days (server used {days})"),
        _ => format!("{requested} days"),
    }
}

fn format_swap_side(label: &str, player: &Player) -> String {
    format!(
        "{label} [{}] {} ({}, {}, {}) games {} proj {}",
        format_player_id(player),
        text_or_unknown(player.name.as_deref()),
        text_or_unknown(player.position.as_deref()),
        text_or_unknown(player.pro_team.as_deref()),
        text_or_unknown(player.injury_status.as_deref()),
        format_count(player.games_in_window),
        format_number(player.projected_points_in_window),
    )
}

/// One ranked swap card, three lines.
pub fn format_recommendation(rank: usize, rec: &Recommendation) -> String {
    format!(
        "  {rank}. gain {}\n     {}\n     {}",
        format_gain(rec.expected_gain_in_window),
        format_swap_side("add ", &rec.add),
        format_swap_side("drop", &rec.drop),
    )
}

fn format_selection(selection: &SelectionState) -> String {
    match selection.selected_drop_id {
        Some(id) => format!(
            "Drop filter: {} (#{id})",
            text_or_unknown(selection.selected_drop_name.as_deref())
        ),
        None => "Drop filter: none (best swaps overall)".to_string(),
    }
}

fn push_teams(out: &mut Vec<String>, panel: &TeamsPanel, active: Option<i64>) {
    out.push("Teams:".to_string());
    match panel {
        TeamsPanel::NotLoaded => out.push("  not loaded".to_string()),
        TeamsPanel::Loading => out.push("  loading...".to_string()),
        TeamsPanel::Failed(err) => out.push(format!("  error: {err}")),
        TeamsPanel::Ready(teams) if teams.is_empty() => out.push("  no teams".to_string()),
        TeamsPanel::Ready(teams) => {
            out.extend(teams.iter().map(|t| format_team(t, Some(t.id) == active)));
        }
    }
}

fn push_roster(
    out: &mut Vec<String>,
    panel: &RosterPanel,
    selection: &SelectionState,
    has_team: bool,
) {
    match panel {
        RosterPanel::Ready(snapshot) => push_roster_snapshot(out, snapshot, selection),
        RosterPanel::NotLoaded if !has_team => {
            out.push("Roster:".to_string());
            out.push("  no team selected".to_string());
        }
        RosterPanel::NotLoaded => {
            out.push("Roster:".to_string());
            out.push("  not loaded".to_string());
        }
        RosterPanel::Loading => {
            out.push("Roster:".to_string());
            out.push("  loading...".to_string());
        }
        RosterPanel::Failed(err) => {
            out.push("Roster:".to_string());
            out.push(format!("  error: {err}"));
        }
    }
}

fn push_roster_snapshot(out: &mut Vec<String>, snapshot: &RosterSnapshot, selection: &SelectionState) {
    out.push(format!(
        "Roster: {} | {} | {}",
        text_or_unknown(snapshot.team_name.as_deref()),
        format_window(snapshot.days, snapshot.days_window),
        format_updated(&snapshot.fetched_at.with_timezone(&Local))
    ));
    if snapshot.players.is_empty() {
        out.push("  no players".to_string());
        return;
    }
    for player in &snapshot.players {
        let selected = player.player_id.is_some() && player.player_id == selection.selected_drop_id;
        out.push(format_roster_player(player, selected));
    }
}

fn push_recommendations(out: &mut Vec<String>, panel: &RecommendationPanel, has_team: bool) {
    match panel {
        RecommendationPanel::NotRequested if !has_team => {
            out.push("Recommendations:".to_string());
            out.push("  no team selected".to_string());
        }
        RecommendationPanel::NotRequested => {
            out.push("Recommendations:".to_string());
            out.push("  not requested".to_string());
        }
        RecommendationPanel::Loading => {
            out.push("Recommendations:".to_string());
            out.push("  loading...".to_string());
        }
        RecommendationPanel::Failed(err) => {
            out.push("Recommendations:".to_string());
            out.push(format!("  error: {err}"));
        }
        RecommendationPanel::Empty(set) => {
            push_set_header(out, set);
            out.push(format!("  {EMPTY_RECOMMENDATIONS}"));
        }
        RecommendationPanel::Ready(set) => {
            push_set_header(out, set);
            out.extend(
                set.recommendations
                    .iter()
                    .enumerate()
                    .map(|(i, rec)| format_recommendation(i + 1, rec)),
            );
        }
    }
}

fn push_set_header(out: &mut Vec<String>, set: &RecommendationSet) {
    let team = set
        .team_name
        .as_deref()
        .map(|name| format!(" for {name}"))
        .unwrap_or_default();
    out.push(format!(
        "Recommendations{team}: {} | pool {} | limit {} | {} drop candidates | {}",
        format_window(set.days, set.days_window),
        set.pool_size,
        set.limit,
        set.drop_candidates_used.len(),
        format_updated(&set.fetched_at.with_timezone(&Local))
    ));
}

/// The whole snapshot as console text, ending in a newline.
pub fn format_snapshot(snapshot: &SessionSnapshot) -> String {
    let has_team = snapshot.params.team_id.is_some();
    let mut out = Vec::new();

    let mut status = format_api_status(&snapshot.api_status);
    if snapshot.in_flight > 0 {
        status.push_str(&format!(" | {} pending", snapshot.in_flight));
    }
    out.push(status);
    out.push(format_params(&snapshot.params));
    push_teams(&mut out, &snapshot.teams, snapshot.params.team_id);
    push_roster(&mut out, &snapshot.roster, &snapshot.selection, has_team);
    out.push(format_selection(&snapshot.selection));
    push_recommendations(&mut out, &snapshot.recommendations, has_team);

    let mut text = out.join("\n");
    text.push_str("\n\n");
    text
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
