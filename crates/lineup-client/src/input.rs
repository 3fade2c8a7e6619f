// Console command parsing.
//
// Translates one line of console input into a UserCommand for the session
// orchestrator. Parameter values are forwarded as typed; clamping happens in
// the Parameter Store.

use crate::protocol::UserCommand;

/// Shown when a line does not parse.
pub const HELP: &str = "commands: team <id> | days <n> | pool <n> | limit <n> | \
drop <playerId> | best | refresh | reconnect | quit";

/// Parse one console line.
///
/// Returns `None` for blank lines, unknown verbs, missing arguments, and
/// non-integer ids. Parameter values are not validated here.
pub fn parse_command(line: &str) -> Option<UserCommand> {
    let mut parts = line.split_whitespace();
    let verb = parts.next()?.to_ascii_lowercase();
    let arg = parts.next();

    match (verb.as_str(), arg) {
        ("team", Some(id)) => id
            .parse()
            .ok()
            .map(|team_id| UserCommand::SelectTeam { team_id }),
        ("days", Some(raw)) => Some(UserCommand::SetDays(raw.to_string())),
        ("pool", Some(raw)) => Some(UserCommand::SetPoolSize(raw.to_string())),
        ("limit", Some(raw)) => Some(UserCommand::SetLimit(raw.to_string())),
        ("drop", Some(id)) => id
            .parse()
            .ok()
            .map(|player_id| UserCommand::SelectDrop { player_id }),
        ("best", _) => Some(UserCommand::BestSwaps),
        ("refresh", _) => Some(UserCommand::RefreshRoster),
        ("reconnect", _) => Some(UserCommand::Reconnect),
        ("quit" | "q" | "exit", _) => Some(UserCommand::Quit),
        _ => None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
