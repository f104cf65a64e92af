/// Wire types for the Fantasy Premier League read-only API.
/// Endpoint root: https://fantasy.premierleague.com/api/{path}/
///
/// Only the fields the aggregation reads are modelled. Everything is
/// defaulted so a partially populated payload still decodes.
use serde::Deserialize;

/// `bootstrap-static`
#[derive(Deserialize, Default, Debug, Clone)]
pub struct BootstrapResponse {
    #[serde(default)]
    pub elements: Vec<BootstrapElement>,
    #[serde(default)]
    pub events: Vec<BootstrapEvent>,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct BootstrapElement {
    pub id: u32,
    #[serde(default)]
    pub web_name: String,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct BootstrapEvent {
    pub id: u32,
    #[serde(default)]
    pub is_current: bool,
    #[serde(default)]
    pub finished: bool,
}

/// `entry/{id}/history`
#[derive(Deserialize, Default, Debug, Clone)]
pub struct HistoryResponse {
    #[serde(default)]
    pub current: Vec<GameweekRecord>,
    #[serde(default)]
    pub chips: Vec<ChipPlay>,
}

/// One row of a manager's season history. Absent numeric fields read as zero.
#[derive(Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct GameweekRecord {
    pub event: u32,
    #[serde(default)]
    pub points: i32,
    #[serde(default)]
    pub total_points: i32,
    #[serde(default)]
    pub points_on_bench: i32,
    #[serde(default)]
    pub event_transfers: i32,
    #[serde(default)]
    pub event_transfers_cost: i32,
}

#[derive(Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct ChipPlay {
    #[serde(default)]
    pub name: String,
    pub event: u32,
}

/// `event/{gw}/live`
#[derive(Deserialize, Default, Debug, Clone)]
pub struct LiveResponse {
    #[serde(default)]
    pub elements: Vec<LiveElement>,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct LiveElement {
    pub id: u32,
    #[serde(default)]
    pub stats: LiveStats,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct LiveStats {
    #[serde(default)]
    pub total_points: i32,
}

/// `entry/{id}/event/{gw}/picks`
#[derive(Deserialize, Default, Debug, Clone)]
pub struct PicksResponse {
    #[serde(default)]
    pub picks: Vec<Pick>,
}

#[derive(Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct Pick {
    pub element: u32,
    /// 1–15; 12 and above is the bench.
    pub position: u8,
    #[serde(default)]
    pub is_captain: bool,
    #[serde(default)]
    pub multiplier: u32,
}

/// `leagues-classic/{id}/standings`
#[derive(Deserialize, Default, Debug, Clone)]
pub struct StandingsResponse {
    #[serde(default)]
    pub standings: StandingsPage,
}

#[derive(Deserialize, Default, Debug, Clone)]
pub struct StandingsPage {
    #[serde(default)]
    pub results: Vec<StandingsEntry>,
}

#[derive(Deserialize, Default, Debug, Clone, PartialEq, Eq)]
pub struct StandingsEntry {
    pub entry: u64,
    #[serde(default)]
    pub player_name: String,
    #[serde(default)]
    pub entry_name: String,
    #[serde(default)]
    pub total: i32,
}

/// Resolve the session's current gameweek from bootstrap events.
///
/// Falls back to the gameweek after the last finished one when no event is
/// flagged current (pre-season, or after the final gameweek).
pub fn current_event(events: &[BootstrapEvent]) -> Option<u32> {
    if let Some(ev) = events.iter().find(|e| e.is_current) {
        return Some(ev.id);
    }
    events
        .iter()
        .filter(|e| e.finished)
        .map(|e| e.id)
        .max()
        .map(|id| id + 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn history_with_missing_fields_decodes_as_zero() {
        let raw = r#"{"current":[{"event":1,"points":50}],"chips":[]}"#;
        let h: HistoryResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(h.current[0].points_on_bench, 0);
        assert_eq!(h.current[0].event_transfers_cost, 0);
    }

    #[test]
    fn current_event_prefers_is_current_flag() {
        let events = vec![
            BootstrapEvent { id: 1, is_current: false, finished: true },
            BootstrapEvent { id: 2, is_current: true, finished: false },
            BootstrapEvent { id: 3, is_current: false, finished: false },
        ];
        assert_eq!(current_event(&events), Some(2));
    }

    #[test]
    fn current_event_falls_back_past_last_finished() {
        let events = vec![
            BootstrapEvent { id: 37, is_current: false, finished: true },
            BootstrapEvent { id: 38, is_current: false, finished: true },
        ];
        assert_eq!(current_event(&events), Some(39));
        assert_eq!(current_event(&[]), None);
    }

    #[test]
    fn picks_payload_decodes() {
        let raw = r#"{"picks":[{"element":10,"position":1,"is_captain":true,"multiplier":2}]}"#;
        let p: PicksResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(p.picks[0].element, 10);
        assert!(p.picks[0].is_captain);
    }
}
