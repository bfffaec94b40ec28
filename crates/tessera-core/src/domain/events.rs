//! Events - ホスト環境のイベント
//!
//! ナビゲーション系のイベントは HashChange と PopState の 2 種類だけ。
//! それ以外は Other としてホストにそのまま渡す。

use std::fmt;

use super::location::Location;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    HashChange,
    PopState,
    Other(String),
}

impl EventKind {
    pub const NAVIGATION: [EventKind; 2] = [EventKind::HashChange, EventKind::PopState];

    pub fn parse(name: &str) -> Self {
        match name {
            "hashchange" => EventKind::HashChange,
            "popstate" => EventKind::PopState,
            other => EventKind::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            EventKind::HashChange => "hashchange",
            EventKind::PopState => "popstate",
            EventKind::Other(name) => name,
        }
    }

    pub fn is_navigation(&self) -> bool {
        matches!(self, EventKind::HashChange | EventKind::PopState)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An event delivered by (or synthesized for) the host.
#[derive(Debug, Clone, PartialEq)]
pub struct HostEvent {
    pub kind: EventKind,
    /// Location after the event took effect.
    pub location: Location,
    /// History state attached to the entry, if any.
    pub state: Option<serde_json::Value>,
    /// Produced by the orchestrator after a history mutation rather than by the host.
    pub synthetic: bool,
}

impl HostEvent {
    pub fn new(kind: EventKind, location: Location) -> Self {
        Self {
            kind,
            location,
            state: None,
            synthetic: false,
        }
    }

    pub fn synthetic_pop_state(location: Location, state: Option<serde_json::Value>) -> Self {
        Self {
            kind: EventKind::PopState,
            location,
            state,
            synthetic: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        for name in ["hashchange", "popstate", "resize"] {
            assert_eq!(EventKind::parse(name).as_str(), name);
        }
        assert!(EventKind::parse("popstate").is_navigation());
        assert!(!EventKind::parse("click").is_navigation());
    }
}
