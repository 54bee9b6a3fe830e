//! Presence message types for the realtime channel
//!
//! A client announces that a player joined or left a team; the server relays the
//! same event, unchanged, to every open channel. Inbound and outbound frames share
//! one shape, so a single type serves both directions.

use std::fmt;

use serde::Serialize;

/// The player and team a presence event is about.
///
/// All three fields are required on the wire (`playerId`, `playerName`, `teamId`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TeamPresence {
    pub player_id: String,
    pub player_name: String,
    pub team_id: String,
}

impl TeamPresence {
    pub fn new(
        player_id: impl Into<String>,
        player_name: impl Into<String>,
        team_id: impl Into<String>,
    ) -> Self {
        Self {
            player_id: player_id.into(),
            player_name: player_name.into(),
            team_id: team_id.into(),
        }
    }
}

/// A team membership change, tagged on the wire by `type`.
///
/// Parse inbound frames with [`crate::decode`], which validates each field and
/// reports a typed [`crate::CodecError`]. There is no `Deserialize` impl.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PresenceEvent {
    /// Player joined a team
    Join(TeamPresence),
    /// Player left a team
    Leave(TeamPresence),
}

impl PresenceEvent {
    pub fn join(
        player_id: impl Into<String>,
        player_name: impl Into<String>,
        team_id: impl Into<String>,
    ) -> Self {
        Self::Join(TeamPresence::new(player_id, player_name, team_id))
    }

    pub fn leave(
        player_id: impl Into<String>,
        player_name: impl Into<String>,
        team_id: impl Into<String>,
    ) -> Self {
        Self::Leave(TeamPresence::new(player_id, player_name, team_id))
    }

    pub fn kind(&self) -> PresenceEventKind {
        match self {
            Self::Join(_) => PresenceEventKind::Join,
            Self::Leave(_) => PresenceEventKind::Leave,
        }
    }

    pub fn presence(&self) -> &TeamPresence {
        match self {
            Self::Join(presence) | Self::Leave(presence) => presence,
        }
    }

    pub fn player_id(&self) -> &str {
        &self.presence().player_id
    }

    pub fn player_name(&self) -> &str {
        &self.presence().player_name
    }

    pub fn team_id(&self) -> &str {
        &self.presence().team_id
    }
}

/// Discriminant of a [`PresenceEvent`], as carried in the `type` field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PresenceEventKind {
    Join,
    Leave,
}

impl PresenceEventKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Join => "join",
            Self::Leave => "leave",
        }
    }

    /// Look up a kind by its wire discriminant. Matching is exact (case-sensitive).
    pub fn from_wire(discriminant: &str) -> Option<Self> {
        match discriminant {
            "join" => Some(Self::Join),
            "leave" => Some(Self::Leave),
            _ => None,
        }
    }

    pub(crate) fn into_event(self, presence: TeamPresence) -> PresenceEvent {
        match self {
            Self::Join => PresenceEvent::Join(presence),
            Self::Leave => PresenceEvent::Leave(presence),
        }
    }
}

impl fmt::Display for PresenceEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
