//! User entity
//!
//! External identity consumed by the core. Tickets never hold a live
//! reference to a user, only the snapshots in [`super::ticket`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::value_objects::{TeamId, UserId};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub team_id: Option<TeamId>,
}

impl User {
    pub fn new(id: impl Into<UserId>, name: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self { id: id.into(), name: name.into(), email: email.into(), role, team_id: None }
    }

    pub fn in_team(mut self, team_id: impl Into<TeamId>) -> Self {
        self.team_id = Some(team_id.into());
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Agent,
    User,
    TeamLeader,
    Manager,
    /// Any role name this build does not know; denied everywhere
    #[serde(other)]
    Unknown,
}

impl Role {
    pub const ALL: [Role; 5] = [Role::Admin, Role::Agent, Role::User, Role::TeamLeader, Role::Manager];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Agent => "agent",
            Self::User => "user",
            Self::TeamLeader => "team_leader",
            Self::Manager => "manager",
            Self::Unknown => "unknown",
        }
    }

    /// Admin, manager or team leader
    pub fn is_supervisory(&self) -> bool {
        matches!(self, Self::Admin | Self::Manager | Self::TeamLeader)
    }

    /// Every role that works tickets rather than files them
    pub fn is_staff(&self) -> bool {
        matches!(self, Self::Agent | Self::TeamLeader | Self::Manager | Self::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Self::Admin),
            "agent" => Ok(Self::Agent),
            "user" => Ok(Self::User),
            "team_leader" => Ok(Self::TeamLeader),
            "manager" => Ok(Self::Manager),
            other => Err(format!("unknown role: {}", other)),
        }
    }
}
