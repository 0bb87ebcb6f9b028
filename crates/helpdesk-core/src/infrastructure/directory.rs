//! Static team directory
//!
//! Users and teams loaded once from TOML:
//!
//! ```toml
//! [[users]]
//! id = "4"
//! name = "Team Leader"
//! email = "leader@example.com"
//! role = "team_leader"
//! teamId = "team-1"
//!
//! [[teams]]
//! id = "team-1"
//! name = "Support"
//! leader = "4"
//! ```

use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::domain::aggregates::{Role, User};
use crate::domain::value_objects::{TeamId, UserId};
use crate::ports::outbound::TeamDirectory;

#[derive(Error, Debug)]
pub enum DirectoryError {
    #[error("directory io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("directory parse error: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub name: String,
    #[serde(default)]
    pub leader: Option<UserId>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StaticDirectory {
    pub users: Vec<User>,
    pub teams: Vec<Team>,
}

impl StaticDirectory {
    pub fn new(users: Vec<User>) -> Self {
        Self { users, teams: vec![] }
    }

    pub fn with_team_leader(mut self, team_id: TeamId, leader: UserId) -> Self {
        match self.teams.iter_mut().find(|t| t.id == team_id) {
            Some(team) => team.leader = Some(leader),
            None => self.teams.push(Team { name: team_id.to_string(), id: team_id, leader: Some(leader) }),
        }
        self
    }

    pub fn from_toml_str(content: &str) -> Result<Self, DirectoryError> {
        Ok(toml::from_str(content)?)
    }

    /// Load from a TOML file; a missing file is an empty directory
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DirectoryError> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::debug!(path = %path.display(), "team directory not found, starting empty");
            return Ok(Self::default());
        }
        Self::from_toml_str(&std::fs::read_to_string(path)?)
    }
}

impl TeamDirectory for StaticDirectory {
    /// The team's configured leader, else the first team leader who belongs to the team
    fn team_leader(&self, team_id: &TeamId) -> Option<User> {
        let configured = self
            .teams
            .iter()
            .find(|t| &t.id == team_id)
            .and_then(|t| t.leader.as_ref())
            .and_then(|id| self.find_user(id));
        configured.or_else(|| {
            self.users
                .iter()
                .find(|u| u.role == Role::TeamLeader && u.team_id.as_ref() == Some(team_id))
                .cloned()
        })
    }

    fn managers(&self) -> Vec<User> {
        self.users.iter().filter(|u| u.role == Role::Manager).cloned().collect()
    }

    fn find_user(&self, id: &UserId) -> Option<User> {
        self.users.iter().find(|u| &u.id == id).cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DIRECTORY: &str = r#"
        [[users]]
        id = "4"
        name = "Team Leader"
        email = "leader@example.com"
        role = "team_leader"
        teamId = "team-1"

        [[users]]
        id = "7"
        name = "Night Leader"
        email = "night@example.com"
        role = "team_leader"
        teamId = "team-2"

        [[users]]
        id = "5"
        name = "Manager"
        email = "manager@example.com"
        role = "manager"

        [[teams]]
        id = "team-2"
        name = "Night shift"
        leader = "4"
    "#;

    #[test]
    fn test_lookup_from_toml() {
        let dir = StaticDirectory::from_toml_str(DIRECTORY).unwrap();
        assert_eq!(dir.team_leader(&"team-1".into()).unwrap().id.as_str(), "4");
        assert_eq!(dir.team_leader(&"team-2".into()).unwrap().id.as_str(), "4");
        assert_eq!(dir.team_leader(&"team-3".into()), None);
        assert_eq!(dir.managers().len(), 1);
        assert_eq!(dir.find_user(&"7".into()).unwrap().name, "Night Leader");
    }

    #[test]
    fn test_missing_file_is_empty() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = StaticDirectory::load(tmp.path().join("users.toml")).unwrap();
        assert!(dir.managers().is_empty());
    }
}
