// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

use serde::{Deserialize, Serialize};

/// Group membership for a synthetic user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    /// Name of the group
    pub name: String,

    /// Numeric GID of the group
    pub id: u64,
}

/// Identity a monkey runs as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Username
    pub username: String,

    /// Numeric UID, assigned by the identity service when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uidnumber: Option<u64>,

    /// Primary GID, defaults to the UID when omitted
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gidnumber: Option<u64>,

    /// Groups of which the user is a member
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,
}

/// Template for generating a set of numbered users.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpec {
    /// Each username is formed by appending a number to this prefix
    pub username_prefix: String,

    /// Users are given consecutive UIDs starting here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub uid_start: Option<u64>,

    /// Users are given consecutive primary GIDs starting here
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gid_start: Option<u64>,

    /// Groups of which each generated user is a member
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub groups: Vec<Group>,
}

impl UserSpec {
    /// Generate `count` users from this spec.
    ///
    /// Usernames are numbered from 1 and zero-padded to the width of `count`
    /// so that they sort correctly.
    pub fn users(&self, count: usize) -> Vec<User> {
        let width = count.to_string().len();
        (1..=count)
            .map(|i| User {
                username: format!("{}{:0width$}", self.username_prefix, i),
                uidnumber: self.uid_start.map(|uid| uid + i as u64 - 1),
                gidnumber: self.gid_start.map(|gid| gid + i as u64 - 1),
                groups: self.groups.clone(),
            })
            .collect()
    }
}

/// A user with credentials attached, ready for a monkey to run as.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    #[serde(flatten)]
    pub user: User,

    /// Scopes of the user's token
    pub scopes: Vec<String>,

    /// Authentication token for the user
    pub token: String,
}

impl AuthenticatedUser {
    pub fn username(&self) -> &str {
        &self.user.username
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_users_from_spec_padding() {
        let spec = UserSpec {
            username_prefix: "testuser".to_string(),
            uid_start: Some(60000),
            gid_start: None,
            groups: Vec::new(),
        };

        let users = spec.users(10);
        assert_eq!(users.len(), 10);
        assert_eq!(users[0].username, "testuser01");
        assert_eq!(users[9].username, "testuser10");
        assert_eq!(users[0].uidnumber, Some(60000));
        assert_eq!(users[9].uidnumber, Some(60009));
        assert!(users.iter().all(|u| u.gidnumber.is_none()));
    }

    #[test]
    fn test_users_from_spec_no_padding_needed() {
        let spec = UserSpec {
            username_prefix: "u".to_string(),
            uid_start: None,
            gid_start: Some(70000),
            groups: vec![Group {
                name: "g_load".to_string(),
                id: 123,
            }],
        };

        let users = spec.users(3);
        assert_eq!(users[2].username, "u3");
        assert_eq!(users[2].gidnumber, Some(70002));
        assert_eq!(users[1].groups.len(), 1);
    }
}
