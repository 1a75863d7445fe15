//! Registration and registrant types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Role a registrant holds at the event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Judge,
    Mentor,
    /// Assigned when no other role applies
    Participant,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Judge => "judge",
            Role::Mentor => "mentor",
            Role::Participant => "participant",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Capstone flag exactly as the workflow sent it.
///
/// Some survey exports send `true`/`false`, others `0`/`1`. The value is kept
/// in its original shape so it echoes back unchanged.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum CapstoneFlag {
    Bool(bool),
    Int(i64),
}

impl CapstoneFlag {
    /// Whether the flag is truthy.
    pub fn is_set(&self) -> bool {
        match self {
            CapstoneFlag::Bool(b) => *b,
            CapstoneFlag::Int(n) => *n != 0,
        }
    }
}

impl Default for CapstoneFlag {
    fn default() -> Self {
        CapstoneFlag::Int(0)
    }
}

/// A normalized registration, ready to be upserted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registration {
    /// Lowercase email, unique key for the registrant
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub is_capstone: CapstoneFlag,
    /// Ordered by first occurrence, never empty
    pub roles: Vec<Role>,
}

impl Registration {
    /// Build a registration, lowercasing the email and deduplicating roles.
    ///
    /// An empty role list becomes `[Participant]`.
    pub fn new(
        email: &str,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
        is_capstone: CapstoneFlag,
        roles: impl IntoIterator<Item = Role>,
    ) -> Self {
        let mut deduped: Vec<Role> = Vec::new();
        for role in roles {
            if !deduped.contains(&role) {
                deduped.push(role);
            }
        }
        if deduped.is_empty() {
            deduped.push(Role::Participant);
        }

        Self {
            email: email.to_lowercase(),
            first_name: first_name.into(),
            last_name: last_name.into(),
            is_capstone,
            roles: deduped,
        }
    }
}

/// A stored registrant.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Registrant {
    #[serde(flatten)]
    pub registration: Registration,
    /// First time this email registered
    pub registered_at: DateTime<Utc>,
    /// Last time the record was upserted
    pub updated_at: DateTime<Utc>,
}

impl Registrant {
    /// Create a registrant seen for the first time now.
    pub fn new(registration: Registration) -> Self {
        let now = Utc::now();
        Self {
            registration,
            registered_at: now,
            updated_at: now,
        }
    }

    /// Replace the registration details, keeping the original registration time.
    pub fn apply(&mut self, registration: Registration) {
        self.registration = registration;
        self.updated_at = Utc::now();
    }

    pub fn email(&self) -> &str {
        &self.registration.email
    }
}
