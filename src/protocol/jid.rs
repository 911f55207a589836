//! Chat identities.
//!
//! A JID has the shape `user[:device]@server`. The device part identifies
//! one linked device of an account; dropping it gives the stable
//! "non-device" form used as the key for everything we persist.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Server for group chats.
pub const GROUP_SERVER: &str = "g.us";
/// Server for newsletter (channel) broadcasts.
pub const NEWSLETTER_SERVER: &str = "newsletter";

/// Errors produced while parsing a JID string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum JidParseError {
    #[error("empty JID")]
    Empty,

    #[error("invalid device suffix in JID '{0}'")]
    InvalidDevice(String),
}

/// A protocol-level chat identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Jid {
    user: String,
    device: Option<u16>,
    server: String,
}

impl Jid {
    pub fn user(&self) -> &str {
        &self.user
    }

    pub fn device(&self) -> Option<u16> {
        self.device
    }

    pub fn server(&self) -> &str {
        &self.server
    }

    /// The account-level form of this identity, with the device dropped.
    #[must_use]
    pub fn to_non_device(&self) -> Jid {
        Self {
            user: self.user.clone(),
            device: None,
            server: self.server.clone(),
        }
    }

    pub fn is_group(&self) -> bool {
        self.server == GROUP_SERVER
    }

    pub fn is_newsletter(&self) -> bool {
        self.server == NEWSLETTER_SERVER
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.device, self.server.is_empty()) {
            (Some(device), false) => write!(f, "{}:{}@{}", self.user, device, self.server),
            (Some(device), true) => write!(f, "{}:{}", self.user, device),
            (None, false) if self.user.is_empty() => write!(f, "{}", self.server),
            (None, false) => write!(f, "{}@{}", self.user, self.server),
            (None, true) => write!(f, "{}", self.user),
        }
    }
}

impl FromStr for Jid {
    type Err = JidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(JidParseError::Empty);
        }

        let (user_part, server) = match s.rsplit_once('@') {
            Some((user, server)) => (user, server),
            // A bare server such as "g.us" or "broadcast"
            None if !s.contains(':') && s.contains('.') => ("", s),
            None => (s, ""),
        };

        let (user, device) = match user_part.split_once(':') {
            Some((user, device)) => {
                let device = device
                    .parse::<u16>()
                    .map_err(|_| JidParseError::InvalidDevice(s.to_string()))?;
                (user, Some(device))
            }
            None => (user_part, None),
        };

        Ok(Self {
            user: user.to_string(),
            device,
            server: server.to_string(),
        })
    }
}

impl TryFrom<String> for Jid {
    type Error = JidParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Jid> for String {
    fn from(jid: Jid) -> Self {
        jid.to_string()
    }
}
