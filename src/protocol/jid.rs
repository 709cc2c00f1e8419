//! Compound identifiers (JIDs)
//!
//! A JID is either a *pair* of an optional user and a server domain, or a
//! *companion* that names one device of a user through a numeric
//! `(agent, device)` couple instead of a server. The two shapes have distinct
//! wire encodings, so the type is a closed enum rather than a struct with
//! optional fields.

use std::fmt;
use std::str::FromStr;

use super::JidParseError;

/// Well-known server domains
pub mod server {
    /// Individual users
    pub const USER: &str = "s.whatsapp.net";
    /// Legacy individual users
    pub const LEGACY_USER: &str = "c.us";
    /// Groups and communities
    pub const GROUP: &str = "g.us";
    /// Broadcast lists and status
    pub const BROADCAST: &str = "broadcast";
    /// Group calls
    pub const CALL: &str = "call";
    /// Linked identities
    pub const LID: &str = "lid";
    /// Channels
    pub const NEWSLETTER: &str = "newsletter";
    /// Bots
    pub const BOT: &str = "bot";
}

/// Protocol address
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Jid {
    /// `user@server`, or a bare `server`
    Pair {
        /// User part, absent for server addresses
        user: Option<String>,
        /// Server domain
        server: String,
    },
    /// One device of a user: `user_agent:device`
    Companion {
        /// User part
        user: String,
        /// Agent byte
        agent: u8,
        /// Device byte
        device: u8,
    },
}

impl Jid {
    /// Create a `user@server` pair
    pub fn new(user: impl Into<String>, server: impl Into<String>) -> Self {
        Self::Pair {
            user: Some(strip_plus(user.into())),
            server: server.into(),
        }
    }

    /// Create a bare server address
    pub fn server_only(server: impl Into<String>) -> Self {
        Self::Pair {
            user: None,
            server: server.into(),
        }
    }

    /// Create a `user@s.whatsapp.net` pair
    pub fn user_jid(user: impl Into<String>) -> Self {
        Self::new(user, server::USER)
    }

    /// Create a companion (device) address
    pub fn companion(user: impl Into<String>, agent: u8, device: u8) -> Self {
        Self::Companion {
            user: strip_plus(user.into()),
            agent,
            device,
        }
    }

    /// User part
    #[must_use]
    pub fn user(&self) -> Option<&str> {
        match self {
            Self::Pair { user, .. } => user.as_deref(),
            Self::Companion { user, .. } => Some(user),
        }
    }

    /// Server domain. Companions carry no server on the wire, so this is empty for them.
    #[must_use]
    pub fn server(&self) -> &str {
        match self {
            Self::Pair { server, .. } => server,
            Self::Companion { .. } => "",
        }
    }

    /// Agent byte (0 for pairs)
    #[must_use]
    pub const fn agent(&self) -> u8 {
        match self {
            Self::Pair { .. } => 0,
            Self::Companion { agent, .. } => *agent,
        }
    }

    /// Device byte (0 for pairs)
    #[must_use]
    pub const fn device(&self) -> u8 {
        match self {
            Self::Pair { .. } => 0,
            Self::Companion { device, .. } => *device,
        }
    }

    /// Check if this is the companion shape
    #[must_use]
    pub const fn is_companion(&self) -> bool {
        matches!(self, Self::Companion { .. })
    }

    /// Check if this is a bare server address on `server`
    #[must_use]
    pub fn is_server_jid(&self, server: &str) -> bool {
        matches!(self, Self::Pair { user: None, server: s } if s == server)
    }

    /// Drop device information, keeping the user on the default user server
    #[must_use]
    pub fn to_user_jid(&self) -> Self {
        match self {
            Self::Pair { .. } => self.clone(),
            Self::Companion { user, .. } => Self::user_jid(user.clone()),
        }
    }
}

fn strip_plus(user: String) -> String {
    match user.strip_prefix('+') {
        Some(stripped) => stripped.to_owned(),
        None => user,
    }
}

impl fmt::Display for Jid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pair { user: Some(user), server } if !user.is_empty() => {
                write!(f, "{user}@{server}")
            }
            Self::Pair { server, .. } => write!(f, "{server}"),
            Self::Companion { user, agent, device } => {
                write!(f, "{user}")?;
                if *agent != 0 {
                    write!(f, "_{agent}")?;
                }
                write!(f, ":{device}@{}", server::USER)
            }
        }
    }
}

impl FromStr for Jid {
    type Err = JidParseError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        if input.is_empty() {
            return Err(JidParseError::Empty);
        }

        let Some((leading, server)) = input.rsplit_once('@') else {
            return Ok(Self::server_only(input));
        };

        if leading.is_empty() {
            return Ok(Self::server_only(server));
        }

        let (head, device) = match leading.split_once(':') {
            Some((head, device)) => {
                let device = device
                    .parse::<u8>()
                    .map_err(|_| JidParseError::InvalidDevice(input.to_owned()))?;
                (head, Some(device))
            }
            None => (leading, None),
        };

        let (user, agent) = match head.split_once('_') {
            Some((user, agent)) => {
                let agent = agent
                    .parse::<u8>()
                    .map_err(|_| JidParseError::InvalidAgent(input.to_owned()))?;
                (user, Some(agent))
            }
            None => (head, None),
        };

        if device.is_none() && agent.is_none() {
            return Ok(Self::new(user, server));
        }

        Ok(Self::companion(
            user,
            agent.unwrap_or_default(),
            device.unwrap_or_default(),
        ))
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for Jid {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        let jid: Jid = "393495089819@s.whatsapp.net".parse().unwrap();
        assert_eq!(jid, Jid::new("393495089819", server::USER));
        assert_eq!(jid.user(), Some("393495089819"));
        assert_eq!(jid.server(), server::USER);
        assert!(!jid.is_companion());
        assert_eq!(jid.to_string(), "393495089819@s.whatsapp.net");
    }

    #[test]
    fn test_parse_server_only() {
        let jid: Jid = "g.us".parse().unwrap();
        assert!(jid.is_server_jid(server::GROUP));
        assert_eq!(jid.user(), None);
        assert_eq!(jid.to_string(), "g.us");

        let jid: Jid = "@broadcast".parse().unwrap();
        assert!(jid.is_server_jid(server::BROADCAST));
    }

    #[test]
    fn test_parse_companion() {
        let jid: Jid = "12345_1:7@s.whatsapp.net".parse().unwrap();
        assert_eq!(jid, Jid::companion("12345", 1, 7));
        assert!(jid.is_companion());
        assert_eq!(jid.server(), "");
        assert_eq!(jid.to_string(), "12345_1:7@s.whatsapp.net");

        let device_only: Jid = "12345:3@s.whatsapp.net".parse().unwrap();
        assert_eq!(device_only, Jid::companion("12345", 0, 3));
        assert_eq!(device_only.to_string(), "12345:3@s.whatsapp.net");
        assert_eq!(device_only.to_user_jid(), Jid::user_jid("12345"));
    }

    #[test]
    fn test_canonical_form_reparses() {
        for input in ["1@g.us", "status@broadcast", "9_2:0@s.whatsapp.net", "lid"] {
            let jid: Jid = input.parse().unwrap();
            let reparsed: Jid = jid.to_string().parse().unwrap();
            assert_eq!(jid, reparsed, "{input}");
        }
    }

    #[test]
    fn test_plus_prefix_stripped() {
        let jid: Jid = "+391234@s.whatsapp.net".parse().unwrap();
        assert_eq!(jid.user(), Some("391234"));
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!("".parse::<Jid>(), Err(JidParseError::Empty));
        assert!(matches!(
            "1:x@s.whatsapp.net".parse::<Jid>(),
            Err(JidParseError::InvalidDevice(_))
        ));
        assert!(matches!(
            "1_300:1@s.whatsapp.net".parse::<Jid>(),
            Err(JidParseError::InvalidAgent(_))
        ));
    }
}
