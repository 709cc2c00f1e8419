//! Wire tags and frame marker flags

use std::fmt;

/// Reserved tag bytes of the binary Node format.
///
/// Any byte that is not one of these is either a direct index into the
/// single-byte token table or an unknown tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Tag {
    /// Null / absent value
    ListEmpty = 0,

    /// Quadrant 0 of the double-byte dictionary
    Dictionary0 = 236,
    /// Quadrant 1 of the double-byte dictionary
    Dictionary1 = 237,
    /// Quadrant 2 of the double-byte dictionary
    Dictionary2 = 238,
    /// Quadrant 3 of the double-byte dictionary
    Dictionary3 = 239,

    /// Companion identifier (agent, device, user)
    AdJid = 247,
    /// List with a one byte element count
    List8 = 248,
    /// List with a two byte element count
    List16 = 249,
    /// Pair identifier (user, server)
    JidPair = 250,
    /// Hex packed string
    Hex8 = 251,
    /// Raw data with a one byte length
    Binary8 = 252,
    /// Raw data with a 20-bit length
    Binary20 = 253,
    /// Raw data with a 32-bit length
    Binary32 = 254,
    /// Nibble packed numeric string
    Nibble8 = 255,
}

impl Tag {
    /// First byte of the reserved dictionary range; single-byte tokens sit below it.
    pub const SINGLE_BYTE_LIMIT: u8 = Self::Dictionary0 as u8;

    /// Convert from byte
    #[must_use]
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::ListEmpty),
            236 => Some(Self::Dictionary0),
            237 => Some(Self::Dictionary1),
            238 => Some(Self::Dictionary2),
            239 => Some(Self::Dictionary3),
            247 => Some(Self::AdJid),
            248 => Some(Self::List8),
            249 => Some(Self::List16),
            250 => Some(Self::JidPair),
            251 => Some(Self::Hex8),
            252 => Some(Self::Binary8),
            253 => Some(Self::Binary20),
            254 => Some(Self::Binary32),
            255 => Some(Self::Nibble8),
            _ => None,
        }
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Dictionary tag for a quadrant number (0..=3).
    #[must_use]
    pub const fn dictionary(quadrant: u8) -> Option<Self> {
        match quadrant {
            0 => Some(Self::Dictionary0),
            1 => Some(Self::Dictionary1),
            2 => Some(Self::Dictionary2),
            3 => Some(Self::Dictionary3),
            _ => None,
        }
    }

    /// Quadrant number if this is a dictionary tag.
    #[must_use]
    pub const fn quadrant(self) -> Option<u8> {
        match self {
            Self::Dictionary0 => Some(0),
            Self::Dictionary1 => Some(1),
            Self::Dictionary2 => Some(2),
            Self::Dictionary3 => Some(3),
            _ => None,
        }
    }

    /// Check if this tag introduces a string-shaped token
    #[must_use]
    pub const fn is_string(self) -> bool {
        matches!(
            self,
            Self::Dictionary0
                | Self::Dictionary1
                | Self::Dictionary2
                | Self::Dictionary3
                | Self::Hex8
                | Self::Nibble8
                | Self::Binary8
                | Self::Binary20
                | Self::Binary32
        )
    }

    /// Check if this tag introduces a list of nodes
    #[must_use]
    pub const fn is_list(self) -> bool {
        matches!(self, Self::List8 | Self::List16)
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ListEmpty => "LIST_EMPTY",
            Self::Dictionary0 => "DICTIONARY_0",
            Self::Dictionary1 => "DICTIONARY_1",
            Self::Dictionary2 => "DICTIONARY_2",
            Self::Dictionary3 => "DICTIONARY_3",
            Self::AdJid => "AD_JID",
            Self::List8 => "LIST_8",
            Self::List16 => "LIST_16",
            Self::JidPair => "JID_PAIR",
            Self::Hex8 => "HEX_8",
            Self::Binary8 => "BINARY_8",
            Self::Binary20 => "BINARY_20",
            Self::Binary32 => "BINARY_32",
            Self::Nibble8 => "NIBBLE_8",
        };
        write!(f, "{name}")
    }
}

/// Frame marker flags (byte 0 of every encoded frame).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FrameFlags(u8);

impl FrameFlags {
    /// Remainder of the frame is zlib compressed
    pub const COMPRESSED: u8 = 1 << 1;

    /// Create empty flags
    #[must_use]
    pub const fn new() -> Self {
        Self(0)
    }

    /// Create from the raw marker byte. Unknown bits are kept but ignored.
    #[must_use]
    pub const fn from_u8(value: u8) -> Self {
        Self(value)
    }

    /// Convert to byte
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self.0
    }

    /// Set a flag
    #[must_use]
    pub const fn with(mut self, flag: u8) -> Self {
        self.0 |= flag;
        self
    }

    /// Check if flag is set
    #[must_use]
    pub const fn has(self, flag: u8) -> bool {
        (self.0 & flag) != 0
    }

    /// Check if compressed
    #[must_use]
    pub const fn is_compressed(self) -> bool {
        self.has(Self::COMPRESSED)
    }
}

impl fmt::Display for FrameFlags {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_compressed() {
            write!(f, "COMPRESSED")
        } else {
            write!(f, "NONE")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tag_roundtrip() {
        for byte in 0..=u8::MAX {
            if let Some(tag) = Tag::from_u8(byte) {
                assert_eq!(tag.as_u8(), byte);
            }
        }
        assert_eq!(Tag::from_u8(1), None);
        assert_eq!(Tag::from_u8(240), None);
        assert_eq!(Tag::from_u8(246), None);
    }

    #[test]
    fn test_dictionary_quadrants() {
        for quadrant in 0..4 {
            let tag = Tag::dictionary(quadrant).unwrap();
            assert_eq!(tag.quadrant(), Some(quadrant));
            assert!(tag.is_string());
        }
        assert_eq!(Tag::dictionary(4), None);
        assert_eq!(Tag::SINGLE_BYTE_LIMIT, 236);
    }

    #[test]
    fn test_flags() {
        let flags = FrameFlags::new().with(FrameFlags::COMPRESSED);
        assert!(flags.is_compressed());
        assert_eq!(flags.as_u8(), 2);
        assert!(!FrameFlags::from_u8(0).is_compressed());
        assert!(FrameFlags::from_u8(0x03).is_compressed());
        assert_eq!(flags.to_string(), "COMPRESSED");
    }
}
