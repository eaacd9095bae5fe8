//! Protocol action codes

/// Actions a client may request
///
/// The wire carries the short code (`a` field); anything that does not parse
/// into one of these is answered with a 400 error frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    /// `hs` - handshake, echoes protocol version and connection id
    Handshake,
    /// `f` - fetch the current snapshot of a document
    Fetch,
    /// `s` - subscribe to live operations on a document
    Subscribe,
    /// `op` - submit an operation
    Operation,
    /// `p` - submit presence and receive the channel's presence set
    Presence,
}

impl Action {
    /// All actions in wire order
    pub const ALL: [Self; 5] = [
        Self::Handshake,
        Self::Fetch,
        Self::Subscribe,
        Self::Operation,
        Self::Presence,
    ];

    /// Parse a wire action code
    #[must_use]
    pub fn parse(code: &str) -> Option<Self> {
        match code {
            "hs" => Some(Self::Handshake),
            "f" => Some(Self::Fetch),
            "s" => Some(Self::Subscribe),
            "op" => Some(Self::Operation),
            "p" => Some(Self::Presence),
            _ => None,
        }
    }

    /// Get the wire action code
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Handshake => "hs",
            Self::Fetch => "f",
            Self::Subscribe => "s",
            Self::Operation => "op",
            Self::Presence => "p",
        }
    }

    /// Whether the action addresses a specific document (`c` and `d` fields)
    #[must_use]
    pub const fn targets_document(self) -> bool {
        !matches!(self, Self::Handshake)
    }
}

impl std::fmt::Display for Action {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}
