//! Broker channel naming.

/// Default namespace for broker channels and presence keys
pub const DEFAULT_PREFIX: &str = "sharedb:";

/// Maps unprefixed channel names to broker names and back
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelNames {
    prefix: String,
}

impl Default for ChannelNames {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}

impl ChannelNames {
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    #[must_use]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Broker name of a channel
    #[must_use]
    pub fn full(&self, channel: &str) -> String {
        format!("{}{channel}", self.prefix)
    }

    /// Redis key holding the presence hash of a channel
    #[must_use]
    pub fn presence_key(&self, channel: &str) -> String {
        format!("{}presence:{channel}", self.prefix)
    }
}
