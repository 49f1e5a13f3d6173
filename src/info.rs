use crate::model::id::{ChannelId, GuildId, UserId};
use std::fmt;

/// Parameters needed to start communicating with a voice server.
///
/// These are produced once per connection attempt by the platform's main
/// gateway when a voice server is assigned to the client.
#[derive(Clone, Eq, PartialEq)]
pub struct ConnectionInfo {
    /// ID of the voice channel being joined.
    pub channel_id: ChannelId,
    /// Host (and optional port) of the assigned voice server.
    pub endpoint: String,
    /// ID of the guild or group call the target channel belongs to.
    pub guild_id: GuildId,
    /// Unique string describing this session, used to validate the client.
    pub session_id: String,
    /// Ephemeral secret used to validate the above session.
    pub token: String,
    /// User ID of this client.
    pub user_id: UserId,
}

impl fmt::Debug for ConnectionInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionInfo")
            .field("channel_id", &self.channel_id)
            .field("endpoint", &self.endpoint)
            .field("guild_id", &self.guild_id)
            .field("session_id", &self.session_id)
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .finish()
    }
}
