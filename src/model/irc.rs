//! IRC-specific subtype extensions.
//!
//! Each struct holds the columns of one `irc_*` joined table. Marker
//! subtypes (irc_service, irc_message, irc_event) carry no columns and have
//! no struct here.

/// Extra columns of the `irc_user` table.
#[derive(Debug, Clone, Default)]
pub struct IrcUserExt {
    /// The ident (username) portion of nick!ident@host.
    pub ident: String,
    /// Hostname or cloak the user connects from.
    pub host: String,
    /// Free-form real name (GECOS).
    pub real_name: String,
    /// Server the user is attached to.
    pub server: String,
}

/// Extra columns of the `irc_chat` table.
#[derive(Debug, Clone, Default)]
pub struct IrcChatExt {
    /// Channel topic, if one is set.
    pub topic: Option<String>,
}

/// Extra columns of the `irc_chat_user` table.
#[derive(Debug, Clone, Default)]
pub struct IrcChatUserExt {
    /// Channel operator (+o).
    pub operator: bool,
    /// Voiced (+v).
    pub voiced: bool,
}
