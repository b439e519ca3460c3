//! Entity records for the chat-log data model.
//!
//! Each polymorphic entity is a base struct carrying the shared columns plus
//! a `kind` enum selecting the subtype; the `Irc` variants hold the columns
//! of the joined `irc_*` table. The discriminator string stored in the base
//! row's `*_type` column round-trips through `discriminator()` on the kind.
//!
//! Ids are `Option<i64>`: `None` while transient, assigned by the repository
//! on first insert. Equality and hashing follow persisted identity, see
//! [`identity`].

pub mod identity;
pub mod irc;

pub use identity::{EntityKey, Identity};
pub use irc::{IrcChatExt, IrcChatUserExt, IrcUserExt};

use identity::impl_identity;

/// A messaging platform/network instance, e.g. one IRC network.
#[derive(Debug, Clone)]
pub struct Service {
    pub id: Option<i64>,
    pub kind: ServiceKind,
    pub name: String,
    pub identifier: String,
}

/// Subtype of a [`Service`] row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceKind {
    Plain,
    /// Marker subtype, no extra columns.
    Irc,
}

impl ServiceKind {
    pub const BASE: &'static str = "service";
    pub const IRC: &'static str = "irc_service";

    pub fn discriminator(&self) -> &'static str {
        match self {
            Self::Plain => Self::BASE,
            Self::Irc => Self::IRC,
        }
    }
}

impl Service {
    pub fn new(kind: ServiceKind, name: impl Into<String>, identifier: impl Into<String>) -> Self {
        Self {
            id: None,
            kind,
            name: name.into(),
            identifier: identifier.into(),
        }
    }
}

impl_identity!(Service, "service");

/// A participant, scoped to exactly one [`Service`].
#[derive(Debug, Clone)]
pub struct User {
    pub id: Option<i64>,
    pub kind: UserKind,
    pub service_id: i64,
    pub name: String,
    pub identifier: String,
}

/// Subtype of a [`User`] row.
#[derive(Debug, Clone)]
pub enum UserKind {
    Plain,
    Irc(IrcUserExt),
}

impl UserKind {
    pub const BASE: &'static str = "user";
    pub const IRC: &'static str = "irc_user";

    pub fn discriminator(&self) -> &'static str {
        match self {
            Self::Plain => Self::BASE,
            Self::Irc(_) => Self::IRC,
        }
    }
}

impl User {
    pub fn new(
        kind: UserKind,
        service_id: i64,
        name: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            kind,
            service_id,
            name: name.into(),
            identifier: identifier.into(),
        }
    }
}

impl_identity!(User, "user");

/// A conversation/channel, scoped to exactly one [`Service`].
#[derive(Debug, Clone)]
pub struct Chat {
    pub id: Option<i64>,
    pub kind: ChatKind,
    pub service_id: i64,
    pub name: String,
    pub identifier: String,
}

/// Subtype of a [`Chat`] row.
#[derive(Debug, Clone)]
pub enum ChatKind {
    Plain,
    Irc(IrcChatExt),
}

impl ChatKind {
    pub const BASE: &'static str = "chat";
    pub const IRC: &'static str = "irc_chat";

    pub fn discriminator(&self) -> &'static str {
        match self {
            Self::Plain => Self::BASE,
            Self::Irc(_) => Self::IRC,
        }
    }
}

impl Chat {
    pub fn new(
        kind: ChatKind,
        service_id: i64,
        name: impl Into<String>,
        identifier: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            kind,
            service_id,
            name: name.into(),
            identifier: identifier.into(),
        }
    }
}

impl_identity!(Chat, "chat");

/// A membership linking one [`User`] to one [`Chat`].
///
/// Realized as its own entity rather than a plain junction table because it
/// carries state of its own. At most one membership per (chat, user) pair.
#[derive(Debug, Clone)]
pub struct ChatUser {
    pub id: Option<i64>,
    pub kind: ChatUserKind,
    pub chat_id: i64,
    pub user_id: i64,
    /// Whether the user is currently present in the chat.
    pub active: bool,
}

/// Subtype of a [`ChatUser`] row.
#[derive(Debug, Clone)]
pub enum ChatUserKind {
    Plain,
    Irc(IrcChatUserExt),
}

impl ChatUserKind {
    pub const BASE: &'static str = "chat_user";
    pub const IRC: &'static str = "irc_chat_user";

    pub fn discriminator(&self) -> &'static str {
        match self {
            Self::Plain => Self::BASE,
            Self::Irc(_) => Self::IRC,
        }
    }
}

impl ChatUser {
    pub fn new(kind: ChatUserKind, chat_id: i64, user_id: i64) -> Self {
        Self {
            id: None,
            kind,
            chat_id,
            user_id,
            active: false,
        }
    }

    /// Memberships have no name of their own; the id stands in.
    pub fn name(&self) -> Option<i64> {
        self.id
    }
}

impl_identity!(ChatUser, "chat_user");

/// A logged message referencing a [`Service`] and optionally a chat and user.
///
/// The chat/user references stay nullable so the log outlives its subjects.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: Option<i64>,
    pub kind: MessageKind,
    pub service_id: i64,
    pub chat_id: Option<i64>,
    pub user_id: Option<i64>,
    /// Free-text message body.
    pub message: String,
    /// Unix timestamp, stamped by the repository on insert.
    pub created_at: i64,
}

/// Subtype of a [`Message`] row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageKind {
    Plain,
    /// Marker subtype, no extra columns.
    Irc,
}

impl MessageKind {
    pub const BASE: &'static str = "message";
    pub const IRC: &'static str = "irc_message";

    pub fn discriminator(&self) -> &'static str {
        match self {
            Self::Plain => Self::BASE,
            Self::Irc => Self::IRC,
        }
    }
}

impl Message {
    pub fn new(
        kind: MessageKind,
        service_id: i64,
        chat_id: Option<i64>,
        user_id: Option<i64>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            id: None,
            kind,
            service_id,
            chat_id,
            user_id,
            message: message.into(),
            created_at: 0,
        }
    }
}

impl_identity!(Message, "message");

/// A logged state change, e.g. a nick change or topic change.
#[derive(Debug, Clone)]
pub struct Event {
    pub id: Option<i64>,
    pub kind: EventKind,
    pub service_id: i64,
    pub chat_id: Option<i64>,
    pub user_id: Option<i64>,
    /// What happened, e.g. "nick" or "topic".
    pub event: String,
    pub new_value: Option<String>,
    pub old_value: Option<String>,
    /// Unix timestamp, stamped by the repository on insert.
    pub created_at: i64,
}

/// Subtype of an [`Event`] row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    Plain,
    /// Marker subtype, no extra columns.
    Irc,
}

impl EventKind {
    pub const BASE: &'static str = "event";
    pub const IRC: &'static str = "irc_event";

    pub fn discriminator(&self) -> &'static str {
        match self {
            Self::Plain => Self::BASE,
            Self::Irc => Self::IRC,
        }
    }
}

impl Event {
    pub fn new(
        kind: EventKind,
        service_id: i64,
        chat_id: Option<i64>,
        user_id: Option<i64>,
        event: impl Into<String>,
        new_value: Option<String>,
        old_value: Option<String>,
    ) -> Self {
        Self {
            id: None,
            kind,
            service_id,
            chat_id,
            user_id,
            event: event.into(),
            new_value,
            old_value,
            created_at: 0,
        }
    }
}

impl_identity!(Event, "event");

/// An authorized bot operator. Standalone, not part of the service graph.
#[derive(Debug, Clone)]
pub struct BotUser {
    pub id: Option<i64>,
    pub name: String,
}

impl BotUser {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
        }
    }
}

impl_identity!(BotUser, "bot_user");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_discriminator_round_trip() {
        assert_eq!(ServiceKind::Plain.discriminator(), "service");
        assert_eq!(ServiceKind::Irc.discriminator(), "irc_service");
        assert_eq!(UserKind::Plain.discriminator(), "user");
        assert_eq!(
            UserKind::Irc(IrcUserExt::default()).discriminator(),
            "irc_user"
        );
        assert_eq!(
            ChatKind::Irc(IrcChatExt::default()).discriminator(),
            "irc_chat"
        );
        assert_eq!(
            ChatUserKind::Irc(IrcChatUserExt::default()).discriminator(),
            "irc_chat_user"
        );
        assert_eq!(MessageKind::Irc.discriminator(), "irc_message");
        assert_eq!(EventKind::Irc.discriminator(), "irc_event");
    }

    #[test]
    fn test_transient_entities_of_same_type_unequal() {
        let a = Service::new(ServiceKind::Irc, "freenode", "irc.freenode.net");
        let b = Service::new(ServiceKind::Irc, "freenode", "irc.freenode.net");
        assert_ne!(a, b);
    }

    #[test]
    fn test_persisted_services_equal_iff_same_id() {
        let mut a = Service::new(ServiceKind::Plain, "a", "a");
        let mut b = Service::new(ServiceKind::Plain, "b", "b");
        a.id = Some(1);
        b.id = Some(1);
        assert_eq!(a, b);

        b.id = Some(2);
        assert_ne!(a, b);
    }

    #[test]
    fn test_chat_user_name_is_its_id() {
        let mut membership = ChatUser::new(ChatUserKind::Plain, 1, 2);
        assert_eq!(membership.name(), None);
        membership.id = Some(9);
        assert_eq!(membership.name(), Some(9));
    }
}
