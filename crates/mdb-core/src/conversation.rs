//! Per-user conversation state for multi-step submissions.
//!
//! Every flow has the same shape:
//! `idle -> collecting -> confirming -> (sent | cancelled) -> idle`.
//! A user has at most one active session; entering a flow replaces whatever
//! session was active before (last write wins, no stacking).

use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::{
    config::Config,
    domain::{ChatId, MessageRef, UserId},
    errors::Error,
    Result,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowKind {
    Express,
    Support,
    ShopPartner,
    Broadcast,
}

/// The single content kind a flow accepts while collecting.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InputKind {
    Text,
    Forwarded,
}

impl FlowKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FlowKind::Express => "express",
            FlowKind::Support => "support",
            FlowKind::ShopPartner => "shop_partner",
            FlowKind::Broadcast => "broadcast",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "express" => Some(FlowKind::Express),
            "support" => Some(FlowKind::Support),
            "shop_partner" => Some(FlowKind::ShopPartner),
            "broadcast" => Some(FlowKind::Broadcast),
            _ => None,
        }
    }

    /// Classification label of the routed record.
    pub fn tag(self) -> Option<&'static str> {
        match self {
            FlowKind::Express => Some("#NewOrder"),
            FlowKind::Support => Some("#Complaint"),
            FlowKind::ShopPartner => Some("#Partnership"),
            FlowKind::Broadcast => None,
        }
    }

    pub fn accepts(self) -> InputKind {
        match self {
            FlowKind::Broadcast => InputKind::Forwarded,
            _ => InputKind::Text,
        }
    }

    /// Staff chat the eventual record routes to. Broadcast fans out instead.
    pub fn destination(self, cfg: &Config) -> Option<ChatId> {
        match self {
            FlowKind::Express => Some(cfg.express_group_id),
            FlowKind::Support | FlowKind::ShopPartner => Some(cfg.support_group_id),
            FlowKind::Broadcast => None,
        }
    }
}

/// Content captured during collection, staged until confirm or cancel.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Payload {
    Text(String),
    /// Locator of a forwarded message; the content itself is never inspected.
    Forward(MessageRef),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stage {
    Collecting,
    Confirming(Payload),
}

#[derive(Clone, Debug)]
pub struct Session {
    pub flow: FlowKind,
    pub chat: ChatId,
    pub destination: Option<ChatId>,
    pub tag: Option<&'static str>,
    pub stage: Stage,
    updated_at: Instant,
}

impl Session {
    pub fn payload(&self) -> Option<&Payload> {
        match &self.stage {
            Stage::Collecting => None,
            Stage::Confirming(p) => Some(p),
        }
    }
}

/// A session that reached its terminal confirm; the store no longer holds it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Confirmed {
    pub flow: FlowKind,
    pub destination: Option<ChatId>,
    pub tag: Option<&'static str>,
    pub payload: Payload,
}

/// An inbound message, reduced to what the collecting guard needs.
#[derive(Clone, Copy, Debug)]
pub struct Input<'a> {
    pub text: Option<&'a str>,
    pub forwarded: bool,
    pub locator: MessageRef,
}

impl Input<'_> {
    fn payload_for(&self, kind: InputKind) -> Option<Payload> {
        match kind {
            InputKind::Text => self.text.map(|t| Payload::Text(t.to_string())),
            InputKind::Forwarded => self.forwarded.then_some(Payload::Forward(self.locator)),
        }
    }
}

pub struct SessionStore {
    sessions: Mutex<HashMap<UserId, Session>>,
    idle_timeout: Option<Duration>,
}

impl SessionStore {
    pub fn new(idle_timeout: Option<Duration>) -> Self {
        Self {
            sessions: Mutex::new(HashMap::new()),
            idle_timeout,
        }
    }

    fn is_stale(&self, s: &Session, now: Instant) -> bool {
        self.idle_timeout
            .is_some_and(|ttl| now.saturating_duration_since(s.updated_at) >= ttl)
    }

    /// Fetch the live session for `user` in `chat`, reaping it first if it went idle.
    fn live<'a>(
        &self,
        map: &'a mut HashMap<UserId, Session>,
        user: UserId,
        chat: ChatId,
        now: Instant,
    ) -> Option<&'a mut Session> {
        if map.get(&user).is_some_and(|s| self.is_stale(s, now)) {
            if let Some(old) = map.remove(&user) {
                info!("Session {:?} of user {} expired while idle", old.flow, user.0);
            }
            return None;
        }
        map.get_mut(&user).filter(|s| s.chat == chat)
    }

    /// Enter `flow` for `user`, replacing any active session.
    ///
    /// Returns the flow that was replaced, if any.
    pub async fn begin(
        &self,
        user: UserId,
        chat: ChatId,
        flow: FlowKind,
        destination: Option<ChatId>,
        now: Instant,
    ) -> Option<FlowKind> {
        let session = Session {
            flow,
            chat,
            destination,
            tag: flow.tag(),
            stage: Stage::Collecting,
            updated_at: now,
        };
        let replaced = self.sessions.lock().await.insert(user, session);
        if let Some(old) = &replaced {
            debug!(
                "User {} entered {:?}, replacing {:?}",
                user.0, flow, old.flow
            );
        }
        replaced.map(|s| s.flow)
    }

    pub async fn current(&self, user: UserId, chat: ChatId, now: Instant) -> Option<Session> {
        let mut map = self.sessions.lock().await;
        self.live(&mut map, user, chat, now).cloned()
    }

    /// Stage `input` as the payload of a collecting session.
    ///
    /// The wrong content kind is rejected in place: the session is left untouched.
    pub async fn capture(
        &self,
        user: UserId,
        chat: ChatId,
        input: Input<'_>,
        now: Instant,
    ) -> Result<Payload> {
        let mut map = self.sessions.lock().await;
        let Some(session) = self.live(&mut map, user, chat, now) else {
            return Err(Error::NotFound("no active conversation".to_string()));
        };
        if session.stage != Stage::Collecting {
            return Err(Error::InvalidInput(
                "awaiting confirmation, not new input".to_string(),
            ));
        }

        let kind = session.flow.accepts();
        let Some(payload) = input.payload_for(kind) else {
            return Err(Error::InvalidInput(format!("{kind:?} input required")));
        };

        session.stage = Stage::Confirming(payload.clone());
        session.updated_at = now;
        Ok(payload)
    }

    /// Remove a confirming session so its terminal action runs at most once.
    ///
    /// Sessions still collecting are left in place and `None` is returned.
    pub async fn take_confirmed(
        &self,
        user: UserId,
        chat: ChatId,
        now: Instant,
    ) -> Option<Confirmed> {
        let mut map = self.sessions.lock().await;
        let session = self.live(&mut map, user, chat, now)?;
        if session.payload().is_none() {
            return None;
        }
        let session = map.remove(&user)?;
        match session.stage {
            Stage::Confirming(payload) => Some(Confirmed {
                flow: session.flow,
                destination: session.destination,
                tag: session.tag,
                payload,
            }),
            Stage::Collecting => None,
        }
    }

    /// Drop the session of `user` regardless of stage. Returns whether one existed.
    pub async fn cancel(&self, user: UserId) -> bool {
        self.sessions.lock().await.remove(&user).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::MessageId;

    const U: UserId = UserId(42);
    const CHAT: ChatId = ChatId(42);

    fn locator(id: i32) -> MessageRef {
        MessageRef {
            chat_id: CHAT,
            message_id: MessageId(id),
        }
    }

    fn text(t: &str) -> Input<'_> {
        Input {
            text: Some(t),
            forwarded: false,
            locator: locator(1),
        }
    }

    fn photo() -> Input<'static> {
        Input {
            text: None,
            forwarded: false,
            locator: locator(2),
        }
    }

    #[tokio::test]
    async fn collects_then_confirms_once() {
        let store = SessionStore::new(None);
        let now = Instant::now();
        assert_eq!(
            store
                .begin(U, CHAT, FlowKind::Express, Some(ChatId(-100)), now)
                .await,
            None
        );

        let p = store
            .capture(U, CHAT, text("Astana sofa 2 seats 25k"), now)
            .await
            .unwrap();
        assert_eq!(p, Payload::Text("Astana sofa 2 seats 25k".into()));

        let c = store.take_confirmed(U, CHAT, now).await.unwrap();
        assert_eq!(c.flow, FlowKind::Express);
        assert_eq!(c.destination, Some(ChatId(-100)));
        assert_eq!(c.tag, Some("#NewOrder"));

        assert!(store.take_confirmed(U, CHAT, now).await.is_none());
        assert!(store.current(U, CHAT, now).await.is_none());
    }

    #[tokio::test]
    async fn wrong_content_kind_leaves_state_unchanged() {
        let store = SessionStore::new(None);
        let now = Instant::now();
        store.begin(U, CHAT, FlowKind::Support, None, now).await;

        let err = store.capture(U, CHAT, photo(), now).await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));

        let s = store.current(U, CHAT, now).await.unwrap();
        assert_eq!(s.stage, Stage::Collecting);
        assert!(s.payload().is_none());
    }

    #[tokio::test]
    async fn broadcast_accepts_only_forwards() {
        let store = SessionStore::new(None);
        let now = Instant::now();
        store.begin(U, CHAT, FlowKind::Broadcast, None, now).await;

        assert!(store.capture(U, CHAT, text("hello"), now).await.is_err());

        let fwd = Input {
            text: Some("hello"),
            forwarded: true,
            locator: locator(9),
        };
        let p = store.capture(U, CHAT, fwd, now).await.unwrap();
        assert_eq!(p, Payload::Forward(locator(9)));
    }

    #[tokio::test]
    async fn new_flow_replaces_active_session() {
        let store = SessionStore::new(None);
        let now = Instant::now();
        store.begin(U, CHAT, FlowKind::Express, None, now).await;
        store.capture(U, CHAT, text("order"), now).await.unwrap();

        let replaced = store.begin(U, CHAT, FlowKind::Support, None, now).await;
        assert_eq!(replaced, Some(FlowKind::Express));

        let s = store.current(U, CHAT, now).await.unwrap();
        assert_eq!(s.flow, FlowKind::Support);
        assert!(s.payload().is_none());
    }

    #[tokio::test]
    async fn second_capture_while_confirming_is_rejected() {
        let store = SessionStore::new(None);
        let now = Instant::now();
        store.begin(U, CHAT, FlowKind::Express, None, now).await;
        store.capture(U, CHAT, text("first"), now).await.unwrap();
        assert!(store.capture(U, CHAT, text("second"), now).await.is_err());

        let c = store.take_confirmed(U, CHAT, now).await.unwrap();
        assert_eq!(c.payload, Payload::Text("first".into()));
    }

    #[tokio::test]
    async fn confirm_while_collecting_keeps_session() {
        let store = SessionStore::new(None);
        let now = Instant::now();
        store.begin(U, CHAT, FlowKind::Express, None, now).await;
        assert!(store.take_confirmed(U, CHAT, now).await.is_none());
        assert!(store.current(U, CHAT, now).await.is_some());
    }

    #[tokio::test]
    async fn sessions_are_bound_to_their_chat() {
        let store = SessionStore::new(None);
        let now = Instant::now();
        store.begin(U, CHAT, FlowKind::Express, None, now).await;
        assert!(store.current(U, ChatId(-5), now).await.is_none());
        assert!(store.capture(U, ChatId(-5), text("x"), now).await.is_err());
        assert!(store.current(U, CHAT, now).await.is_some());
    }

    #[tokio::test]
    async fn users_do_not_share_sessions() {
        let store = SessionStore::new(None);
        let now = Instant::now();
        let other = UserId(7);
        store.begin(U, CHAT, FlowKind::Express, None, now).await;
        store.begin(other, ChatId(7), FlowKind::Support, None, now).await;

        assert!(store.cancel(U).await);
        assert!(!store.cancel(U).await);
        assert_eq!(
            store.current(other, ChatId(7), now).await.map(|s| s.flow),
            Some(FlowKind::Support)
        );
    }

    #[tokio::test]
    async fn idle_sessions_expire_when_timeout_is_set() {
        let store = SessionStore::new(Some(Duration::from_secs(60)));
        let t0 = Instant::now();
        store.begin(U, CHAT, FlowKind::Express, None, t0).await;
        assert!(store
            .current(U, CHAT, t0 + Duration::from_secs(59))
            .await
            .is_some());
        assert!(store
            .current(U, CHAT, t0 + Duration::from_secs(60))
            .await
            .is_none());
        // Reaped, not just hidden.
        assert!(!store.cancel(U).await);
    }

    #[test]
    fn flow_names_round_trip_through_storage_keys() {
        for f in [
            FlowKind::Express,
            FlowKind::Support,
            FlowKind::ShopPartner,
            FlowKind::Broadcast,
        ] {
            assert_eq!(FlowKind::parse(f.as_str()), Some(f));
        }
        assert_eq!(FlowKind::parse("nope"), None);
    }
}
