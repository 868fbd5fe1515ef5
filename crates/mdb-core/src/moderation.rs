//! Ban/unban and broadcast fan-out, gated by the admin allow-list.

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use tokio::time::sleep;
use tracing::{info, warn};

use crate::{
    audit::{AuditEvent, AuditLogger},
    config::Config,
    domain::{ChatId, MessageRef, UserId},
    errors::Error,
    messaging::port::MessagingPort,
    security::is_privileged,
    storage::Database,
    views, Result,
};

/// Who asks for a moderation action.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Actor {
    User(UserId),
    /// The age gate and the captcha-escalation button. Not re-authenticated.
    System,
}

impl Actor {
    fn audit_id(self) -> Option<i64> {
        match self {
            Actor::User(u) => Some(u.0),
            Actor::System => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub total: usize,
}

pub struct Moderation {
    cfg: Arc<Config>,
    db: Arc<Database>,
    messenger: Arc<dyn MessagingPort>,
    audit: AuditLogger,
}

impl Moderation {
    pub fn new(
        cfg: Arc<Config>,
        db: Arc<Database>,
        messenger: Arc<dyn MessagingPort>,
        audit: AuditLogger,
    ) -> Self {
        Self {
            cfg,
            db,
            messenger,
            audit,
        }
    }

    pub fn is_privileged(&self, user: UserId) -> bool {
        is_privileged(Some(user), &self.cfg.admins)
    }

    fn authorize(&self, actor: Actor) -> Result<()> {
        match actor {
            Actor::System => Ok(()),
            Actor::User(u) if self.is_privileged(u) => Ok(()),
            Actor::User(u) => {
                warn!("User {} denied a moderation action", u.0);
                Err(Error::PermissionDenied)
            }
        }
    }

    pub fn ban(&self, actor: Actor, target: UserId, hours: i64) -> Result<DateTime<Utc>> {
        self.ban_at(actor, target, hours, Utc::now())
    }

    /// Ban `target` until `now + hours`. Returns the expiry.
    ///
    /// A window that does not fit a timestamp is `Error::InvalidInput`.
    pub fn ban_at(
        &self,
        actor: Actor,
        target: UserId,
        hours: i64,
        now: DateTime<Utc>,
    ) -> Result<DateTime<Utc>> {
        self.authorize(actor)?;
        let until = Duration::try_hours(hours)
            .and_then(|d| now.checked_add_signed(d))
            .ok_or_else(|| Error::InvalidInput(format!("ban of {hours}h is out of range")))?;
        self.db.set_ban(target, until)?;

        info!("User {} banned for {hours}h by {:?}", target.0, actor);
        self.audit.record(AuditEvent::ban(
            actor.audit_id(),
            target.0,
            hours,
            if actor == Actor::System { "age gate" } else { "admin" },
        ));
        Ok(until)
    }

    /// Lift the ban and notify the target. Returns whether the notice got through.
    ///
    /// Unbanning a user who is not banned is a no-op, not an error.
    pub async fn unban(&self, actor: Actor, target: UserId) -> Result<bool> {
        self.authorize(actor)?;
        self.db.clear_ban(target)?;

        let notified = match self
            .messenger
            .send_html(ChatId::from(target), views::unban_notice())
            .await
        {
            Ok(_) => true,
            Err(e) => {
                warn!("Failed to notify user {} after unban: {e}", target.0);
                false
            }
        };

        info!("User {} unbanned by {:?}", target.0, actor);
        self.audit
            .record(AuditEvent::unban(actor.audit_id(), target.0, notified));
        Ok(notified)
    }

    /// Forward `source` to every registered user.
    ///
    /// Recipients are fixed when the run starts. A failing recipient is skipped.
    pub async fn broadcast(&self, actor: Actor, source: MessageRef) -> Result<BroadcastReport> {
        let Actor::User(admin) = actor else {
            return Err(Error::PermissionDenied);
        };
        self.authorize(actor)?;

        let recipients = self.db.all_user_ids()?;
        let total = recipients.len();
        let mut delivered = 0usize;
        info!("Broadcast by {} to {total} users started", admin.0);

        for (i, user) in recipients.into_iter().enumerate() {
            if i > 0 && !self.cfg.broadcast_delay.is_zero() {
                sleep(self.cfg.broadcast_delay).await;
            }
            match self
                .messenger
                .forward_message(ChatId::from(user), source)
                .await
            {
                Ok(_) => delivered += 1,
                Err(e) => warn!("Failed to forward broadcast to user {}: {e}", user.0),
            }
        }

        info!("Broadcast by {} finished: {delivered}/{total}", admin.0);
        self.audit
            .record(AuditEvent::broadcast(admin.0, delivered, total));
        Ok(BroadcastReport { delivered, total })
    }

    /// Declined age attestation: ban for the configured window.
    pub fn age_gate_reject(&self, user: UserId) -> Result<DateTime<Utc>> {
        self.ban(Actor::System, user, self.cfg.ban_hours)
    }
}
