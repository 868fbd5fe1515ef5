//! Update dispatch: turns transport-neutral updates into catalog views,
//! conversation transitions and moderation actions.

use std::{path::PathBuf, sync::Arc, time::Instant};

use chrono::Utc;
use tracing::{debug, error, info, warn};

use crate::{
    actions::{Action, SupportTopic},
    audit::{AuditEvent, AuditLogger},
    catalog::DirectoryStore,
    config::Config,
    conversation::{Confirmed, FlowKind, Input, InputKind, Payload, SessionStore},
    domain::{ChatId, ChatKind, MessageRef, UserId},
    errors::Error,
    formatting::record_timestamp,
    messaging::{
        port::MessagingPort,
        types::{CallbackQuery, Command, IncomingMessage, IncomingUpdate, InlineKeyboard, RepliedMessage},
    },
    moderation::{Actor, Moderation},
    storage::{routes::RoutedRecord, Database},
    views, Result,
};

/// Telegram rejects photo captions longer than this; such cards go out as text.
const CAPTION_LIMIT: usize = 1024;

pub struct App {
    cfg: Arc<Config>,
    db: Arc<Database>,
    catalog: Arc<dyn DirectoryStore>,
    messenger: Arc<dyn MessagingPort>,
    sessions: SessionStore,
    moderation: Moderation,
    audit: AuditLogger,
}

fn callback_chat(q: &CallbackQuery) -> ChatId {
    q.message
        .map(|m| m.chat_id)
        .unwrap_or_else(|| ChatId::from(q.from.id))
}

fn reply_chat(update: &IncomingUpdate) -> ChatId {
    match update {
        IncomingUpdate::Command(c) => c.chat.id,
        IncomingUpdate::Message(m) => m.chat.id,
        IncomingUpdate::Callback(q) => callback_chat(q),
    }
}

impl App {
    pub fn new(
        cfg: Arc<Config>,
        db: Arc<Database>,
        catalog: Arc<dyn DirectoryStore>,
        messenger: Arc<dyn MessagingPort>,
        audit: AuditLogger,
    ) -> Self {
        let moderation = Moderation::new(cfg.clone(), db.clone(), messenger.clone(), audit.clone());
        Self {
            sessions: SessionStore::new(cfg.session_idle_timeout),
            cfg,
            db,
            catalog,
            messenger,
            moderation,
            audit,
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// Handle one update. Failures are reported to the requester and returned for logging.
    pub async fn handle(&self, update: IncomingUpdate) -> Result<()> {
        let result = match &update {
            IncomingUpdate::Command(c) => self.on_command(c).await,
            IncomingUpdate::Message(m) => self.on_message(m).await,
            IncomingUpdate::Callback(q) => self.on_callback(q).await,
        };

        if let Err(e) = &result {
            let user = update.from_user().id.0;
            if e.is_storage() {
                error!("Storage failure handling update from user {user}: {e}");
            } else {
                warn!("Update from user {user} failed: {e}");
            }
            let chat = reply_chat(&update);
            if let Err(send_err) = self
                .messenger
                .send_html(chat, views::generic_failure())
                .await
            {
                warn!("Failed to report failure to chat {}: {send_err}", chat.0);
            }
        }
        result
    }

    fn stamp(&self) -> String {
        record_timestamp(Utc::now(), self.cfg.timestamp_utc_offset_hours)
    }

    /// Ban gate. Banned users get the blocked notice and `false`.
    async fn admit(&self, user: UserId, chat: ChatId) -> Result<bool> {
        let now = Utc::now();
        if !self.db.is_banned_at(user, now)? {
            return Ok(true);
        }
        let expiry = self.db.ban_expiry(user)?;
        info!("Blocked update from banned user {}", user.0);
        self.messenger
            .send_html(chat, &views::blocked_notice(expiry, now))
            .await?;
        Ok(false)
    }

    // ============== Commands ==============

    async fn on_command(&self, c: &Command) -> Result<()> {
        if c.chat.kind == ChatKind::Private && !self.admit(c.from.id, c.chat.id).await? {
            return Ok(());
        }

        match c.name.as_str() {
            "start" => self.cmd_start(c).await,
            "admin" | "chatid" | "statistic" | "send" => self.cmd_admin(c).await,
            "ban" => self.cmd_ban(c).await,
            "unban" => self.cmd_unban(c).await,
            other => {
                debug!("Ignoring unknown command /{other} from {}", c.from.id.0);
                Ok(())
            }
        }
    }

    async fn cmd_start(&self, c: &Command) -> Result<()> {
        if c.chat.kind != ChatKind::Private {
            self.messenger
                .send_html(c.chat.id, views::private_only())
                .await?;
            return Ok(());
        }

        let user = &c.from;
        if self.db.register_user(user.id, user.username.as_deref())? {
            info!("New user {} registered", user.id.0);
        }
        self.sessions.cancel(user.id).await;

        let (text, kb) = views::age_prompt();
        self.send_card(c.chat.id, &text, kb, self.cfg.media_file("captcha.jpg"))
            .await?;
        info!("User {} started the bot", user.id.0);
        Ok(())
    }

    async fn cmd_admin(&self, c: &Command) -> Result<()> {
        let chat = c.chat.id;
        if c.chat.kind != ChatKind::Private {
            self.messenger.send_html(chat, views::private_only()).await?;
            return Ok(());
        }
        if !self.moderation.is_privileged(c.from.id) {
            self.messenger.send_html(chat, views::no_admin_rights()).await?;
            return Ok(());
        }

        match c.name.as_str() {
            "admin" => {
                self.messenger.send_html(chat, views::admin_panel()).await?;
            }
            "chatid" => {
                self.messenger.send_html(chat, &views::chat_id(chat)).await?;
            }
            "statistic" => {
                let users = self.db.user_count()?;
                let clicks = self.db.click_stats()?;
                self.messenger
                    .send_html(chat, &views::statistics(users, &clicks))
                    .await?;
            }
            _ => {
                self.sessions
                    .begin(c.from.id, chat, FlowKind::Broadcast, None, Instant::now())
                    .await;
                self.messenger
                    .send_html(chat, views::broadcast_prompt())
                    .await?;
            }
        }
        info!("Admin {} ran /{}", c.from.id.0, c.name);
        Ok(())
    }

    /// Whether `/ban` and `/unban` may run here, replying with the refusal if not.
    async fn moderation_allowed(&self, c: &Command) -> Result<bool> {
        if c.chat.kind != ChatKind::Private && !self.cfg.is_staff_chat(c.chat.id) {
            self.messenger
                .send_html(c.chat.id, views::staff_chats_only())
                .await?;
            return Ok(false);
        }
        if !self.moderation.is_privileged(c.from.id) {
            self.messenger
                .send_html(c.chat.id, views::no_admin_rights())
                .await?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Target named by replying: the author, or the submitter behind a routed record.
    fn reply_target(&self, reply: Option<&RepliedMessage>) -> Result<Option<UserId>> {
        let Some(reply) = reply else {
            return Ok(None);
        };
        if reply.from_bot {
            return Ok(self.db.find_route(reply.message)?.map(|r| r.submitter));
        }
        Ok(reply.from.as_ref().map(|u| u.id))
    }

    async fn cmd_ban(&self, c: &Command) -> Result<()> {
        if !self.moderation_allowed(c).await? {
            return Ok(());
        }

        let mut args = c.args.split_whitespace();
        let target = match self.reply_target(c.reply_to.as_ref())? {
            Some(t) => Some(t),
            None => args.next().and_then(|a| a.parse::<i64>().ok()).map(UserId),
        };
        let hours = match args.next() {
            None => Some(self.cfg.ban_hours),
            Some(h) => h.parse::<i64>().ok().filter(|h| *h > 0),
        };
        let (Some(target), Some(hours)) = (target, hours) else {
            self.messenger.send_html(c.chat.id, views::ban_usage()).await?;
            return Ok(());
        };

        let text = match self.moderation.ban(Actor::User(c.from.id), target, hours) {
            Ok(until) => views::banned(target, until),
            Err(Error::PermissionDenied) => views::no_admin_rights().to_string(),
            Err(Error::InvalidInput(_)) => views::ban_usage().to_string(),
            Err(e) => return Err(e),
        };
        self.messenger.send_html(c.chat.id, &text).await?;
        Ok(())
    }

    async fn cmd_unban(&self, c: &Command) -> Result<()> {
        if !self.moderation_allowed(c).await? {
            return Ok(());
        }

        let target = match self.reply_target(c.reply_to.as_ref())? {
            Some(t) => Some(t),
            None => c
                .args
                .split_whitespace()
                .next()
                .and_then(|a| a.parse::<i64>().ok())
                .map(UserId),
        };
        let Some(target) = target else {
            self.messenger
                .send_html(c.chat.id, views::unban_usage())
                .await?;
            return Ok(());
        };

        let text = match self.moderation.unban(Actor::User(c.from.id), target).await {
            Ok(_) => views::unbanned(target),
            Err(Error::PermissionDenied) => views::no_admin_rights().to_string(),
            Err(e) => return Err(e),
        };
        self.messenger.send_html(c.chat.id, &text).await?;
        Ok(())
    }

    // ============== Messages ==============

    async fn on_message(&self, m: &IncomingMessage) -> Result<()> {
        if self.cfg.is_staff_chat(m.chat.id) {
            return self.relay_staff_reply(m).await;
        }
        if m.chat.kind != ChatKind::Private {
            return Ok(());
        }
        if !self.admit(m.from.id, m.chat.id).await? {
            return Ok(());
        }
        if self.relay_user_reply(m).await? {
            return Ok(());
        }
        self.collect(m).await
    }

    fn replied_route(&self, m: &IncomingMessage) -> Result<Option<RoutedRecord>> {
        match &m.reply_to {
            Some(r) if r.from_bot => self.db.find_route(r.message),
            _ => Ok(None),
        }
    }

    /// Staff reply to a routed record: relay it to the submitter.
    async fn relay_staff_reply(&self, m: &IncomingMessage) -> Result<()> {
        let Some(route) = self.replied_route(m)? else {
            return Ok(());
        };
        let Some(text) = m.text() else {
            debug!("Ignoring non-text staff reply in chat {}", m.chat.id.0);
            return Ok(());
        };

        let body = views::staff_response(route.flow, &m.from, text, &self.stamp());
        let sent = match self
            .messenger
            .send_html(ChatId::from(route.submitter), &body)
            .await
        {
            Ok(at) => at,
            Err(e) => {
                warn!(
                    "Failed to relay staff reply to user {}: {e}",
                    route.submitter.0
                );
                self.messenger
                    .send_html(m.chat.id, views::relay_failed())
                    .await?;
                return Ok(());
            }
        };

        self.db.save_route(RoutedRecord {
            message: sent,
            ..route
        })?;
        self.messenger
            .send_html(m.chat.id, views::staff_ack(route.flow))
            .await?;
        info!(
            "Staff {} replied to user {} from chat {}",
            m.from.id.0, route.submitter.0, m.chat.id.0
        );
        Ok(())
    }

    /// Submitter reply to a relayed staff response: route it back to that staff chat.
    async fn relay_user_reply(&self, m: &IncomingMessage) -> Result<bool> {
        let Some(route) = self.replied_route(m)? else {
            return Ok(false);
        };
        if route.submitter != m.from.id {
            return Ok(false);
        }
        let Some(text) = m.text() else {
            self.messenger.send_html(m.chat.id, views::text_only()).await?;
            return Ok(true);
        };

        let body = views::compose_record("#UserReply", &m.from, text, &self.stamp());
        let at = self
            .messenger
            .send_inline_keyboard(route.staff_chat, &body, views::record_keyboard(m.from.id))
            .await?;
        self.db.save_route(RoutedRecord { message: at, ..route })?;
        self.messenger
            .send_html(m.chat.id, views::user_reply_ack())
            .await?;
        info!(
            "User {} replied to staff chat {}",
            m.from.id.0, route.staff_chat.0
        );
        Ok(true)
    }

    /// Feed a private message into the user's active flow, if any.
    async fn collect(&self, m: &IncomingMessage) -> Result<()> {
        let now = Instant::now();
        let user = m.from.id;
        let Some(session) = self.sessions.current(user, m.chat.id, now).await else {
            debug!("No active flow for user {}, ignoring message", user.0);
            return Ok(());
        };
        if session.payload().is_some() {
            debug!("User {} is confirming, ignoring message", user.0);
            return Ok(());
        }

        let input = Input {
            text: m.text(),
            forwarded: m.forwarded,
            locator: m.message,
        };
        match self.sessions.capture(user, m.chat.id, input, now).await {
            Ok(payload) => {
                // The forwarded source must survive: broadcast forwards it by reference.
                if matches!(payload, Payload::Text(_)) {
                    self.delete_quietly(Some(m.message)).await;
                }
                let (text, kb) = views::confirmation_card(session.flow, &payload);
                self.messenger
                    .send_inline_keyboard(m.chat.id, &text, kb)
                    .await?;
                info!("User {} staged input for {:?}", user.0, session.flow);
                Ok(())
            }
            Err(Error::InvalidInput(reason)) => {
                info!("User {} input rejected for {:?}: {reason}", user.0, session.flow);
                let notice = match session.flow.accepts() {
                    InputKind::Text => views::text_only(),
                    InputKind::Forwarded => views::forward_only(),
                };
                self.messenger.send_html(m.chat.id, notice).await?;
                Ok(())
            }
            Err(Error::NotFound(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    // ============== Callbacks ==============

    async fn on_callback(&self, q: &CallbackQuery) -> Result<()> {
        let outcome = self.dispatch_callback(q).await;
        let note = match &outcome {
            Ok(note) => note.as_deref(),
            Err(_) => None,
        };
        if let Err(e) = self
            .messenger
            .answer_callback_query(&q.callback_id, note)
            .await
        {
            debug!("Failed to answer callback {}: {e}", q.callback_id);
        }
        outcome.map(|_| ())
    }

    /// Returns an optional popup text for the callback answer.
    async fn dispatch_callback(&self, q: &CallbackQuery) -> Result<Option<String>> {
        let user = q.from.id;
        let chat = callback_chat(q);
        let Some(action) = Action::parse(&q.data) else {
            debug!("Unknown callback data '{}' from {}", q.data, user.0);
            return Ok(None);
        };

        let private = q.chat_kind.map_or(true, |k| k == ChatKind::Private);
        if private && action != Action::ReportError && !self.admit(user, chat).await? {
            return Ok(None);
        }

        match action {
            Action::AgeConfirm => {
                self.show_menu(q, chat).await?;
                info!("User {} confirmed the age check", user.0);
            }
            Action::AgeDecline => {
                self.moderation.age_gate_reject(user)?;
                let (text, kb) = views::access_denied();
                self.replace(q, chat, &text, kb, None).await?;
                info!("User {} declined the age check and was blocked", user.0);
            }
            Action::ReportError => self.escalate_captcha(q).await?,
            Action::Unban(target) => {
                self.moderation.unban(Actor::System, target).await?;
                if let Some(msg) = q.message {
                    self.messenger
                        .edit_html(msg, &views::unbanned_from_staff(target), None)
                        .await?;
                }
            }
            Action::Info(target) => {
                let first_seen = self.db.first_seen(target)?;
                return Ok(Some(views::user_info(target, first_seen)));
            }
            Action::Menu => {
                self.sessions.cancel(user).await;
                self.show_menu(q, chat).await?;
            }
            Action::Recommendations => {
                let catalog = self.catalog.snapshot().await;
                let top = catalog.recommendations(self.cfg.recommendations_limit);
                let kb = views::recommendations_keyboard(&top);
                self.replace(q, chat, views::recommendations_intro(), kb, None)
                    .await?;
            }
            Action::Recommendation(order) => {
                self.show_shop(q, chat, order, Action::Recommendations)
                    .await?
            }
            Action::Shops => self.show_shops(q, chat, 1).await?,
            Action::ShopsPage(page) => self.show_shops(q, chat, page).await?,
            Action::Shop(order) => self.show_shop(q, chat, order, Action::Shops).await?,
            Action::Jobs => self.show_jobs(q, chat, 1).await?,
            Action::JobsPage(page) => self.show_jobs(q, chat, page).await?,
            Action::Job(position) => self.show_job(q, chat, position).await?,
            Action::Express => {
                self.begin_flow(user, chat, FlowKind::Express).await;
                let kb = views::back_keyboard(Action::Menu);
                self.replace(q, chat, views::express_prompt(), kb, None)
                    .await?;
            }
            Action::Support => {
                self.begin_flow(user, chat, FlowKind::Support).await;
                let (text, kb) = views::support_menu();
                self.replace(q, chat, text, kb, None).await?;
            }
            Action::SupportTopic(SupportTopic::Customers) => {
                self.begin_flow(user, chat, FlowKind::Support).await;
                let (text, kb) = views::support_customers_prompt();
                self.replace(q, chat, text, kb, None).await?;
            }
            Action::SupportTopic(SupportTopic::Shops) => {
                self.begin_flow(user, chat, FlowKind::ShopPartner).await;
                let (text, kb) = views::shop_partner_prompt();
                self.replace(q, chat, text, kb, None).await?;
            }
            Action::Rules => {
                let (text, kb) = views::rules();
                self.show_in_place(q, chat, text, kb).await?;
            }
            Action::FlowConfirm => return self.confirm_flow(q, chat).await,
            Action::FlowCancel => {
                self.sessions.cancel(user).await;
                self.show_menu(q, chat).await?;
                info!("User {} cancelled their request", user.0);
            }
            Action::Noop => {}
        }
        Ok(None)
    }

    async fn begin_flow(&self, user: UserId, chat: ChatId, flow: FlowKind) {
        let destination = flow.destination(&self.cfg);
        self.sessions
            .begin(user, chat, flow, destination, Instant::now())
            .await;
        info!("User {} entered {:?}", user.0, flow);
    }

    async fn confirm_flow(&self, q: &CallbackQuery, chat: ChatId) -> Result<Option<String>> {
        let Some(confirmed) = self
            .sessions
            .take_confirmed(q.from.id, chat, Instant::now())
            .await
        else {
            return Ok(Some("Nothing to send".to_string()));
        };

        match &confirmed.payload {
            Payload::Forward(source) => self.run_broadcast(q, chat, *source).await?,
            Payload::Text(text) => self.deliver_record(q, chat, &confirmed, text).await?,
        }
        Ok(None)
    }

    /// Terminal action of the request flows. The session is already gone either way.
    async fn deliver_record(
        &self,
        q: &CallbackQuery,
        chat: ChatId,
        confirmed: &Confirmed,
        text: &str,
    ) -> Result<()> {
        let (Some(destination), Some(tag)) = (confirmed.destination, confirmed.tag) else {
            return Err(Error::External(format!(
                "{:?} has no staff destination",
                confirmed.flow
            )));
        };

        let body = views::compose_record(tag, &q.from, text, &self.stamp());
        let delivered = self
            .messenger
            .send_inline_keyboard(destination, &body, views::record_keyboard(q.from.id))
            .await;

        let (ack, kb) = match delivered {
            Ok(at) => {
                let route = RoutedRecord {
                    message: at,
                    submitter: q.from.id,
                    staff_chat: destination,
                    flow: confirmed.flow,
                };
                if let Err(e) = self.db.save_route(route) {
                    error!(
                        "Record {} in chat {} delivered without a stored route: {e}",
                        at.message_id.0, destination.0
                    );
                }
                info!(
                    "{:?} record from user {} delivered to {}",
                    confirmed.flow, q.from.id.0, destination.0
                );
                views::sent_ack()
            }
            Err(e) => {
                warn!(
                    "Failed to deliver {:?} record from user {}: {e}",
                    confirmed.flow, q.from.id.0
                );
                views::delivery_failed()
            }
        };
        self.show_in_place(q, chat, ack, kb).await
    }

    async fn run_broadcast(&self, q: &CallbackQuery, chat: ChatId, source: MessageRef) -> Result<()> {
        let text = match self.moderation.broadcast(Actor::User(q.from.id), source).await {
            Ok(report) => {
                self.delete_quietly(q.message).await;
                views::broadcast_report(report.delivered, report.total)
            }
            Err(Error::PermissionDenied) => views::no_admin_rights().to_string(),
            Err(e) => return Err(e),
        };
        self.messenger.send_html(chat, &text).await?;
        Ok(())
    }

    async fn escalate_captcha(&self, q: &CallbackQuery) -> Result<()> {
        let (text, kb) = views::captcha_escalation(&q.from, &self.stamp());
        self.messenger
            .send_inline_keyboard(self.cfg.support_group_id, &text, kb)
            .await?;
        self.audit.record(AuditEvent::escalation(
            q.from.id.0,
            "age check reported as a mistake",
        ));

        if let Some(msg) = q.message {
            self.messenger
                .edit_html(msg, views::escalation_sent(), None)
                .await?;
        }
        info!("User {} reported a captcha error", q.from.id.0);
        Ok(())
    }

    // ============== Catalog views ==============

    async fn show_menu(&self, q: &CallbackQuery, chat: ChatId) -> Result<()> {
        let text = views::welcome(&q.from);
        let kb = views::main_menu(&self.cfg.channel_link);
        self.replace(q, chat, &text, kb, self.cfg.media_file("start.jpg"))
            .await
    }

    async fn show_shops(&self, q: &CallbackQuery, chat: ChatId, page: usize) -> Result<()> {
        let catalog = self.catalog.snapshot().await;
        let page = catalog.shops_page(page, self.cfg.catalog_page_size);
        let kb = views::shops_keyboard(&page);
        self.replace(q, chat, views::shops_intro(), kb, None).await
    }

    async fn show_shop(
        &self,
        q: &CallbackQuery,
        chat: ChatId,
        order: i64,
        back: Action,
    ) -> Result<()> {
        let catalog = self.catalog.snapshot().await;
        let Some(shop) = catalog.find_shop(order) else {
            warn!("Shop {order} not found for user {}", q.from.id.0);
            let (text, kb) = views::not_found("Shop", back);
            return self.replace(q, chat, &text, kb, None).await;
        };

        self.db.record_click(q.from.id, &shop.name)?;

        let mut photo = shop
            .image
            .as_deref()
            .and_then(|img| self.cfg.media_file(img));
        if photo.is_none() && back == Action::Recommendations {
            photo = self.cfg.media_file("topshop_default.jpg");
        }

        let (text, kb) = views::shop_card(shop, back);
        self.replace(q, chat, &text, kb, photo).await?;
        info!("User {} opened shop {}", q.from.id.0, shop.name);
        Ok(())
    }

    async fn show_jobs(&self, q: &CallbackQuery, chat: ChatId, page: usize) -> Result<()> {
        let catalog = self.catalog.snapshot().await;
        let page = catalog.jobs_page(page, self.cfg.catalog_page_size);
        let kb = views::jobs_keyboard(&page);
        self.replace(q, chat, views::jobs_intro(), kb, None).await
    }

    async fn show_job(&self, q: &CallbackQuery, chat: ChatId, position: usize) -> Result<()> {
        let catalog = self.catalog.snapshot().await;
        let Some(job) = catalog.job_at(position) else {
            warn!("Job #{position} not found for user {}", q.from.id.0);
            let (text, kb) = views::not_found("Job", Action::Jobs);
            return self.replace(q, chat, &text, kb, None).await;
        };
        let (text, kb) = views::job_card(job);
        self.replace(q, chat, &text, kb, None).await?;
        info!("User {} opened job {}", q.from.id.0, job.name);
        Ok(())
    }

    // ============== Delivery helpers ==============

    /// Delete the message the button was on and send a fresh one in its place.
    async fn replace(
        &self,
        q: &CallbackQuery,
        chat: ChatId,
        html: &str,
        kb: InlineKeyboard,
        photo: Option<PathBuf>,
    ) -> Result<()> {
        self.delete_quietly(q.message).await;
        self.send_card(chat, html, kb, photo).await?;
        Ok(())
    }

    /// Edit the message the button was on, or send a new one if there is none.
    async fn show_in_place(
        &self,
        q: &CallbackQuery,
        chat: ChatId,
        html: &str,
        kb: InlineKeyboard,
    ) -> Result<()> {
        match q.message {
            Some(msg) => self.messenger.edit_html(msg, html, Some(kb)).await,
            None => self
                .messenger
                .send_inline_keyboard(chat, html, kb)
                .await
                .map(|_| ()),
        }
    }

    async fn send_card(
        &self,
        chat: ChatId,
        html: &str,
        kb: InlineKeyboard,
        photo: Option<PathBuf>,
    ) -> Result<MessageRef> {
        match photo {
            Some(path) if html.chars().count() <= CAPTION_LIMIT => {
                self.messenger.send_photo(chat, &path, html, Some(kb)).await
            }
            _ => self.messenger.send_inline_keyboard(chat, html, kb).await,
        }
    }

    async fn delete_quietly(&self, msg: Option<MessageRef>) {
        let Some(msg) = msg else {
            return;
        };
        if let Err(e) = self.messenger.delete_message(msg).await {
            debug!(
                "Could not delete message {} in chat {}: {e}",
                msg.message_id.0, msg.chat_id.0
            );
        }
    }
}
