//! User-facing texts and inline keyboards.
//!
//! Everything here is pure: callers decide where and how to deliver it.
//! Any string that did not originate in this module is HTML-escaped.

use chrono::{DateTime, Utc};

use crate::{
    actions::{Action, SupportTopic},
    catalog::{split_assortment_item, CatalogKind, CatalogPage, Job, Shop},
    conversation::{FlowKind, Payload},
    domain::{ChatId, UserId, UserProfile},
    formatting::{escape_html, format_remaining},
    messaging::types::{InlineButton, InlineKeyboard},
    storage::clicks::ClickStat,
};

const ASSORTMENT_FALLBACK: &str = "Item";
const CONTACT_URL_PREFIX: &str = "https://t.me/";

fn button(label: &str, action: Action) -> InlineButton {
    InlineButton::callback(label, action.data())
}

pub fn back_keyboard(target: Action) -> InlineKeyboard {
    InlineKeyboard::single(button("🔙 Back", target))
}

// ---------------------------------------------------------------------------
// Gatekeeping and onboarding
// ---------------------------------------------------------------------------

pub fn blocked_notice(expires_at: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    match expires_at {
        Some(until) if until > now => format!(
            "<b>⛔ You are blocked and cannot use the bot.</b>\nTime left: {}",
            format_remaining(until - now)
        ),
        _ => "<b>⛔ You are blocked and cannot use the bot.</b>".to_string(),
    }
}

pub fn private_only() -> &'static str {
    "<b>⛔ This command is only available in private messages.</b>"
}

pub fn age_prompt() -> (String, InlineKeyboard) {
    let text = "<b>This service is intended for adults only 🔞</b>\n\n\
                <b>Please confirm your age to continue.</b>";
    let kb = InlineKeyboard::new(vec![vec![
        button("I am 18 or older ✅", Action::AgeConfirm),
        button("I am under 18 ❌", Action::AgeDecline),
    ]]);
    (text.to_string(), kb)
}

pub fn welcome(user: &UserProfile) -> String {
    format!(
        "<b>Welcome, <a href='tg://user?id={id}'>{name}</a>!</b>\n\n\
         <b>Marketplace Directory</b> helps you find verified shops and partners.\n\n\
         🔎 <b>Private and safe browsing</b>\n\
         🚀 <b>Express requests in two taps</b>\n\
         🕒 <b>Support around the clock</b>\n\
         ✅ <b>Only verified shops</b>\n\n\
         <b>Choose a section to begin.</b>",
        id = user.id.0,
        name = escape_html(&user.full_name),
    )
}

pub fn main_menu(channel_link: &str) -> InlineKeyboard {
    InlineKeyboard::new(vec![
        vec![button("🏆 Recommendations", Action::Recommendations)],
        vec![
            button("🗂 Shops", Action::Shops),
            button("🚀 Express request", Action::Express),
        ],
        vec![
            button("💼 Jobs", Action::Jobs),
            button("⚙ Support", Action::Support),
        ],
        vec![InlineButton::url("🔗 Our links", channel_link)],
    ])
}

pub fn access_denied() -> (String, InlineKeyboard) {
    let text = "<b>🚫 Access denied.</b>\n\n\
                You stated that you are under 18.\n\
                Under the rules, your access has been suspended.";
    (
        text.to_string(),
        InlineKeyboard::single(button("This is a mistake", Action::ReportError)),
    )
}

pub fn captcha_escalation(user: &UserProfile, stamp: &str) -> (String, InlineKeyboard) {
    let text = format!(
        "<b>#CaptchaError</b>\n\n\
         <b>📅 {stamp}</b>\n\
         <b>👤 {handle} (ID: {id})</b>\n\
         <b>Message:</b> the user reports an age check mistake and was blocked.",
        handle = escape_html(&user.handle()),
        id = user.id.0,
    );
    (
        text,
        InlineKeyboard::single(button("Unban", Action::Unban(user.id))),
    )
}

pub fn escalation_sent() -> &'static str {
    "<b>✅ Support has been notified. Please wait for a reply.</b>"
}

pub fn unbanned_from_staff(user: UserId) -> String {
    format!("<b>✔️ User {} has been unbanned.</b>", user.0)
}

pub fn unban_notice() -> &'static str {
    "<b>✔️ Your ban has been lifted. Restart the bot with /start.</b>"
}

// ---------------------------------------------------------------------------
// Catalog
// ---------------------------------------------------------------------------

pub fn shops_intro() -> &'static str {
    "<b>🗂 Shops</b>\n\n<b>Choose a shop:</b>"
}

pub fn jobs_intro() -> &'static str {
    "<b>💼 Jobs</b>\n\n\
     <b>▫️ Current openings from our partners</b>\n\
     <b>▫️ File a complaint if you are offered anything other than what is listed</b>\n\n\
     <b>Pick a partner to see the full job details.</b>"
}

pub fn recommendations_intro() -> &'static str {
    "<b>Recommendations ✨</b>\n\n\
     <b>Shops with the highest trust, service and quality ratings.</b>\n\n\
     <b>Pick one below:</b>"
}

pub fn shops_keyboard(page: &CatalogPage<'_, Shop>) -> InlineKeyboard {
    let buttons = page
        .items
        .iter()
        .map(|s| button(&format!("▫️ {}", s.name), Action::Shop(s.order)))
        .collect();
    paged_keyboard(CatalogKind::Shops, buttons, page)
}

/// Jobs are keyed by their 1-based position in the full list.
pub fn jobs_keyboard(page: &CatalogPage<'_, Job>) -> InlineKeyboard {
    let buttons = page
        .items
        .iter()
        .enumerate()
        .map(|(i, j)| button(&format!("🧑‍💼 {}", j.name), Action::Job(page.start + i + 1)))
        .collect();
    paged_keyboard(CatalogKind::Jobs, buttons, page)
}

/// Two items per row, then `prev | main menu | next`.
///
/// `prev` only appears past page 1 and `next` only when more items follow.
/// An empty page collapses to a single "no items" button.
fn paged_keyboard<T>(
    kind: CatalogKind,
    buttons: Vec<InlineButton>,
    page: &CatalogPage<'_, T>,
) -> InlineKeyboard {
    let empty_label = match kind {
        CatalogKind::Shops => "📋 No shops found",
        CatalogKind::Jobs => "📋 No jobs found",
    };
    let to_page = |n: usize| match kind {
        CatalogKind::Shops => Action::ShopsPage(n),
        CatalogKind::Jobs => Action::JobsPage(n),
    };

    let mut kb = InlineKeyboard::default();
    if buttons.is_empty() {
        kb.push_row(vec![button(empty_label, Action::Menu)]);
        return kb;
    }

    let mut it = buttons.into_iter();
    while let Some(first) = it.next() {
        let mut row = vec![first];
        row.extend(it.next());
        kb.push_row(row);
    }

    let mut nav = Vec::with_capacity(3);
    if page.has_prev {
        nav.push(button("⬅ Prev", to_page(page.page - 1)));
    }
    nav.push(button("🔙 Main menu", Action::Menu));
    if page.has_next {
        nav.push(button("Next ➡", to_page(page.page + 1)));
    }
    kb.push_row(nav);
    kb
}

pub fn recommendations_keyboard(shops: &[&Shop]) -> InlineKeyboard {
    let mut buttons: Vec<InlineButton> = shops
        .iter()
        .map(|s| button(&format!("✨ {}", s.name), Action::Recommendation(s.order)))
        .collect();
    buttons.push(button("🔙 Back", Action::Menu));
    InlineKeyboard::one_per_row(buttons)
}

fn contact_row(contact: Option<&str>, label: &str) -> Option<Vec<InlineButton>> {
    contact.map(|c| vec![InlineButton::url(label, format!("{CONTACT_URL_PREFIX}{c}"))])
}

/// Shop details card. `back` is the listing the user came from.
pub fn shop_card(shop: &Shop, back: Action) -> (String, InlineKeyboard) {
    let assortment = if shop.assortment.is_empty() {
        "No assortment listed".to_string()
    } else {
        shop.assortment
            .iter()
            .map(|a| match split_assortment_item(&a.item, ASSORTMENT_FALLBACK) {
                (name, Some(price)) => format!(
                    "<b>{}</b>\n💲 {}",
                    escape_html(name),
                    escape_html(price)
                ),
                (name, None) => format!("<b>{}</b>", escape_html(name)),
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    };

    let mut text = format!(
        "<b>🏬 Shop: {}</b>\n\n<b>📋 Assortment:</b>\n\n{assortment}",
        escape_html(&shop.name)
    );
    if let Some(extra) = shop.extra_text.as_deref().filter(|e| !e.is_empty()) {
        text.push_str("\n\n");
        text.push_str(&escape_html(extra));
    }

    let mut kb = InlineKeyboard::default();
    if let Some(row) = contact_row(shop.contact(), "🛒 Contact shop") {
        kb.push_row(row);
    }
    kb.push_row(vec![button("🔙 Back", back)]);
    (text, kb)
}

pub fn job_card(job: &Job) -> (String, InlineKeyboard) {
    let field = |v: &Option<String>, missing: &str| {
        escape_html(v.as_deref().filter(|s| !s.is_empty()).unwrap_or(missing))
    };
    let text = format!(
        "<b>#Jobs</b>\n\n\
         💈 Partner: {}\n➖➖➖➖➖\n\
         💼 Position: {}\n➖➖➖➖➖\n\
         💰 Pay: {}\n➖➖➖➖➖\n\
         🔅 Details: {}",
        escape_html(&job.name),
        field(&job.vacancy, "No description"),
        field(&job.salary, "Not specified"),
        field(&job.conditions, "Not specified"),
    );

    let mut kb = InlineKeyboard::default();
    if let Some(row) = contact_row(job.contact(), "Contact 📲") {
        kb.push_row(row);
    }
    kb.push_row(vec![button("🔙 Back", Action::Jobs)]);
    (text, kb)
}

pub fn not_found(what: &str, back: Action) -> (String, InlineKeyboard) {
    (
        format!("<b>❌ {what} not found.</b>"),
        back_keyboard(back),
    )
}

// ---------------------------------------------------------------------------
// Request flows
// ---------------------------------------------------------------------------

pub fn express_prompt() -> &'static str {
    "<b>#Express ⚡️</b>\n\n\
     <b>Send your request with the city, item, quantity and budget.</b>\n\n\
     <b><i>For example</i></b>: <i>Astana sofa 2 seats 25k</i>\n\n\
     <b>Partners will reply with offers and you choose the one that suits you.</b>"
}

pub fn support_menu() -> (&'static str, InlineKeyboard) {
    let kb = InlineKeyboard::one_per_row(vec![
        button(
            "🛒 For customers",
            Action::SupportTopic(SupportTopic::Customers),
        ),
        button("🤝 For shops", Action::SupportTopic(SupportTopic::Shops)),
        button("🔙 Back", Action::Menu),
    ]);
    ("<b>⚙ Support</b>\n\n<b>Choose a category:</b>", kb)
}

pub fn support_customers_prompt() -> (&'static str, InlineKeyboard) {
    let kb = InlineKeyboard::one_per_row(vec![
        button("📜 Rules", Action::Rules),
        button("🔙 Back", Action::Support),
    ]);
    (
        "<b>🛒 For customers</b>\n\n\
         <b>Describe your question or complaint in a single text message. \
         We reply within 24 hours.</b>\n\n\
         <b>⚠️ Please read the rules first.</b>",
        kb,
    )
}

pub fn shop_partner_prompt() -> (&'static str, InlineKeyboard) {
    (
        "<b>🤝 For shops</b>\n\n\
         <b>Apply for a partnership here.</b>\n\n\
         <b>▫️ Shop name, cities, assortment, shop link, operator contacts</b>\n\n\
         <b>We reply within 24 hours ⏳</b>",
        back_keyboard(Action::Support),
    )
}

pub fn rules() -> (&'static str, InlineKeyboard) {
    (
        "<b>📜 Rules</b>\n\n\
         <b>▫️ Contact support only if you could not resolve the issue with the partner yourself.</b>\n\
         <b>▫️ Describe the problem in one text message. Flooding leads to a ban.</b>\n\
         <b>▫️ Keep screenshots of the conversation and of the payment.</b>\n\
         <b>▫️ Insulting partners may void our assistance.</b>\n\
         <b>▫️ Expect a reply within 48 hours.</b>",
        back_keyboard(Action::SupportTopic(SupportTopic::Customers)),
    )
}

pub fn broadcast_prompt() -> &'static str {
    "<b>📬 Forward the message or post to broadcast (media, buttons and text are kept):</b>"
}

pub fn confirmation_card(flow: FlowKind, payload: &Payload) -> (String, InlineKeyboard) {
    let heading = match flow {
        FlowKind::Express => "🛎 Your order:",
        FlowKind::Support => "🛎 Your request:",
        FlowKind::ShopPartner => "🛎 Your details:",
        FlowKind::Broadcast => "📤 Confirm the broadcast:",
    };
    let text = match payload {
        Payload::Text(t) => format!(
            "<b>{heading}</b>\n\n{}\n\n<b>Confirm sending:</b>",
            escape_html(t)
        ),
        Payload::Forward(_) => format!("<b>{heading}</b>"),
    };
    let kb = InlineKeyboard::new(vec![vec![
        button("📤 Send", Action::FlowConfirm),
        button("🔙 Back", Action::FlowCancel),
    ]]);
    (text, kb)
}

pub fn text_only() -> &'static str {
    "<b>❌ Only text is accepted.</b>"
}

pub fn forward_only() -> &'static str {
    "<b>⛔ Please forward a message or post.</b>"
}

pub fn sent_ack() -> (&'static str, InlineKeyboard) {
    ("<b>📤 Sent ✅</b>", back_keyboard(Action::Menu))
}

pub fn delivery_failed() -> (&'static str, InlineKeyboard) {
    (
        "<b>❌ Could not deliver your request. Please try again later.</b>",
        back_keyboard(Action::Menu),
    )
}

pub fn generic_failure() -> &'static str {
    "<b>❌ Something went wrong. Please try again later.</b>"
}

// ---------------------------------------------------------------------------
// Routed records
// ---------------------------------------------------------------------------

/// Body of a record routed to a staff chat.
pub fn compose_record(tag: &str, submitter: &UserProfile, text: &str, stamp: &str) -> String {
    format!(
        "<b>🔖 {tag}</b>\n\n\
         <b>📆 {stamp}</b>\n\
         <b>👤 {handle} (ID: {id})</b>\n\
         <b>📝 Message: {body}</b>",
        handle = escape_html(&submitter.handle()),
        id = submitter.id.0,
        body = escape_html(text),
    )
}

pub fn record_keyboard(submitter: UserId) -> InlineKeyboard {
    InlineKeyboard::single(button("ℹ️ Info", Action::Info(submitter)))
}

/// Staff answer relayed to the submitter.
pub fn staff_response(flow: FlowKind, staff: &UserProfile, text: &str, stamp: &str) -> String {
    let tag = match flow {
        FlowKind::Express => "#NewOffer ⚡️",
        _ => "#SupportReply 🛠",
    };
    format!(
        "<b>🔖 {tag}</b>\n\n\
         <b>📆 {stamp}</b>\n\
         <b>👤 From {}</b>\n\
         <b>📝 Message: {}</b>\n\n\
         <i>Reply to this message to answer.</i>",
        escape_html(&staff.handle()),
        escape_html(text),
    )
}

pub fn staff_ack(flow: FlowKind) -> &'static str {
    match flow {
        FlowKind::Express => "<b>📤 Offer sent ☑️</b>",
        _ => "<b>📤 Reply sent ☑️</b>",
    }
}

pub fn relay_failed() -> &'static str {
    "<b>❌ Could not deliver the reply: the user may have blocked the bot.</b>"
}

pub fn user_reply_ack() -> &'static str {
    "<b>📤 Your reply was sent.</b>"
}

pub fn user_info(user: UserId, first_seen: Option<DateTime<Utc>>) -> String {
    match first_seen {
        Some(ts) => format!(
            "User {} first seen {}",
            user.0,
            ts.format("%Y-%m-%d %H:%M UTC")
        ),
        None => format!("User {} is not registered", user.0),
    }
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

pub fn no_admin_rights() -> &'static str {
    "<b>⛔ No admin rights.</b>"
}

pub fn admin_panel() -> &'static str {
    "<b>📋 Admin panel</b>\n\n\
     <b>📊 Commands:</b>\n\
     /statistic - usage statistics\n\
     /send - start a broadcast\n\
     /chatid - show the current chat id\n\
     /ban [id] [hours] - ban a user (or reply to their message)\n\
     /unban [id] - unban a user (or reply to their message)"
}

pub fn chat_id(chat: ChatId) -> String {
    format!("<b>🆔 Current chat id: {}</b>", chat.0)
}

pub fn statistics(user_count: u64, clicks: &[ClickStat]) -> String {
    let mut out = format!(
        "<b>📊 Bot statistics</b>\n\n<b>👥 Users: {user_count}</b>\n\n<b>🏬 Shop popularity (clicks):</b>\n"
    );
    if clicks.is_empty() {
        out.push_str("No click data yet.\n");
    }
    for c in clicks {
        out.push_str(&format!("{}: {} clicks\n", escape_html(&c.name), c.clicks));
    }
    out
}

pub fn staff_chats_only() -> &'static str {
    "<b>❌ This command is only available in private messages or the staff chats.</b>"
}

pub fn ban_usage() -> &'static str {
    "<b>❌ Usage: /ban [id] [hours], or reply to the user's message.</b>"
}

pub fn unban_usage() -> &'static str {
    "<b>❌ Usage: /unban [id], or reply to the user's message.</b>"
}

pub fn banned(target: UserId, until: DateTime<Utc>) -> String {
    format!(
        "<b>⛔ User {} banned until {}.</b>",
        target.0,
        until.format("%Y-%m-%d %H:%M UTC")
    )
}

pub fn unbanned(target: UserId) -> String {
    format!("<b>✔️ User {} unbanned.</b>", target.0)
}

pub fn broadcast_report(delivered: usize, total: usize) -> String {
    format!("<b>✔️ Broadcast finished.</b>\n<b>Forwarded to {delivered} of {total} users.</b>")
}
