//! Callback-data codec for inline buttons.
//!
//! Telegram caps callback data at 64 bytes, so jobs are addressed by their
//! 1-based position in the catalog instead of by name.

use crate::domain::UserId;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SupportTopic {
    Customers,
    Shops,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    AgeConfirm,
    AgeDecline,
    ReportError,
    Unban(UserId),
    Info(UserId),
    Menu,
    Recommendations,
    Recommendation(i64),
    Shops,
    ShopsPage(usize),
    Shop(i64),
    Jobs,
    JobsPage(usize),
    Job(usize),
    Express,
    Support,
    SupportTopic(SupportTopic),
    Rules,
    FlowConfirm,
    FlowCancel,
    /// Inert button, e.g. the "no items" placeholder.
    Noop,
}

impl Action {
    pub fn parse(data: &str) -> Option<Self> {
        let action = match data {
            "age:yes" => Action::AgeConfirm,
            "age:no" => Action::AgeDecline,
            "report_error" => Action::ReportError,
            "menu" => Action::Menu,
            "recs" => Action::Recommendations,
            "shops" => Action::Shops,
            "jobs" => Action::Jobs,
            "express" => Action::Express,
            "support" => Action::Support,
            "support:customers" => Action::SupportTopic(SupportTopic::Customers),
            "support:shops" => Action::SupportTopic(SupportTopic::Shops),
            "rules" => Action::Rules,
            "flow:confirm" => Action::FlowConfirm,
            "flow:cancel" => Action::FlowCancel,
            "noop" => Action::Noop,
            _ => {
                let (key, arg) = data.rsplit_once(':')?;
                match key {
                    "unban" => Action::Unban(UserId(arg.parse().ok()?)),
                    "info" => Action::Info(UserId(arg.parse().ok()?)),
                    "rec" => Action::Recommendation(arg.parse().ok()?),
                    "shop" => Action::Shop(arg.parse().ok()?),
                    "shops:page" => Action::ShopsPage(arg.parse().ok()?),
                    "job" => Action::Job(arg.parse().ok()?),
                    "jobs:page" => Action::JobsPage(arg.parse().ok()?),
                    _ => return None,
                }
            }
        };
        Some(action)
    }

    pub fn data(self) -> String {
        match self {
            Action::AgeConfirm => "age:yes".into(),
            Action::AgeDecline => "age:no".into(),
            Action::ReportError => "report_error".into(),
            Action::Unban(u) => format!("unban:{}", u.0),
            Action::Info(u) => format!("info:{}", u.0),
            Action::Menu => "menu".into(),
            Action::Recommendations => "recs".into(),
            Action::Recommendation(order) => format!("rec:{order}"),
            Action::Shops => "shops".into(),
            Action::ShopsPage(p) => format!("shops:page:{p}"),
            Action::Shop(order) => format!("shop:{order}"),
            Action::Jobs => "jobs".into(),
            Action::JobsPage(p) => format!("jobs:page:{p}"),
            Action::Job(pos) => format!("job:{pos}"),
            Action::Express => "express".into(),
            Action::Support => "support".into(),
            Action::SupportTopic(SupportTopic::Customers) => "support:customers".into(),
            Action::SupportTopic(SupportTopic::Shops) => "support:shops".into(),
            Action::Rules => "rules".into(),
            Action::FlowConfirm => "flow:confirm".into(),
            Action::FlowCancel => "flow:cancel".into(),
            Action::Noop => "noop".into(),
        }
    }
}
