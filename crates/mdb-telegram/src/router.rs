use std::{collections::HashMap, sync::Arc};

use teloxide::{dispatching::Dispatcher, dptree, prelude::*};

use tokio::sync::{Mutex, OwnedMutexGuard};
use tracing::{info, warn};

use mdb_core::app::App;

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub app: Arc<App>,
    pub chat_locks: Arc<ChatLocks>,
}

/// Per-chat mutexes so updates from one chat never interleave.
#[derive(Default)]
pub struct ChatLocks {
    inner: Mutex<HashMap<i64, Arc<Mutex<()>>>>,
}

impl ChatLocks {
    pub async fn lock_chat(&self, chat_id: i64) -> OwnedMutexGuard<()> {
        let lock = {
            let mut map = self.inner.lock().await;
            map.entry(chat_id)
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}

/// Long-poll Telegram until shutdown (Ctrl-C).
pub async fn run_polling(bot: Bot, app: Arc<App>) -> anyhow::Result<()> {
    match bot.get_me().await {
        Ok(me) => info!("mdb started: @{}", me.username()),
        Err(e) => warn!("Could not fetch bot identity: {e}"),
    }

    let cfg = app.config();
    info!(
        "Admins: {}, express chat {}, support chat {}",
        cfg.admins.len(),
        cfg.express_group_id.0,
        cfg.support_group_id.0
    );

    let state = Arc::new(AppState {
        app,
        chat_locks: Arc::new(ChatLocks::default()),
    });

    let handler = dptree::entry()
        .branch(Update::filter_callback_query().endpoint(handlers::handle_callback))
        .branch(Update::filter_message().endpoint(handlers::handle_message));

    Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .enable_ctrlc_handler()
        .build()
        .dispatch()
        .await;

    info!("mdb stopped");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn same_chat_is_serialized() {
        let locks = Arc::new(ChatLocks::default());
        let guard = locks.lock_chat(42).await;

        let other = locks.clone();
        let waiter = tokio::spawn(async move {
            let _g = other.lock_chat(42).await;
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(!waiter.is_finished());

        drop(guard);
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn different_chats_do_not_block() {
        let locks = ChatLocks::default();
        let _a = locks.lock_chat(1).await;
        tokio::time::timeout(Duration::from_secs(1), locks.lock_chat(2))
            .await
            .unwrap();
    }
}
