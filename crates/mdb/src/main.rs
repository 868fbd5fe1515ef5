use std::sync::Arc;

use teloxide::Bot;
use tracing::info;

use mdb_core::{
    app::App, audit::AuditLogger, catalog::FileCatalog, config::Config, storage::Database,
};
use mdb_telegram::TelegramMessenger;

#[tokio::main]
async fn main() -> Result<(), mdb_core::Error> {
    mdb_core::logging::init("mdb")?;

    let cfg = Arc::new(Config::load()?);
    let db = Arc::new(Database::open(&cfg.database_path)?);
    info!("Database ready at {}", cfg.database_path.display());

    let catalog = Arc::new(FileCatalog::new(&cfg.shops_file, &cfg.jobs_file));
    let audit = AuditLogger::new(cfg.audit_log_path.clone(), cfg.audit_log_json);

    let bot = Bot::new(cfg.bot_token.clone());
    let messenger = Arc::new(TelegramMessenger::new(bot.clone()));
    let app = Arc::new(App::new(cfg, db, catalog, messenger, audit));

    mdb_telegram::router::run_polling(bot, app)
        .await
        .map_err(|e| mdb_core::Error::External(format!("telegram bot failed: {e}")))?;

    Ok(())
}
