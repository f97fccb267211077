use chrono::Local;
use log::{debug, info, warn};
use std::time::Duration;

use crate::config::AppConfig;
use crate::db::DbPool;
use crate::services::{AuthService, VaccineService};

/// Runs one sweep: drops expired blacklist rows and flags vaccine reminders.
pub async fn sweep(pool: &DbPool, reminder_window_days: i64) {
    if let Err(e) = AuthService::purge_expired_tokens(pool).await {
        warn!("Token purge failed: {}", e);
    }

    let today = Local::now().date_naive();
    match VaccineService::flag_due_reminders(today, reminder_window_days, pool).await {
        Ok(0) => debug!("No vaccine reminders due"),
        Ok(n) => info!("Flagged {} vaccine reminders", n),
        Err(e) => warn!("Vaccine reminder sweep failed: {}", e),
    }
}

/// Spawns the periodic sweep on the current runtime. The first run happens
/// immediately.
pub fn spawn_sweeper(pool: DbPool, config: &AppConfig) {
    let period = Duration::from_secs(config.token_sweep_interval_secs);
    let window = config.reminder_window_days;
    info!("Maintenance sweep every {:?}", period);

    actix_web::rt::spawn(async move {
        let mut ticker = tokio::time::interval(period);
        loop {
            ticker.tick().await;
            sweep(&pool, window).await;
        }
    });
}
