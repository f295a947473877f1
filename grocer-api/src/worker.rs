use tokio::time::{sleep, Duration};
use tracing::{debug, info};

use crate::state::AppState;

/// Periodically drops shopper sessions nobody has touched for a while.
pub async fn start_session_sweeper(state: AppState, every: Duration) {
    info!("Session sweeper started, idle limit {:?}", state.settings.session_idle);

    loop {
        sleep(every).await;

        let evicted = state.evict_idle();
        if evicted > 0 {
            debug!(evicted, remaining = state.session_count(), "Evicted idle shopper sessions");
        }
    }
}
