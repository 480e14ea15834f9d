//! Polling driver: one refresh cycle immediately after login, then the
//! same cycle on a fixed interval for the rest of the session.
//!
//! Cycles are fire-and-forget: a cycle slower than the interval overlaps
//! the next one, and whichever response lands last wins. A failed fetch
//! logs a warning and leaves the previous state in place; the renderer
//! degrades to placeholders. The driver's `JoinHandle` is installed via
//! [`AppState::start_polling`], which aborts any previous driver first.

use std::sync::{Arc, OnceLock};
use std::time::Duration;

use chrono::Utc;
use dinex_client::ExchangeClient;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::shared::state::AppState;

/// Default refresh cadence, overridable via `DINEX_POLL_SECS`
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

fn poll_interval() -> Duration {
    static POLL_INTERVAL: OnceLock<Duration> = OnceLock::new();
    *POLL_INTERVAL.get_or_init(|| {
        std::env::var("DINEX_POLL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(DEFAULT_POLL_INTERVAL)
    })
}

/// Spawn the interval driver. The first cycle runs immediately.
pub fn spawn_driver(client: Arc<ExchangeClient>, state: Arc<Mutex<AppState>>) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(poll_interval());
        loop {
            interval.tick().await;
            debug!("poll tick");
            let client = Arc::clone(&client);
            let state = Arc::clone(&state);
            tokio::spawn(async move {
                refresh_cycle(&client, &state).await;
            });
        }
    })
}

/// One refresh cycle: user state, market snapshot, trade history.
pub async fn refresh_cycle(client: &ExchangeClient, state: &Mutex<AppState>) {
    let (user, market, trades) = tokio::join!(
        client.current_user(),
        client.market_summary(),
        client.trade_history(),
    );
    let now = Utc::now();

    let mut state = state.lock().await;
    match user {
        Ok(user) => state.user = Some(user),
        Err(e) => warn!(error = %e, "current_user fetch failed"),
    }
    match market {
        Ok(summary) => state.apply_market_summary(summary, now),
        Err(e) => warn!(error = %e, "market_summary fetch failed"),
    }
    match trades {
        Ok(trades) => state.trades = trades,
        Err(e) => warn!(error = %e, "trade_history fetch failed"),
    }
}

/// Fetch the portfolio alone, used at login
pub async fn refresh_portfolio(client: &ExchangeClient, state: &Mutex<AppState>) {
    match client.portfolio().await {
        Ok(portfolio) => state.lock().await.portfolio = portfolio,
        Err(e) => warn!(error = %e, "portfolio fetch failed"),
    }
}

/// Full refresh after a successful action: user, market, portfolio, and
/// trade history together, so every view reflects the new state at once.
pub async fn full_refresh(client: &ExchangeClient, state: &Mutex<AppState>) {
    tokio::join!(
        refresh_cycle(client, state),
        refresh_portfolio(client, state),
    );
}
