//! Application state shared between the event loop and the polling
//! driver.
//!
//! All mutation happens through methods on [`AppState`] behind one
//! `Arc<Mutex<_>>`; there is no other shared state. Overlapping poll
//! cycles are permitted and last-response-wins: a stale cycle finishing
//! late may overwrite fresher fields until the next tick corrects them.

use chrono::{DateTime, Utc};
use dinex_client::{CurrentUser, MarketSummary, Portfolio, TradeRecord};
use tokio::task::JoinHandle;

use crate::shared::actions::ActionForm;
use crate::shared::history::PriceHistoryStore;
use crate::shared::registry::{CategoryFilter, InstrumentRegistry};

/// Which screen the terminal is on
#[derive(Debug)]
pub enum Phase {
    /// Username prompt; `error` carries the last rejection message
    Login { input: String, error: Option<String> },
    /// Logged in and polling
    Trading { username: String },
}

impl Phase {
    pub fn login() -> Self {
        Phase::Login {
            input: String::new(),
            error: None,
        }
    }
}

/// Everything the renderer reads and the driver writes
pub struct AppState {
    pub phase: Phase,
    pub user: Option<CurrentUser>,
    pub registry: InstrumentRegistry,
    pub history: PriceHistoryStore,
    pub trades: Vec<TradeRecord>,
    pub portfolio: Portfolio,
    /// IPO clock state from the latest market summary, when served
    pub ipo_active: Option<bool>,
    /// Meal currently shown in the full chart
    pub focus: Option<String>,
    /// Blocking notification text; input is routed to dismissal while set
    pub notice: Option<String>,
    /// Open trade-action form, if any
    pub form: Option<ActionForm>,
    pub last_update: Option<DateTime<Utc>>,
    /// Active polling driver; at most one per logged-in session
    poll_task: Option<JoinHandle<()>>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            phase: Phase::login(),
            user: None,
            registry: InstrumentRegistry::new(),
            history: PriceHistoryStore::new(),
            trades: Vec::new(),
            portfolio: Portfolio::new(),
            ipo_active: None,
            focus: None,
            notice: None,
            form: None,
            last_update: None,
            poll_task: None,
        }
    }

    /// Apply a fresh market snapshot: replace the registry's known set and
    /// record one observation per instrument of the filtered view.
    pub fn apply_market_summary(&mut self, summary: MarketSummary, now: DateTime<Utc>) {
        if summary.ipo_active.is_some() {
            self.ipo_active = summary.ipo_active;
        }
        self.registry.update(summary.meals);

        for meal in self.registry.filtered() {
            self.history.record(&meal.name, meal.observed_price(), now);
        }
        self.last_update = Some(now);
    }

    /// Select a category tab; the next draw re-renders synchronously from
    /// the cached snapshot, with no fetch and no history recording.
    pub fn set_filter(&mut self, filter: CategoryFilter) {
        self.registry.set_filter(filter);
    }

    pub fn set_focus(&mut self, name: impl Into<String>) {
        self.focus = Some(name.into());
    }

    pub fn notify(&mut self, message: impl Into<String>) {
        self.notice = Some(message.into());
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    /// Install the polling driver handle, aborting any previous driver so
    /// repeated logins can never stack interval timers.
    pub fn start_polling(&mut self, handle: JoinHandle<()>) {
        if let Some(previous) = self.poll_task.take() {
            previous.abort();
        }
        self.poll_task = Some(handle);
    }

    pub fn stop_polling(&mut self) {
        if let Some(task) = self.poll_task.take() {
            task.abort();
        }
    }

    pub fn is_polling(&self) -> bool {
        self.poll_task.is_some()
    }

    /// Enter the trading screen for `username`
    pub fn enter_trading(&mut self, username: impl Into<String>) {
        self.phase = Phase::Trading {
            username: username.into(),
        };
    }

    /// Return to the login prompt. Cached market state and histories are
    /// kept for the rest of the process lifetime, mirroring the original
    /// client where logout hid the views without discarding them.
    pub fn logout(&mut self) {
        self.stop_polling();
        self.user = None;
        self.form = None;
        self.notice = None;
        self.phase = Phase::login();
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dinex_client::MealSummary;

    fn meal(name: &str, category: &str, bid: Option<f64>, ask: Option<f64>) -> MealSummary {
        MealSummary {
            name: name.into(),
            category: category.into(),
            house_supply: 100,
            best_ask: ask,
            best_bid: bid,
            spread: None,
        }
    }

    fn now() -> DateTime<Utc> {
        DateTime::from_timestamp(1_700_000_000, 0).unwrap()
    }

    #[test]
    fn test_snapshot_records_filtered_instruments_only() {
        let mut state = AppState::new();
        state.set_filter(CategoryFilter::Category("Dessert".into()));

        let summary = MarketSummary {
            meals: vec![
                meal("Beef Stew", "Beef", Some(5.0), None),
                meal("Ice Cream", "Dessert", Some(2.0), None),
            ],
            ipo_price: None,
            ipo_active: None,
        };
        state.apply_market_summary(summary, now());

        assert_eq!(state.history.len("Ice Cream"), 1);
        assert_eq!(state.history.len("Beef Stew"), 0);
    }

    #[test]
    fn test_snapshot_skips_unquoted_instruments() {
        let mut state = AppState::new();
        let summary = MarketSummary {
            meals: vec![
                meal("Beef Stew", "Beef", None, None),
                meal("Taco Chicken", "Chicken", None, Some(4.0)),
            ],
            ipo_price: None,
            ipo_active: None,
        };
        state.apply_market_summary(summary, now());

        assert_eq!(state.history.len("Beef Stew"), 0);
        assert_eq!(state.history.len("Taco Chicken"), 1);
        assert_eq!(state.history.tracked(), 1);
    }

    #[test]
    fn test_filter_change_records_nothing() {
        let mut state = AppState::new();
        let summary = MarketSummary {
            meals: vec![meal("Beef Stew", "Beef", Some(5.0), None)],
            ipo_price: None,
            ipo_active: None,
        };
        state.apply_market_summary(summary, now());
        assert_eq!(state.history.len("Beef Stew"), 1);

        // Switching tabs re-renders from cache; no new observation
        state.set_filter(CategoryFilter::Category("Beef".into()));
        state.set_filter(CategoryFilter::All);
        assert_eq!(state.history.len("Beef Stew"), 1);
    }

    #[tokio::test]
    async fn test_start_polling_aborts_previous_driver() {
        let mut state = AppState::new();

        let first = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        });
        state.start_polling(first);

        let second = tokio::spawn(async {
            tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        });
        state.start_polling(second);
        assert!(state.is_polling());

        state.stop_polling();
        assert!(!state.is_polling());
    }

    #[test]
    fn test_logout_keeps_histories() {
        let mut state = AppState::new();
        let summary = MarketSummary {
            meals: vec![meal("Beef Stew", "Beef", Some(5.0), None)],
            ipo_price: None,
            ipo_active: None,
        };
        state.apply_market_summary(summary, now());
        state.enter_trading("Josh");

        state.logout();
        assert!(matches!(state.phase, Phase::Login { .. }));
        assert_eq!(state.history.len("Beef Stew"), 1);
    }
}
