/// Dinex TUI - Dining Exchange Terminal
///
/// Terminal client for the meal market: polls the exchange backend on a
/// fixed interval, maintains bounded per-meal price histories, renders the
/// filtered market table with inline sparklines, draws a full annotated
/// chart for the focused meal, and dispatches trade actions.
///
/// The library includes:
/// - Instrument registry with category filtering
/// - Bounded FIFO price history store
/// - Chart engine (sparkline + full chart) with pure layout math
/// - Polling driver and action dispatch
pub mod shared;

// Re-export commonly used types for convenience
pub use shared::actions::{ActionForm, FormField, TradeAction};
pub use shared::chart::{ChangeSummary, Trend, axis_labels, change_summary, price_bounds};
pub use shared::history::{HISTORY_CAPACITY, PriceHistoryStore, PriceObservation};
pub use shared::registry::{CategoryFilter, InstrumentRegistry};
pub use shared::state::{AppState, Phase};
