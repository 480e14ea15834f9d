//! Trade actions: an explicit command table from action identifier to
//! backend request, decoupled from the presentation layer.
//!
//! Validation happens before any network call: an instrument must be
//! selected. Quantity and price are parsed leniently with no range
//! checks; the backend owns every business rule and answers with
//! `success` plus a message.

use dinex_client::{ActionResponse, ClientError, ExchangeClient};

/// User-initiated trade actions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TradeAction {
    StartIpo,
    BuyIpo,
    SecondaryBuy,
    Sell,
}

impl TradeAction {
    pub const ALL: [TradeAction; 4] = [
        TradeAction::StartIpo,
        TradeAction::BuyIpo,
        TradeAction::SecondaryBuy,
        TradeAction::Sell,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            TradeAction::StartIpo => "START IPO",
            TradeAction::BuyIpo => "BUY IPO",
            TradeAction::SecondaryBuy => "SECONDARY BUY",
            TradeAction::Sell => "SELL",
        }
    }

    /// Start-IPO fires immediately; the rest collect inputs first
    pub fn has_form(&self) -> bool {
        !matches!(self, TradeAction::StartIpo)
    }

    /// IPO buys execute at the house price, so the form has no price field
    pub fn has_price(&self) -> bool {
        matches!(self, TradeAction::SecondaryBuy | TradeAction::Sell)
    }

    /// Label for the action's boolean toggle, when it has one
    pub fn flag_label(&self) -> Option<&'static str> {
        match self {
            TradeAction::SecondaryBuy => Some("Snap buy"),
            TradeAction::Sell => Some("Short sale"),
            _ => None,
        }
    }
}

/// Input field currently focused in a form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Category,
    Meal,
    Qty,
    Price,
    Flag,
}

/// In-progress inputs for one trade action
#[derive(Debug, Clone)]
pub struct ActionForm {
    pub action: TradeAction,
    pub category: Option<String>,
    pub meal: Option<String>,
    pub qty: String,
    pub price: String,
    /// `snap_buy` for secondary buys, `is_short` for sells
    pub flag: bool,
    pub field: FormField,
}

impl ActionForm {
    pub fn new(action: TradeAction) -> Self {
        Self {
            action,
            category: None,
            meal: None,
            qty: String::new(),
            price: String::new(),
            flag: false,
            field: FormField::Category,
        }
    }

    /// Fields this action's form presents, in focus order
    pub fn fields(&self) -> Vec<FormField> {
        let mut fields = vec![FormField::Category, FormField::Meal, FormField::Qty];
        if self.action.has_price() {
            fields.push(FormField::Price);
        }
        if self.action.flag_label().is_some() {
            fields.push(FormField::Flag);
        }
        fields
    }

    pub fn next_field(&mut self) {
        let fields = self.fields();
        let current = fields.iter().position(|f| *f == self.field).unwrap_or(0);
        self.field = fields[(current + 1) % fields.len()];
    }

    pub fn prev_field(&mut self) {
        let fields = self.fields();
        let current = fields.iter().position(|f| *f == self.field).unwrap_or(0);
        self.field = fields[(current + fields.len() - 1) % fields.len()];
    }

    /// An instrument must be selected before any request goes out
    pub fn validate(&self) -> Result<&str, &'static str> {
        match self.meal.as_deref() {
            Some(meal) if !meal.is_empty() => Ok(meal),
            _ => Err("Please select a category and meal"),
        }
    }

    /// Lenient quantity parse; unparseable input is forwarded as zero and
    /// rejected server-side
    pub fn qty_value(&self) -> u32 {
        self.qty.trim().parse().unwrap_or(0)
    }

    /// Lenient price parse, same contract as quantity
    pub fn price_value(&self) -> f64 {
        self.price.trim().parse().unwrap_or(0.0)
    }

    /// Clear the category/instrument selections, as after a successful
    /// submission
    pub fn reset_selection(&mut self) {
        self.category = None;
        self.meal = None;
    }
}

/// Cycle a selection through `options` with wrap-around; `None` selects
/// the first (or last, going backwards).
pub fn cycle_option(current: Option<&str>, options: &[&str], forward: bool) -> Option<String> {
    if options.is_empty() {
        return None;
    }
    let next = match current.and_then(|c| options.iter().position(|o| *o == c)) {
        Some(index) if forward => (index + 1) % options.len(),
        Some(index) => (index + options.len() - 1) % options.len(),
        None if forward => 0,
        None => options.len() - 1,
    };
    Some(options[next].to_string())
}

/// What should follow a completed dispatch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Followup {
    /// Close the form, reset selections, and run a full refresh
    CloseAndRefresh,
    /// Show the message; the form stays open and nothing refreshes
    NoticeOnly,
}

pub fn followup(response: &ActionResponse) -> Followup {
    if response.success {
        Followup::CloseAndRefresh
    } else {
        Followup::NoticeOnly
    }
}

/// The command table: one dispatch entry per action.
///
/// Callers validate first; `submit` assumes a selected meal for the
/// actions that need one.
pub async fn submit(
    client: &ExchangeClient,
    form: &ActionForm,
) -> Result<ActionResponse, ClientError> {
    let meal = form.meal.as_deref().unwrap_or_default();
    match form.action {
        TradeAction::StartIpo => client.start_ipo().await,
        TradeAction::BuyIpo => client.buy_ipo(meal, form.qty_value()).await,
        TradeAction::SecondaryBuy => {
            client
                .secondary_buy(meal, form.price_value(), form.qty_value(), form.flag)
                .await
        }
        TradeAction::Sell => {
            client
                .sell(meal, form.price_value(), form.qty_value(), form.flag)
                .await
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_requires_selection() {
        let mut form = ActionForm::new(TradeAction::Sell);
        assert!(form.validate().is_err());

        form.meal = Some(String::new());
        assert!(form.validate().is_err());

        form.meal = Some("Beef Stew".into());
        assert_eq!(form.validate(), Ok("Beef Stew"));
    }

    #[test]
    fn test_lenient_numeric_parsing() {
        let mut form = ActionForm::new(TradeAction::SecondaryBuy);
        form.qty = "12".into();
        form.price = "4.50".into();
        assert_eq!(form.qty_value(), 12);
        assert_eq!(form.price_value(), 4.5);

        form.qty = "a dozen".into();
        form.price = "".into();
        assert_eq!(form.qty_value(), 0);
        assert_eq!(form.price_value(), 0.0);
    }

    #[test]
    fn test_form_fields_per_action() {
        let buy_ipo = ActionForm::new(TradeAction::BuyIpo);
        assert_eq!(
            buy_ipo.fields(),
            vec![FormField::Category, FormField::Meal, FormField::Qty]
        );

        let sell = ActionForm::new(TradeAction::Sell);
        assert_eq!(
            sell.fields(),
            vec![
                FormField::Category,
                FormField::Meal,
                FormField::Qty,
                FormField::Price,
                FormField::Flag
            ]
        );
    }

    #[test]
    fn test_field_cycling_wraps() {
        let mut form = ActionForm::new(TradeAction::BuyIpo);
        form.next_field();
        assert_eq!(form.field, FormField::Meal);
        form.next_field();
        form.next_field();
        assert_eq!(form.field, FormField::Category);
        form.prev_field();
        assert_eq!(form.field, FormField::Qty);
    }

    #[test]
    fn test_cycle_option() {
        let options = ["Chicken", "Beef", "Misc"];
        assert_eq!(cycle_option(None, &options, true).as_deref(), Some("Chicken"));
        assert_eq!(
            cycle_option(Some("Chicken"), &options, true).as_deref(),
            Some("Beef")
        );
        assert_eq!(
            cycle_option(Some("Misc"), &options, true).as_deref(),
            Some("Chicken")
        );
        assert_eq!(
            cycle_option(Some("Chicken"), &options, false).as_deref(),
            Some("Misc")
        );
        assert_eq!(cycle_option(None, &[], true), None);
    }

    #[test]
    fn test_followup_contract() {
        let ok = ActionResponse {
            success: true,
            message: "Bought 2 shares".into(),
        };
        let rejected = ActionResponse {
            success: false,
            message: "Insufficient funds".into(),
        };
        assert_eq!(followup(&ok), Followup::CloseAndRefresh);
        assert_eq!(followup(&rejected), Followup::NoticeOnly);
    }

    #[test]
    fn test_reset_selection_clears_dropdowns_only() {
        let mut form = ActionForm::new(TradeAction::Sell);
        form.category = Some("Beef".into());
        form.meal = Some("Beef Stew".into());
        form.qty = "3".into();

        form.reset_selection();
        assert_eq!(form.category, None);
        assert_eq!(form.meal, None);
        assert_eq!(form.qty, "3");
    }
}
