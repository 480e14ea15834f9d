/// Core wire types for the dining exchange API
///
/// These types match the JSON shapes served by the exchange backend. The
/// backend encodes failures inside the JSON body (`success: false` plus a
/// message) rather than relying on HTTP status codes alone, so response
/// types carry those fields with defaults.
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One instrument entry from the market summary poll
///
/// Replaced wholesale on every poll; `name` is the stable key.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct MealSummary {
    /// Unique meal name, stable across polls
    pub name: String,
    /// Category label (e.g. "Chicken", "Beef", "Misc")
    pub category: String,
    /// Remaining house supply; 0 means unavailable
    pub house_supply: u32,
    /// Lowest active ask, absent when the book has no asks
    #[serde(default)]
    pub best_ask: Option<f64>,
    /// Highest active bid, absent when the book has no bids
    #[serde(default)]
    pub best_bid: Option<f64>,
    /// Ask/bid spread, present only when both sides are quoted
    #[serde(default)]
    pub spread: Option<f64>,
}

impl MealSummary {
    /// Price sampled into the history buffer: best bid when quoted at a
    /// positive price, otherwise best ask, otherwise nothing.
    pub fn observed_price(&self) -> Option<f64> {
        self.best_bid
            .filter(|p| p.is_finite() && *p > 0.0)
            .or(self.best_ask.filter(|p| p.is_finite() && *p > 0.0))
    }
}

/// Full market summary snapshot
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct MarketSummary {
    /// All instruments in server order
    #[serde(default)]
    pub meals: Vec<MealSummary>,
    /// Current IPO price, when the server includes it
    #[serde(default)]
    pub ipo_price: Option<f64>,
    /// Whether the IPO clock is running
    #[serde(default)]
    pub ipo_active: Option<bool>,
}

/// Logged-in user state from `current_user`
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CurrentUser {
    pub username: String,
    pub balance: f64,
    pub ipo_price: f64,
}

/// One executed trade from the history feed
///
/// The backend has served both `meal`/`qty` and `meal_name`/`quantity`
/// spellings; aliases accept either.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
pub struct TradeRecord {
    pub buyer: String,
    pub seller: String,
    #[serde(alias = "meal_name")]
    pub meal: String,
    #[serde(alias = "quantity")]
    pub qty: u32,
    pub price: f64,
}

/// One portfolio position
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq)]
pub struct Position {
    pub shares: i64,
    #[serde(default)]
    pub is_short: bool,
}

/// Portfolio mapping: meal name -> position
pub type Portfolio = BTreeMap<String, Position>;

/// Response to a login attempt
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
}

/// Response to any trade action (`start_ipo`, `buy_ipo`, `secondary_buy`, `sell`)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ActionResponse {
    pub success: bool,
    #[serde(default)]
    pub message: String,
}

/// Request body for `login`
#[derive(Debug, Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
}

/// Request body for `buy_ipo`
#[derive(Debug, Serialize)]
pub struct BuyIpoRequest<'a> {
    pub meal: &'a str,
    pub qty: u32,
}

/// Request body for `secondary_buy`
#[derive(Debug, Serialize)]
pub struct SecondaryBuyRequest<'a> {
    pub meal: &'a str,
    pub price: f64,
    pub qty: u32,
    pub snap_buy: bool,
}

/// Request body for `sell`
#[derive(Debug, Serialize)]
pub struct SellRequest<'a> {
    pub meal: &'a str,
    pub price: f64,
    pub qty: u32,
    pub is_short: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meal_summary_missing_quotes() {
        let json = r#"{"name":"Taco Chicken","category":"Chicken","house_supply":500,
                       "best_ask":null,"best_bid":null,"spread":null}"#;
        let meal: MealSummary = serde_json::from_str(json).unwrap();
        assert_eq!(meal.best_ask, None);
        assert_eq!(meal.best_bid, None);
        assert_eq!(meal.observed_price(), None);
    }

    #[test]
    fn test_observed_price_prefers_bid() {
        let mut meal = MealSummary {
            name: "Beef Stew".into(),
            category: "Beef".into(),
            house_supply: 10,
            best_ask: Some(7.5),
            best_bid: Some(5.0),
            spread: Some(2.5),
        };
        assert_eq!(meal.observed_price(), Some(5.0));

        // Zero bid is not a usable quote; fall through to the ask
        meal.best_bid = Some(0.0);
        assert_eq!(meal.observed_price(), Some(7.5));

        meal.best_bid = None;
        assert_eq!(meal.observed_price(), Some(7.5));
    }

    #[test]
    fn test_trade_record_field_aliases() {
        struct TestCase {
            input: &'static str,
            expected: TradeRecord,
        }

        let tests = vec![
            TestCase {
                // TC0: short spellings
                input: r#"{"buyer":"Josh","seller":"Jack","meal":"Sloppy Joes","qty":3,"price":4.25}"#,
                expected: TradeRecord {
                    buyer: "Josh".into(),
                    seller: "Jack".into(),
                    meal: "Sloppy Joes".into(),
                    qty: 3,
                    price: 4.25,
                },
            },
            TestCase {
                // TC1: long spellings from the database-backed server
                input: r#"{"buyer":"Levi","seller":"IPO_HOUSE","meal_name":"Roasted Chicken","quantity":2,"price":200.0}"#,
                expected: TradeRecord {
                    buyer: "Levi".into(),
                    seller: "IPO_HOUSE".into(),
                    meal: "Roasted Chicken".into(),
                    qty: 2,
                    price: 200.0,
                },
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual: TradeRecord = serde_json::from_str(test.input).unwrap();
            assert_eq!(actual, test.expected, "TC{index} failed");
        }
    }

    #[test]
    fn test_market_summary_tolerates_extra_fields() {
        let json = r#"{"ipo_price":187.0,"ipo_active":true,
                       "meals":[{"id":7,"name":"Lamb Gyro","category":"Beef","house_supply":0,
                                 "best_ask":6.0,"best_bid":null,"spread":null}]}"#;
        let summary: MarketSummary = serde_json::from_str(json).unwrap();
        assert_eq!(summary.ipo_price, Some(187.0));
        assert_eq!(summary.meals.len(), 1);
        assert_eq!(summary.meals[0].house_supply, 0);
        assert_eq!(summary.meals[0].observed_price(), Some(6.0));
    }

    #[test]
    fn test_action_response_without_message() {
        let resp: ActionResponse = serde_json::from_str(r#"{"success":true,"ipo_price":200.0}"#).unwrap();
        assert!(resp.success);
        assert!(resp.message.is_empty());
    }

    #[test]
    fn test_portfolio_mapping() {
        let json = r#"{"Beef Stew":{"shares":5,"is_short":false},"Turkey Dogs":{"shares":-2,"is_short":true}}"#;
        let portfolio: Portfolio = serde_json::from_str(json).unwrap();
        assert_eq!(portfolio.len(), 2);
        assert!(portfolio["Turkey Dogs"].is_short);
        assert_eq!(portfolio["Turkey Dogs"].shares, -2);
    }
}
