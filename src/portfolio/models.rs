// src/portfolio/models.rs
use serde::{Deserialize, Serialize};

use crate::models::Position;

/// Input for creating a position. The symbol may arrive in any case;
/// validation of the numeric fields belongs to the API layer.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPosition {
    pub symbol: String,
    pub purchase_price: f64,
    pub quantity: f64,
}

/// Partial update; only the provided fields are applied.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PositionPatch {
    pub symbol: Option<String>,
    pub purchase_price: Option<f64>,
    pub quantity: Option<f64>,
}

/// A position enriched with live pricing. Recomputed on every read, never
/// cached.
#[derive(Debug, Clone, Serialize)]
pub struct ValuedPosition {
    #[serde(flatten)]
    pub position: Position,
    pub current_price: f64,
    pub current_value: f64,
    pub total_cost: f64,
    pub profit_loss: f64,
    pub profit_loss_percentage: f64,
}

impl ValuedPosition {
    /// Derive the valuation fields from a position and its current price.
    /// A zero total cost pins the profit/loss percentage at 0.
    pub fn compute(position: Position, current_price: f64) -> Self {
        let current_value = current_price * position.quantity;
        let total_cost = position.purchase_price * position.quantity;
        let profit_loss = current_value - total_cost;
        let profit_loss_percentage = if total_cost > 0.0 {
            profit_loss / total_cost * 100.0
        } else {
            0.0
        };

        Self {
            position,
            current_price,
            current_value,
            total_cost,
            profit_loss,
            profit_loss_percentage,
        }
    }
}

/// Per-symbol share of the portfolio's current value.
#[derive(Debug, Clone, Serialize)]
pub struct AllocationSlice {
    pub symbol: String,
    pub name: String,
    pub value: f64,
    pub percentage: f64,
}

/// Aggregates over a user's valued positions.
#[derive(Debug, Clone, Serialize)]
pub struct PortfolioSummary {
    pub total_balance: f64,
    pub total_cost: f64,
    pub total_profit_loss: f64,
    pub total_profit_loss_percentage: f64,
    pub active_assets: usize,
    pub allocation: Vec<AllocationSlice>,
    pub items: Vec<ValuedPosition>,
}

impl PortfolioSummary {
    /// Aggregate valued positions. When the total value is 0 every
    /// allocation entry is 0% rather than dividing by zero.
    pub fn from_items(items: Vec<ValuedPosition>) -> Self {
        let total_balance: f64 = items.iter().map(|item| item.current_value).sum();
        let total_cost: f64 = items.iter().map(|item| item.total_cost).sum();
        let total_profit_loss = total_balance - total_cost;
        let total_profit_loss_percentage = if total_cost > 0.0 {
            total_profit_loss / total_cost * 100.0
        } else {
            0.0
        };

        let allocation = items
            .iter()
            .map(|item| AllocationSlice {
                symbol: item.position.symbol.clone(),
                name: item.position.name.clone(),
                value: item.current_value,
                percentage: if total_balance > 0.0 {
                    item.current_value / total_balance * 100.0
                } else {
                    0.0
                },
            })
            .collect();

        Self {
            total_balance,
            total_cost,
            total_profit_loss,
            total_profit_loss_percentage,
            active_assets: items.len(),
            allocation,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Id;
    use chrono::{TimeZone, Utc};

    fn position(symbol: &str, purchase_price: f64, quantity: f64) -> Position {
        let at = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
        Position {
            id: Id::new(),
            user_id: Id::from_string("u1"),
            symbol: symbol.to_string(),
            name: symbol.to_string(),
            purchase_price,
            quantity,
            asset_type: None,
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn gain_scenario() {
        let valued = ValuedPosition::compute(position("AAPL", 100.0, 10.0), 150.0);
        assert_eq!(valued.total_cost, 1000.0);
        assert_eq!(valued.current_value, 1500.0);
        assert_eq!(valued.profit_loss, 500.0);
        assert_eq!(valued.profit_loss_percentage, 50.0);
    }

    #[test]
    fn loss_scenario() {
        let valued = ValuedPosition::compute(position("AAPL", 100.0, 10.0), 80.0);
        assert_eq!(valued.profit_loss, -200.0);
        assert_eq!(valued.profit_loss_percentage, -20.0);
    }

    #[test]
    fn zero_cost_pins_percentage_at_zero() {
        let valued = ValuedPosition::compute(position("FREE", 0.0, 10.0), 5.0);
        assert_eq!(valued.total_cost, 0.0);
        assert_eq!(valued.profit_loss, 50.0);
        assert_eq!(valued.profit_loss_percentage, 0.0);
    }

    #[test]
    fn summary_totals_and_allocation() {
        let items = vec![
            ValuedPosition::compute(position("AAPL", 100.0, 10.0), 150.0),
            ValuedPosition::compute(position("MSFT", 200.0, 5.0), 100.0),
        ];
        let summary = PortfolioSummary::from_items(items);

        assert_eq!(summary.total_balance, 2000.0);
        assert_eq!(summary.total_cost, 2000.0);
        assert_eq!(summary.total_profit_loss, 0.0);
        assert_eq!(summary.total_profit_loss_percentage, 0.0);
        assert_eq!(summary.active_assets, 2);

        let total_pct: f64 = summary
            .allocation
            .iter()
            .map(|slice| slice.percentage)
            .sum();
        assert!((total_pct - 100.0).abs() < 1e-9);
        assert_eq!(summary.allocation[0].percentage, 75.0);
        assert_eq!(summary.allocation[1].percentage, 25.0);
    }

    #[test]
    fn summary_with_zero_total_value_has_zero_allocations() {
        let items = vec![
            ValuedPosition::compute(position("DEAD", 10.0, 1.0), 0.0),
            ValuedPosition::compute(position("GONE", 20.0, 2.0), 0.0),
        ];
        let summary = PortfolioSummary::from_items(items);

        assert_eq!(summary.total_balance, 0.0);
        assert!(summary
            .allocation
            .iter()
            .all(|slice| slice.percentage == 0.0));
        assert_eq!(summary.total_profit_loss, -50.0);
    }

    #[test]
    fn empty_summary_is_all_zeroes() {
        let summary = PortfolioSummary::from_items(Vec::new());
        assert_eq!(summary.total_balance, 0.0);
        assert_eq!(summary.total_cost, 0.0);
        assert_eq!(summary.total_profit_loss, 0.0);
        assert_eq!(summary.total_profit_loss_percentage, 0.0);
        assert_eq!(summary.active_assets, 0);
        assert!(summary.allocation.is_empty());
        assert!(summary.items.is_empty());
    }
}
