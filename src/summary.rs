//! Computes the dashboard sums displayed above the transaction list.

use crate::transaction::Transaction;

/// The running sums shown on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Totals {
    /// The sum of every transaction amount, i.e. the current balance.
    pub total: f64,
    /// The sum of the positive (income) amounts. Never negative.
    pub budget: f64,
    /// The sum of the negative (expense) amounts. Never positive.
    pub expense: f64,
}

/// Compute the dashboard sums over `transactions`.
///
/// Pure and free of ordering dependencies: `total == budget + expense` up
/// to IEEE-754 rounding, with standard double-precision accumulation.
pub fn compute_totals(transactions: &[Transaction]) -> Totals {
    let total: f64 = transactions.iter().map(|transaction| transaction.amount).sum();
    let budget: f64 = transactions
        .iter()
        .filter(|transaction| transaction.amount > 0.0)
        .map(|transaction| transaction.amount)
        .sum();

    Totals {
        total,
        budget,
        expense: total - budget,
    }
}
