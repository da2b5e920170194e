//! Pure functions that turn transaction and budget totals into dashboard figures.

use serde::Serialize;

use crate::{
    month::MonthWindow,
    transaction::{Transaction, TransactionType},
};

/// Income and expenses within one month window.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyTotals {
    /// The window's display name, e.g. "Jan 24".
    pub name: String,
    /// Total income.
    pub income: f64,
    /// Total expenses.
    pub expense: f64,
}

impl MonthlyTotals {
    /// Round the totals to `decimals` places for display.
    pub fn rounded(self, decimals: i32) -> Self {
        Self {
            name: self.name,
            income: round_to(self.income, decimals),
            expense: round_to(self.expense, decimals),
        }
    }
}

/// The change from `previous` to `current` as a percentage of `previous`.
///
/// Returns zero when `previous` is zero.
pub(crate) fn percentage_change(current: f64, previous: f64) -> f64 {
    if previous == 0.0 {
        return 0.0;
    }

    (current - previous) / previous * 100.0
}

/// Sum income and expenses into one [MonthlyTotals] per window, in window order.
///
/// Each transaction counts towards the first window whose date range contains it.
/// Transactions outside every window are ignored.
pub(crate) fn bucket_by_month(
    transactions: &[Transaction],
    windows: &[MonthWindow],
) -> Vec<MonthlyTotals> {
    let mut totals: Vec<MonthlyTotals> = windows
        .iter()
        .map(|window| MonthlyTotals {
            name: window.name.clone(),
            income: 0.0,
            expense: 0.0,
        })
        .collect();

    for transaction in transactions {
        let Some(index) = windows
            .iter()
            .position(|window| window.contains(transaction.date))
        else {
            continue;
        };

        match transaction.transaction_type {
            TransactionType::Income => totals[index].income += transaction.amount,
            TransactionType::Expense => totals[index].expense += transaction.amount,
        }
    }

    totals
}

/// How much of the budget has been spent, as a percentage.
///
/// Returns zero if nothing was budgeted. The result is not capped at 100.
pub(crate) fn budget_status(total_spent: f64, total_budget: f64) -> f64 {
    if total_budget <= 0.0 {
        return 0.0;
    }

    total_spent / total_budget * 100.0
}

/// The share of `income` that was saved, as a percentage.
///
/// Returns zero if there was no income.
pub(crate) fn savings_rate(income: f64, net_savings: f64) -> f64 {
    if income <= 0.0 {
        return 0.0;
    }

    net_savings / income * 100.0
}

/// Round `value` to `decimals` decimal places.
pub(crate) fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10_f64.powi(decimals);

    (value * factor).round() / factor
}

#[cfg(test)]
mod aggregation_tests {
    use time::{OffsetDateTime, macros::date};

    use crate::{
        MonthYear, UserID,
        month::trailing_month_windows,
        transaction::{Transaction, TransactionType},
    };

    use super::{
        MonthlyTotals, bucket_by_month, budget_status, percentage_change, round_to, savings_rate,
    };

    fn create_test_transaction(
        amount: f64,
        transaction_type: TransactionType,
        date: time::Date,
    ) -> Transaction {
        Transaction {
            id: 1,
            user_id: UserID::new(1),
            amount,
            transaction_type,
            category: "Test".to_owned(),
            description: None,
            date,
            created_at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn percentage_change_is_zero_without_previous_value() {
        for current in [-10.0, 0.0, 0.5, 1e9] {
            assert_eq!(percentage_change(current, 0.0), 0.0);
        }
    }

    #[test]
    fn percentage_change_is_relative_to_previous() {
        assert_eq!(percentage_change(150.0, 100.0), 50.0);
        assert_eq!(percentage_change(50.0, 100.0), -50.0);
        assert_eq!(percentage_change(0.0, 100.0), -100.0);
    }

    #[test]
    fn budget_status_is_not_capped() {
        assert_eq!(budget_status(50.0, 0.0), 0.0);
        assert_eq!(budget_status(50.0, 200.0), 25.0);
        assert_eq!(budget_status(300.0, 200.0), 150.0);
    }

    #[test]
    fn savings_rate_handles_no_income() {
        assert_eq!(savings_rate(0.0, -20.0), 0.0);
        assert_eq!(savings_rate(200.0, 50.0), 25.0);
        assert_eq!(savings_rate(200.0, -100.0), -50.0);
    }

    #[test]
    fn rounds_to_decimal_places() {
        assert_eq!(round_to(10.456, 2), 10.46);
        assert_eq!(round_to(33.333_333, 1), 33.3);
        assert_eq!(round_to(-2.25, 0), -2.0);
    }

    #[test]
    fn buckets_transactions_by_window() {
        let windows = trailing_month_windows("2024-03".parse::<MonthYear>().unwrap(), 3);
        let transactions = [
            create_test_transaction(100.0, TransactionType::Income, date!(2024 - 01 - 01)),
            create_test_transaction(20.0, TransactionType::Expense, date!(2024 - 01 - 31)),
            create_test_transaction(5.0, TransactionType::Expense, date!(2024 - 03 - 15)),
            create_test_transaction(7.0, TransactionType::Expense, date!(2024 - 03 - 15)),
        ];

        let got = bucket_by_month(&transactions, &windows);

        assert_eq!(
            got,
            [
                MonthlyTotals {
                    name: "Jan 24".to_owned(),
                    income: 100.0,
                    expense: 20.0
                },
                MonthlyTotals {
                    name: "Feb 24".to_owned(),
                    income: 0.0,
                    expense: 0.0
                },
                MonthlyTotals {
                    name: "Mar 24".to_owned(),
                    income: 0.0,
                    expense: 12.0
                },
            ]
        );
    }

    #[test]
    fn bucket_totals_only_include_transactions_inside_windows() {
        let windows = trailing_month_windows("2024-06".parse::<MonthYear>().unwrap(), 6);
        let inside = [
            create_test_transaction(1.25, TransactionType::Income, date!(2024 - 01 - 01)),
            create_test_transaction(2.5, TransactionType::Expense, date!(2024 - 03 - 09)),
            create_test_transaction(4.0, TransactionType::Income, date!(2024 - 06 - 30)),
        ];
        let outside = [
            create_test_transaction(1000.0, TransactionType::Income, date!(2023 - 12 - 31)),
            create_test_transaction(1000.0, TransactionType::Expense, date!(2024 - 07 - 01)),
        ];
        let all: Vec<_> = inside.iter().chain(outside.iter()).cloned().collect();

        let got = bucket_by_month(&all, &windows);

        let bucket_sum: f64 = got.iter().map(|totals| totals.income + totals.expense).sum();
        let inside_sum: f64 = inside.iter().map(|transaction| transaction.amount).sum();
        assert_eq!(got.len(), 6);
        assert_eq!(bucket_sum, inside_sum);
    }

    #[test]
    fn rounded_totals_keep_name() {
        let totals = MonthlyTotals {
            name: "Jan 24".to_owned(),
            income: 0.1 + 0.2,
            expense: 1.005_1,
        };

        let rounded = totals.rounded(2);

        assert_eq!(rounded.name, "Jan 24");
        assert_eq!(rounded.income, 0.3);
        assert_eq!(rounded.expense, 1.01);
    }
}
