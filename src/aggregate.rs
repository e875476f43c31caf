// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Dashboard and analytics figures derived from a list of transactions.
//!
//! Everything here is a pure function of its input. Amounts are summed as
//! [`Decimal`] so totals never pick up float drift.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::Serialize;

use crate::models::Transaction;

/// How many transactions the dashboard lists as "recent".
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub income: Decimal,
    pub expense: Decimal,
}

impl Totals {
    pub fn net(&self) -> Decimal {
        self.income - self.expense
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BalancePoint {
    pub date: NaiveDate,
    pub balance: Decimal,
}

fn sum<'a>(txs: impl Iterator<Item = &'a Transaction>) -> Totals {
    txs.fold(Totals::default(), |mut acc, t| {
        if t.is_income() {
            acc.income += t.amount;
        } else {
            acc.expense += t.amount;
        }
        acc
    })
}

pub fn income_and_expense(txs: &[Transaction]) -> Totals {
    sum(txs.iter())
}

/// All-time income minus all-time expense.
pub fn total_balance(txs: &[Transaction]) -> Decimal {
    income_and_expense(txs).net()
}

/// Income and expense of one calendar month. `month` is 1-based.
pub fn monthly_income_expense(txs: &[Transaction], month: u32, year: i32) -> Totals {
    sum(txs
        .iter()
        .filter(|t| t.date.month() == month && t.date.year() == year))
}

/// Cumulative balance over time, oldest first.
///
/// Holds an ascending copy of the input; [`iter`](Self::iter) walks it lazily
/// and can be called any number of times.
#[derive(Debug, Clone)]
pub struct RunningBalanceSeries {
    steps: Vec<(NaiveDate, Decimal)>,
}

impl RunningBalanceSeries {
    pub fn iter(&self) -> impl Iterator<Item = BalancePoint> + '_ {
        self.steps
            .iter()
            .scan(Decimal::ZERO, |balance, (date, delta)| {
                *balance += *delta;
                Some(BalancePoint {
                    date: *date,
                    balance: *balance,
                })
            })
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// One point per transaction: income adds, expense subtracts. Same-day
/// transactions keep their input order.
pub fn running_balance_series(txs: &[Transaction]) -> RunningBalanceSeries {
    let mut steps: Vec<(NaiveDate, Decimal)> =
        txs.iter().map(|t| (t.date, t.signed_amount())).collect();
    steps.sort_by_key(|(date, _)| *date);
    RunningBalanceSeries { steps }
}

/// Expense totals per category label, in the order each label first appears.
///
/// Labels are grouped exactly as stored, so "Food" and "food" are separate
/// groups. Filtering compares labels case-insensitively; the two are
/// deliberately left as they are.
pub fn category_breakdown(txs: &[Transaction]) -> Vec<CategoryTotal> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<CategoryTotal> = Vec::new();
    for t in txs.iter().filter(|t| t.is_expense()) {
        match index.get(t.category.as_str()) {
            Some(&i) => out[i].total += t.amount,
            None => {
                index.insert(t.category.as_str(), out.len());
                out.push(CategoryTotal {
                    category: t.category.clone(),
                    total: t.amount,
                });
            }
        }
    }
    out
}

/// The expense category with the largest total. On a tie the category seen
/// first in `txs` wins, so the answer depends on input order.
pub fn top_expense_category(txs: &[Transaction]) -> Option<CategoryTotal> {
    category_breakdown(txs)
        .into_iter()
        .fold(None, |best: Option<CategoryTotal>, c| match best {
            Some(b) if b.total >= c.total => Some(b),
            _ => Some(c),
        })
}

/// Share of income kept, as a percentage. Zero when there is no income.
pub fn saving_rate(total_income: Decimal, total_expense: Decimal) -> Decimal {
    if total_income > Decimal::ZERO {
        (total_income - total_expense) / total_income * Decimal::ONE_HUNDRED
    } else {
        Decimal::ZERO
    }
}

/// Total expense spread over the months that had any expense.
pub fn average_monthly_expense(txs: &[Transaction]) -> Decimal {
    let months: HashSet<(i32, u32)> = txs
        .iter()
        .filter(|t| t.is_expense())
        .map(|t| (t.date.year(), t.date.month()))
        .collect();
    if months.is_empty() {
        return Decimal::ZERO;
    }
    income_and_expense(txs).expense / Decimal::from(months.len())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub total_balance: Decimal,
    pub this_month: Totals,
    pub recent: Vec<Transaction>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Analytics {
    pub totals: Totals,
    pub saving_rate: Decimal,
    pub top_category: Option<CategoryTotal>,
    pub average_monthly_expense: Decimal,
    pub breakdown: Vec<CategoryTotal>,
}

/// Everything the views show, computed in one pass over the snapshot.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Aggregates {
    pub dashboard: Dashboard,
    pub analytics: Analytics,
}

impl Aggregates {
    /// `txs` is expected newest first, as the mirror keeps it; the first
    /// [`RECENT_LIMIT`] entries become the recent list.
    pub fn compute(txs: &[Transaction], today: NaiveDate) -> Self {
        let totals = income_and_expense(txs);
        let breakdown = category_breakdown(txs);
        let top_category = top_expense_category(txs);
        Self {
            dashboard: Dashboard {
                total_balance: totals.net(),
                this_month: monthly_income_expense(txs, today.month(), today.year()),
                recent: txs.iter().take(RECENT_LIMIT).cloned().collect(),
            },
            analytics: Analytics {
                totals,
                saving_rate: saving_rate(totals.income, totals.expense),
                top_category,
                average_monthly_expense: average_monthly_expense(txs),
                breakdown,
            },
        }
    }
}

impl Default for Aggregates {
    fn default() -> Self {
        Self::compute(&[], NaiveDate::default())
    }
}
