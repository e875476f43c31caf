// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::convert::Infallible;
use std::str::FromStr;

use crate::models::Transaction;

/// Sentinel accepted by [`CategoryFilter::from_str`] for "no category filter".
/// A blank value means the same.
pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CategoryFilter {
    #[default]
    All,
    /// Held lower-cased.
    Named(String),
}

impl CategoryFilter {
    pub fn named(name: &str) -> Self {
        Self::Named(name.trim().to_lowercase())
    }

    fn matches(&self, category: &str) -> bool {
        match self {
            CategoryFilter::All => true,
            CategoryFilter::Named(name) => category.to_lowercase() == *name,
        }
    }
}

impl FromStr for CategoryFilter {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.eq_ignore_ascii_case(ALL_CATEGORIES) {
            Ok(CategoryFilter::All)
        } else {
            Ok(CategoryFilter::named(s))
        }
    }
}

/// Search box plus category selector over the transaction list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionFilter {
    query: String,
    pub category: CategoryFilter,
}

impl TransactionFilter {
    pub fn new(query: &str, category: CategoryFilter) -> Self {
        Self {
            query: query.to_lowercase(),
            category,
        }
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    /// Case-insensitive substring match against the note or the category.
    /// An empty query matches everything.
    fn matches_query(&self, t: &Transaction) -> bool {
        t.note
            .as_deref()
            .is_some_and(|n| n.to_lowercase().contains(&self.query))
            || t.category.to_lowercase().contains(&self.query)
    }

    pub fn matches(&self, t: &Transaction) -> bool {
        self.matches_query(t) && self.category.matches(&t.category)
    }

    /// The matching transactions, in their original order.
    pub fn apply(&self, txs: &[Transaction]) -> Vec<Transaction> {
        txs.iter().filter(|t| self.matches(t)).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TxType;
    use chrono::NaiveDate;

    fn tx(id: &str, category: &str, note: Option<&str>) -> Transaction {
        Transaction {
            id: Some(id.into()),
            uid: "u1".into(),
            r#type: TxType::Expense,
            amount: "10".parse().unwrap(),
            date: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            category: category.into(),
            note: note.map(String::from),
            created_at: None,
        }
    }

    fn sample() -> Vec<Transaction> {
        vec![
            tx("1", "Food", Some("Weekly groceries")),
            tx("2", "Transport", None),
            tx("3", "food", Some("Pizza night")),
            tx("4", "Utilities", Some("Electric bill")),
        ]
    }

    fn ids(txs: &[Transaction]) -> Vec<&str> {
        txs.iter().filter_map(|t| t.id.as_deref()).collect()
    }

    #[test]
    fn empty_query_and_all_returns_everything_in_order() {
        let txs = sample();
        let out = TransactionFilter::default().apply(&txs);
        assert_eq!(out, txs);
    }

    #[test]
    fn unknown_category_yields_nothing() {
        let f = TransactionFilter::new("", CategoryFilter::named("Rent"));
        assert!(f.apply(&sample()).is_empty());
    }

    #[test]
    fn category_matches_ignoring_case() {
        let f = TransactionFilter::new("", "FOOD".parse().unwrap());
        assert_eq!(ids(&f.apply(&sample())), vec!["1", "3"]);
    }

    #[test]
    fn query_searches_note_and_category() {
        let txs = sample();
        let by_note = TransactionFilter::new("PIZZA", CategoryFilter::All);
        assert_eq!(ids(&by_note.apply(&txs)), vec!["3"]);
        let by_category = TransactionFilter::new("trans", CategoryFilter::All);
        assert_eq!(ids(&by_category.apply(&txs)), vec!["2"]);
    }

    #[test]
    fn query_and_category_are_combined() {
        let f = TransactionFilter::new("groceries", CategoryFilter::named("food"));
        assert_eq!(ids(&f.apply(&sample())), vec!["1"]);
        let f = TransactionFilter::new("groceries", CategoryFilter::named("utilities"));
        assert!(f.apply(&sample()).is_empty());
    }

    #[test]
    fn all_sentinel_parses_in_any_case() {
        assert_eq!("All".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!(
            " Food ".parse::<CategoryFilter>().unwrap(),
            CategoryFilter::Named("food".into())
        );
    }

    #[test]
    fn blank_category_means_all() {
        assert_eq!("".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
        assert_eq!("   ".parse::<CategoryFilter>().unwrap(), CategoryFilter::All);
    }

    #[test]
    fn input_is_left_untouched() {
        let txs = sample();
        let before = txs.clone();
        let _ = TransactionFilter::new("bill", CategoryFilter::All).apply(&txs);
        assert_eq!(txs, before);
    }
}
