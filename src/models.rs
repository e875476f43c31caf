// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

pub const TRANSACTIONS: &str = "transactions";
pub const CATEGORIES: &str = "categories";

/// Shown in place of the user's categories while they have none of their own.
pub const DEFAULT_CATEGORIES: [&str; 4] = ["Food", "Transport", "Salary", "Utilities"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxType {
    Income,
    Expense,
}

impl TxType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxType::Income => "income",
            TxType::Expense => "expense",
        }
    }
}

impl fmt::Display for TxType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(TxType::Income),
            "expense" => Ok(TxType::Expense),
            other => Err(format!("Unknown transaction type '{}' (use income|expense)", other)),
        }
    }
}

/// A stored income or expense record.
///
/// Field names follow the persisted document shape, so a `Transaction`
/// decodes straight from a store document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub uid: String,
    #[serde(rename = "type")]
    pub r#type: TxType,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.r#type == TxType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.r#type == TxType::Expense
    }

    /// Amount with the sign it contributes to the balance.
    pub fn signed_amount(&self) -> Decimal {
        match self.r#type {
            TxType::Income => self.amount,
            TxType::Expense => -self.amount,
        }
    }
}

/// User-entered fields of a transaction that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewTransaction {
    #[serde(rename = "type")]
    pub r#type: TxType,
    #[serde(with = "rust_decimal::serde::float")]
    pub amount: Decimal,
    pub date: NaiveDate,
    pub category: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default)]
    pub uid: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime<Utc>>,
}

impl Category {
    /// A built-in category. It has no id and is never persisted.
    pub fn builtin(name: &str) -> Self {
        Self {
            id: None,
            uid: String::new(),
            name: name.to_string(),
            created_at: None,
        }
    }

    pub fn is_default(&self) -> bool {
        self.id.is_none()
    }
}

/// The categories a user gets to pick from: their own, or the defaults while
/// they have none.
pub fn display_categories(custom: &[Category]) -> Vec<Category> {
    if custom.is_empty() {
        DEFAULT_CATEGORIES.iter().map(|n| Category::builtin(n)).collect()
    } else {
        custom.to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn transaction_decodes_from_document_shape() {
        let doc = json!({
            "id": "abc",
            "uid": "u1",
            "type": "expense",
            "amount": 12.5,
            "date": "2024-03-09",
            "category": "Food",
            "note": "lunch",
            "createdAt": "2024-03-09T12:00:00Z"
        });
        let tx: Transaction = serde_json::from_value(doc).unwrap();
        assert_eq!(tx.id.as_deref(), Some("abc"));
        assert_eq!(tx.r#type, TxType::Expense);
        assert_eq!(tx.amount, dec("12.5"));
        assert_eq!(tx.date, NaiveDate::from_ymd_opt(2024, 3, 9).unwrap());
        assert_eq!(tx.signed_amount(), dec("-12.5"));
    }

    #[test]
    fn amount_is_stored_as_a_number() {
        let new_tx = NewTransaction {
            r#type: TxType::Income,
            amount: dec("1000"),
            date: NaiveDate::from_ymd_opt(2024, 1, 5).unwrap(),
            category: "Salary".into(),
            note: None,
        };
        let v = serde_json::to_value(&new_tx).unwrap();
        assert!(v["amount"].is_number());
        assert_eq!(v["type"], "income");
        assert_eq!(v["date"], "2024-01-05");
        assert!(v.get("note").is_none());
    }

    #[test]
    fn tx_type_parses_case_insensitively() {
        assert_eq!("Income".parse::<TxType>().unwrap(), TxType::Income);
        assert_eq!(" expense ".parse::<TxType>().unwrap(), TxType::Expense);
        assert!("transfer".parse::<TxType>().is_err());
    }

    #[test]
    fn defaults_only_when_no_custom_categories() {
        let defaults = display_categories(&[]);
        let names: Vec<_> = defaults.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, DEFAULT_CATEGORIES);
        assert!(defaults.iter().all(Category::is_default));

        let custom = vec![Category {
            id: Some("c1".into()),
            uid: "u1".into(),
            name: "Rent".into(),
            created_at: None,
        }];
        assert_eq!(display_categories(&custom), custom);
    }
}
