// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use comfy_table::{Cell, Table, presets::UTF8_FULL};
use rand::{Rng, distributions::Alphanumeric};
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Amounts are entered as plain non-negative numbers; the transaction type
/// carries the sign.
pub fn parse_amount(s: &str) -> Result<Decimal> {
    let d = parse_decimal(s)?;
    if d.is_sign_negative() && !d.is_zero() {
        bail!("Amount '{}' must not be negative; use --type expense instead", s);
    }
    Ok(d)
}

/// Formats as US dollars: `$1,234.50`, `-$20.00`.
pub fn fmt_usd(d: &Decimal) -> String {
    let rounded = d.round_dp(2);
    let sign = if rounded.is_sign_negative() && !rounded.is_zero() {
        "-"
    } else {
        ""
    };
    let plain = format!("{:.2}", rounded.abs());
    let (whole, cents) = plain.split_once('.').unwrap_or((plain.as_str(), "00"));
    let mut grouped = String::with_capacity(whole.len() + whole.len() / 3);
    for (i, ch) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    format!("{}${}.{}", sign, grouped, cents)
}

/// Percentage to one decimal place, e.g. `80.0%`.
pub fn fmt_percent(d: &Decimal) -> String {
    format!("{:.1}%", d.round_dp(1))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn random_id(len: usize) -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    #[test]
    fn usd_formatting_groups_thousands() {
        assert_eq!(fmt_usd(&dec("0")), "$0.00");
        assert_eq!(fmt_usd(&dec("5.5")), "$5.50");
        assert_eq!(fmt_usd(&dec("1234.5")), "$1,234.50");
        assert_eq!(fmt_usd(&dec("1234567.891")), "$1,234,567.89");
        assert_eq!(fmt_usd(&dec("-20")), "-$20.00");
        assert_eq!(fmt_usd(&dec("-0.001")), "$0.00");
    }

    #[test]
    fn percent_has_one_decimal() {
        assert_eq!(fmt_percent(&dec("80")), "80.0%");
        assert_eq!(fmt_percent(&dec("33.3333")), "33.3%");
    }

    #[test]
    fn amount_rejects_negative_and_garbage() {
        assert_eq!(parse_amount(" 12.50 ").unwrap(), dec("12.5"));
        assert!(parse_amount("-3").is_err());
        assert!(parse_amount("$3").is_err());
    }

    #[test]
    fn date_requires_iso_format() {
        assert!(parse_date("2024-02-29").is_ok());
        assert!(parse_date("02/29/2024").is_err());
    }
}
