// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::io::Write;

use anyhow::Result;
use serde_json::json;

use crate::models::Transaction;

pub const CSV_HEADER: [&str; 5] = ["Date", "Type", "Category", "Amount", "Note"];

/// One row per transaction, in the order given.
pub fn write_csv<W: Write>(txs: &[Transaction], out: W) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(out);
    wtr.write_record(CSV_HEADER)?;
    for t in txs {
        wtr.write_record([
            t.date.to_string(),
            t.r#type.to_string(),
            t.category.clone(),
            t.amount.to_string(),
            t.note.clone().unwrap_or_default(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<W: Write>(txs: &[Transaction], mut out: W) -> Result<()> {
    let items: Vec<_> = txs
        .iter()
        .map(|t| {
            json!({
                "id": t.id, "date": t.date, "type": t.r#type, "category": t.category,
                "amount": t.amount.to_string(), "note": t.note
            })
        })
        .collect();
    out.write_all(serde_json::to_string_pretty(&items)?.as_bytes())?;
    Ok(())
}
