// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::aggregate::Aggregates;
use crate::models::{Category, Transaction};

/// A view surface kept up to date by the [`Mirror`](crate::mirror::Mirror).
///
/// Every method has an empty default so a view only implements what it
/// shows. Implementations get read-only data and must not call back into
/// the mirror's write operations.
pub trait ViewNotifier {
    /// Called after every transaction snapshot rebuild.
    fn render(&self, _aggregates: &Aggregates, _transactions: &[Transaction]) {}

    /// Called with the categories to display (defaults included when the user
    /// has none).
    fn render_categories(&self, _categories: &[Category]) {}

    /// Called with the result of [`Mirror::apply_filter`](crate::mirror::Mirror::apply_filter).
    fn render_filtered(&self, _transactions: &[Transaction]) {}

    /// A message the user has to see.
    fn alert(&self, _message: &str) {}
}

/// Prints alerts to stderr. Rendering is left to the command that asked.
#[derive(Debug, Default, Clone, Copy)]
pub struct TerminalNotifier;

impl ViewNotifier for TerminalNotifier {
    fn alert(&self, message: &str) {
        eprintln!("! {}", message);
    }
}
