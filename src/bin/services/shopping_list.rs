use std::{collections::BTreeMap, ops::Deref};

use itertools::Itertools;
use lombok::AllArgsConstructor;
use serde::Serialize;
use tracing::{debug, trace_span};

use crate::database::store::{Store, StoreError};

pub const SHOPPING_LIST_FILE_NAME: &str = "shopping_list.txt";
pub const SHOPPING_LIST_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
pub const EMPTY_CART_MESSAGE: &str = "Your shopping cart is empty.";
const SHOPPING_LIST_HEADER: &str = "Shopping list:";

/// Total amount of one ingredient across every recipe in a cart.
#[derive(Serialize, AllArgsConstructor, Debug, Clone, PartialEq, Eq)]
pub struct AggregatedLine {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

/// Amounts keyed by (name, measurement unit), kept in name then unit order.
#[derive(Clone, Default)]
pub struct ShoppingList {
    inner: BTreeMap<(String, String), i64>,
}

impl ShoppingList {
    pub fn new() -> Self {
        Self {
            inner: BTreeMap::new(),
        }
    }

    pub fn add_amount(&mut self, name: &str, measurement_unit: &str, amount: i64) {
        self.inner
            .entry((name.to_owned(), measurement_unit.to_owned()))
            .and_modify(|current_amount| {
                *current_amount += amount;
            })
            .or_insert(amount);
    }

    pub fn add_line(&mut self, line: &AggregatedLine) {
        self.add_amount(&line.name, &line.measurement_unit, line.total_amount);
    }

    pub fn into_lines(self) -> Vec<AggregatedLine> {
        self.inner
            .into_iter()
            .map(|((name, measurement_unit), total_amount)| {
                AggregatedLine::new(name, measurement_unit, total_amount)
            })
            .collect()
    }
}

impl Deref for ShoppingList {
    type Target = BTreeMap<(String, String), i64>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl std::fmt::Debug for ShoppingList {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

pub struct ShoppingListAggregator<'a, S: ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> ShoppingListAggregator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Everything the user's cart needs, one line per (name, unit), sorted
    /// by name and then unit. An empty cart gives an empty list.
    pub fn collect(&self, user_id: i32) -> Result<Vec<AggregatedLine>, StoreError> {
        let span = trace_span!("collecting shopping list", user_id);
        let _guard = span.enter();

        let rows = self.store.sum_amounts_by_ingredient_for_user(user_id)?;
        debug!("Store returned {} grouped rows", rows.len());

        // Merge again so ordering and grouping hold whatever the store did.
        let mut list = ShoppingList::new();
        rows.iter().for_each(|row| list.add_line(row));
        debug!("Merged into {} lines", list.len());

        Ok(list.into_lines())
    }

    pub fn build(&self, user_id: i32) -> Result<String, StoreError> {
        Ok(render(&self.collect(user_id)?))
    }
}

pub fn render(lines: &[AggregatedLine]) -> String {
    if lines.is_empty() {
        return EMPTY_CART_MESSAGE.to_owned();
    }

    let body = lines
        .iter()
        .map(|line| {
            format!(
                "• {} ({}) — {}\n",
                line.name, line.measurement_unit, line.total_amount
            )
        })
        .join("");

    format!("{SHOPPING_LIST_HEADER}\n\n{body}")
}

pub fn render_json(lines: &[AggregatedLine]) -> serde_json::Result<String> {
    serde_json::to_string_pretty(lines)
}
