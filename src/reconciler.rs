//! # Inventory Reconciliation
//!
//! Merges a batch of incoming item deltas (adds, updates, deletion markers)
//! into a user's persisted inventory. Deltas come from untrusted producers
//! (AI responses, note scanning, grocery-check events), so the merge screens
//! malformed entries and applies the removal sentinel before anything else.
//!
//! Reconciliation is a replace, not an accumulate: re-applying the same batch
//! to its own output re-sets the same amounts and re-runs removals as no-ops.

use log::debug;

use crate::amounts::parse_leading_int;
use crate::models::InventoryItem;

/// Apply a delta batch to a user's existing inventory items.
///
/// `existing` is the user's current item set; items untouched by any delta
/// are carried forward unchanged — absence from a batch is not deletion.
/// Matching is case-insensitive on `ingredient_name` at every step.
///
/// Fresh identifiers start at `max existing id + 1`; use [`reconcile_from`]
/// when identifiers must be allocated above some external watermark.
pub fn reconcile(
    existing: Vec<InventoryItem>,
    deltas: &[InventoryItem],
    user_id: &str,
) -> Vec<InventoryItem> {
    reconcile_from(existing, deltas, user_id, None)
}

/// [`reconcile`] with an explicit identifier watermark.
///
/// `base_id` is the smallest identifier considered free. The persistence
/// layer passes the store-wide maximum here so that newly inserted items
/// never collide with another user's records.
pub fn reconcile_from(
    existing: Vec<InventoryItem>,
    deltas: &[InventoryItem],
    user_id: &str,
    base_id: Option<i64>,
) -> Vec<InventoryItem> {
    let mut working = existing;

    // Removal markers first, then data-bearing candidates. A candidate whose
    // amount reads as a negative integer is malformed and dropped; amounts
    // that are not integers at all ("to taste") pass through untouched.
    let (removals, candidates): (Vec<&InventoryItem>, Vec<&InventoryItem>) =
        deltas.iter().partition(|delta| delta.is_removal());
    let candidates: Vec<&InventoryItem> = candidates
        .into_iter()
        .filter(|delta| {
            let negative = delta
                .amount
                .as_deref()
                .and_then(parse_leading_int)
                .map(|n| n < 0)
                .unwrap_or(false);
            if negative {
                debug!(
                    "dropping malformed delta for {:?} (negative amount {:?})",
                    delta.ingredient_name, delta.amount
                );
            }
            !negative
        })
        .collect();

    for removal in &removals {
        let name = removal.normalized_name();
        // Deleting an item that is not present is not an error.
        if let Some(pos) = working.iter().position(|item| item.normalized_name() == name) {
            let gone = working.remove(pos);
            debug!("removed {:?} from inventory of {}", gone.ingredient_name, user_id);
        }
    }

    let mut next_id = base_id.unwrap_or(0).max(
        working
            .iter()
            .filter_map(|item| item.id)
            .max()
            .unwrap_or(0)
            + 1,
    );

    let mut result: Vec<InventoryItem> = Vec::with_capacity(working.len() + candidates.len());

    for candidate in candidates {
        let name = candidate.normalized_name();
        if let Some(pos) = working.iter().position(|item| item.normalized_name() == name) {
            // Update in place: the new amount always replaces the old one,
            // while unspecified fields fall back to the stored values.
            // The matched item leaves the working set so a later delta with
            // the same name inserts fresh instead of re-matching it.
            let current = working.remove(pos);
            result.push(InventoryItem {
                id: current.id,
                user_id: current.user_id.clone(),
                ingredient_name: current.ingredient_name.clone(),
                amount: candidate.amount.clone(),
                unit: candidate.unit.clone().or(current.unit),
                category: candidate.category.clone().or(current.category),
                expires_at: candidate.expires_at.or(current.expires_at),
                purchase_date: candidate.purchase_date.or(current.purchase_date),
                location: candidate.location.clone().or(current.location),
                notes: candidate.notes.clone().or(current.notes),
            });
        } else {
            let mut fresh = candidate.clone();
            fresh.user_id = user_id.to_string();
            if fresh.id.is_none() {
                fresh.id = Some(next_id);
                next_id += 1;
            }
            debug!(
                "inserting {:?} (id {:?}) into inventory of {}",
                fresh.ingredient_name, fresh.id, user_id
            );
            result.push(fresh);
        }
    }

    // Silent carry-forward of everything no delta touched.
    result.extend(working);
    result
}
