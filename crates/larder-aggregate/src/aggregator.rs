//! Recipe ingredient aggregation.
//!
//! Groups raw occurrences by ingredient identity, combines their quantity
//! strings, and assigns category and sort order. The sort-order formula
//! `priority * 1000 + running_index` keeps ordering stable across runs with
//! unchanged input and can never collide for distinct ingredients.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, instrument, warn};
use uuid::Uuid;

use larder_core::defaults::{COMBINER_MAX_REPLY_LEN, SORT_ORDER_STRIDE};
use larder_core::{
    categorize, category_priority, AggregatedIngredient, AggregationMode, Error,
    IngredientOccurrence, IngredientSource, QuantityCombiner, Result,
};

use crate::quantity::combine_default;

/// Aggregates ingredients across recipes into a deduplicated shopping set.
pub struct Aggregator<S> {
    source: S,
    combiner: Option<Arc<dyn QuantityCombiner>>,
}

impl<S: IngredientSource> Aggregator<S> {
    /// Create an aggregator over an ingredient source, default mode only.
    pub fn new(source: S) -> Self {
        Self {
            source,
            combiner: None,
        }
    }

    /// Attach a quantity-combination collaborator for assisted mode.
    pub fn with_combiner(mut self, combiner: Arc<dyn QuantityCombiner>) -> Self {
        self.combiner = Some(combiner);
        self
    }

    /// Aggregate ingredients across the given recipes.
    ///
    /// Occurrences are grouped by ingredient id (identity, not name), so a
    /// renamed ingredient never fragments into two rows. The returned set is
    /// ordered by sort order (category priority, then first-seen position).
    #[instrument(skip(self), fields(subsystem = "aggregate", component = "aggregator", op = "aggregate", recipe_count = recipe_ids.len()))]
    pub async fn aggregate(
        &self,
        recipe_ids: &[Uuid],
        mode: AggregationMode,
    ) -> Result<Vec<AggregatedIngredient>> {
        if recipe_ids.is_empty() {
            return Err(Error::InvalidInput(
                "at least one recipe is required".to_string(),
            ));
        }

        let occurrences = self.source.occurrences_for_recipes(recipe_ids).await?;

        // Group by ingredient id in first-seen order.
        let mut seen: HashMap<Uuid, usize> = HashMap::new();
        let mut groups: Vec<(Uuid, String, Vec<String>)> = Vec::new();
        for occ in &occurrences {
            let quantity = display_quantity(occ);
            match seen.get(&occ.ingredient_id) {
                Some(&idx) => groups[idx].2.push(quantity),
                None => {
                    seen.insert(occ.ingredient_id, groups.len());
                    groups.push((occ.ingredient_id, occ.ingredient_name.clone(), vec![quantity]));
                }
            }
        }

        let mut aggregated = Vec::with_capacity(groups.len());
        for (running_index, (ingredient_id, name, quantities)) in groups.into_iter().enumerate() {
            let aggregated_quantity = match mode {
                AggregationMode::Assisted if quantities.len() > 1 => {
                    self.combine_assisted(&name, &quantities).await
                }
                _ => combine_default(&quantities),
            };

            let category = categorize(&name).to_string();
            let sort_order =
                category_priority(&category) * SORT_ORDER_STRIDE + running_index as i32;

            aggregated.push(AggregatedIngredient {
                ingredient_id,
                name,
                source_quantities: quantities,
                aggregated_quantity,
                category,
                sort_order,
            });
        }

        aggregated.sort_by_key(|ing| ing.sort_order);

        debug!(
            ingredient_count = aggregated.len(),
            occurrence_count = occurrences.len(),
            mode = ?mode,
            "Aggregation complete"
        );
        Ok(aggregated)
    }

    /// Assisted combination with a per-ingredient fallback to default mode.
    ///
    /// The collaborator is best-effort text rewriting: any error or
    /// malformed reply downgrades this one ingredient to the default join
    /// and must never abort the surrounding aggregation.
    async fn combine_assisted(&self, name: &str, quantities: &[String]) -> String {
        let Some(combiner) = &self.combiner else {
            return combine_default(quantities);
        };

        match combiner.combine(name, quantities).await {
            Ok(reply) => match sanitize_reply(&reply) {
                Some(combined) => combined,
                None => {
                    warn!(
                        ingredient = name,
                        reply_len = reply.len(),
                        "Malformed combiner reply, falling back to default join"
                    );
                    combine_default(quantities)
                }
            },
            Err(e) => {
                warn!(
                    ingredient = name,
                    error = %e,
                    "Assisted combination failed, falling back to default join"
                );
                combine_default(quantities)
            }
        }
    }
}

/// Compose the display quantity for one occurrence: `"{quantity} {unit}"`
/// with blanks collapsed.
fn display_quantity(occ: &IngredientOccurrence) -> String {
    format!("{} {}", occ.quantity_text, occ.unit_text)
        .trim()
        .to_string()
}

/// Validate a combiner reply: first non-empty line, non-blank, bounded
/// length. Anything else is treated as malformed.
fn sanitize_reply(reply: &str) -> Option<String> {
    let line = reply.lines().map(str::trim).find(|l| !l.is_empty())?;
    if line.len() > COMBINER_MAX_REPLY_LEN {
        return None;
    }
    Some(line.to_string())
}
