//! Grouping of listings that describe the same animal
//!
//! An animal re-registered after a failed adoption ends up as a second row.
//! Requests are therefore gathered over every animal sharing *any* of name,
//! breed, size or age with the base record. This is a union, so two unrelated
//! dogs of the same breed are grouped too.

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use crate::error::Result;
use crate::gateway::Gateway;
use crate::models::{Animal, MatchField};

#[derive(Clone)]
pub struct RelatedAnimals {
    gateway: Arc<dyn Gateway>,
}

impl RelatedAnimals {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    /// Ids of every animal related to `base`, including its own
    pub async fn related_ids(&self, base: &Animal) -> Result<BTreeSet<String>> {
        let mut ids = BTreeSet::from([base.id.clone()]);
        for field in MatchField::ALL {
            let Some(value) = field.value_of(base) else {
                continue;
            };
            let matches = self.gateway.animal_ids_matching(field, &value).await?;
            debug!(animal_id = %base.id, field = field.column(), matches = matches.len(), "related lookup");
            ids.extend(matches);
        }
        Ok(ids)
    }
}

/// Same rule as [`RelatedAnimals::related_ids`] over records already loaded
pub fn related_ids_among<'a, I>(base: &Animal, candidates: I) -> BTreeSet<String>
where
    I: IntoIterator<Item = &'a Animal>,
{
    let keys: Vec<(MatchField, String)> = MatchField::ALL
        .iter()
        .filter_map(|field| field.value_of(base).map(|value| (*field, value)))
        .collect();

    let mut ids = BTreeSet::from([base.id.clone()]);
    ids.extend(
        candidates
            .into_iter()
            .filter(|candidate| {
                keys.iter()
                    .any(|(field, value)| field.value_of(candidate).as_ref() == Some(value))
            })
            .map(|candidate| candidate.id.clone()),
    );
    ids
}
