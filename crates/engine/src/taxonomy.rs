//! In-memory ordered cache of the category / sub-category taxonomy.
//!
//! The cache holds, per scope, the item ids in ascending `sequence_no`
//! order plus the id → name maps. It is loaded once when the engine is
//! built and mutated in step with every taxonomy write, so readers never
//! hit the store for ordering or name lookups.

use std::collections::HashMap;

use sea_orm::{DatabaseConnection, QueryOrder, prelude::*};

use crate::{EngineError, ResultEngine, categories, sub_categories};

/// The grouping within which sequence numbers are unique and ordering is
/// meaningful: the whole category list, or one category's sub-category
/// list.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Scope {
    Categories,
    SubCategories { category_id: i32 },
}

impl Scope {
    pub(crate) fn describe(&self) -> String {
        match self {
            Scope::Categories => "categories".to_string(),
            Scope::SubCategories { category_id } => {
                format!("sub-categories of category {category_id}")
            }
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct Taxonomy {
    category_order: Vec<i32>,
    category_names: HashMap<i32, String>,
    sub_order: HashMap<i32, Vec<i32>>,
    sub_names: HashMap<i32, String>,
}

impl Taxonomy {
    /// Load the full taxonomy from the store, each scope in ascending
    /// `sequence_no` order.
    pub(crate) async fn load(database: &DatabaseConnection) -> ResultEngine<Taxonomy> {
        tracing::debug!("loading taxonomy cache");

        let mut taxonomy = Taxonomy::default();

        let category_models = categories::Entity::find()
            .order_by_asc(categories::Column::SequenceNo)
            .all(database)
            .await?;
        for model in category_models {
            taxonomy.category_order.push(model.id);
            taxonomy.category_names.insert(model.id, model.name);
            taxonomy.sub_order.insert(model.id, Vec::new());
        }

        let sub_models = sub_categories::Entity::find()
            .order_by_asc(sub_categories::Column::CatId)
            .order_by_asc(sub_categories::Column::SequenceNo)
            .all(database)
            .await?;
        for model in sub_models {
            taxonomy
                .sub_order
                .entry(model.cat_id)
                .or_default()
                .push(model.id);
            taxonomy.sub_names.insert(model.id, model.name);
        }

        Ok(taxonomy)
    }

    /// The ordered id list for a scope.
    pub(crate) fn order(&self, scope: Scope) -> ResultEngine<&[i32]> {
        match scope {
            Scope::Categories => Ok(&self.category_order),
            Scope::SubCategories { category_id } => self
                .sub_order
                .get(&category_id)
                .map(Vec::as_slice)
                .ok_or_else(|| EngineError::KeyNotFound(format!("category {category_id}"))),
        }
    }

    pub(crate) fn contains(&self, scope: Scope, id: i32) -> bool {
        self.order(scope).is_ok_and(|order| order.contains(&id))
    }

    /// Move `from_id` to the index currently held by `to_id`.
    ///
    /// Both indices are taken before the removal; the re-insertion then
    /// lands on the post-removal index, which is exactly the splice the
    /// store-side reorder produces.
    pub(crate) fn splice(&mut self, scope: Scope, from_id: i32, to_id: i32) -> ResultEngine<()> {
        let order = match scope {
            Scope::Categories => &mut self.category_order,
            Scope::SubCategories { category_id } => self
                .sub_order
                .get_mut(&category_id)
                .ok_or_else(|| EngineError::KeyNotFound(format!("category {category_id}")))?,
        };

        let from_pos = order
            .iter()
            .position(|id| *id == from_id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("item {from_id}")))?;
        let to_pos = order
            .iter()
            .position(|id| *id == to_id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("item {to_id}")))?;

        order.remove(from_pos);
        order.insert(to_pos, from_id);
        Ok(())
    }

    pub(crate) fn push_category(&mut self, id: i32, name: String) {
        self.category_order.push(id);
        self.category_names.insert(id, name);
        self.sub_order.insert(id, Vec::new());
    }

    pub(crate) fn push_sub_category(&mut self, category_id: i32, id: i32, name: String) {
        self.sub_order.entry(category_id).or_default().push(id);
        self.sub_names.insert(id, name);
    }

    pub(crate) fn remove_category(&mut self, id: i32) {
        self.category_order.retain(|cat_id| *cat_id != id);
        self.category_names.remove(&id);
        if let Some(sub_ids) = self.sub_order.remove(&id) {
            for sub_id in sub_ids {
                self.sub_names.remove(&sub_id);
            }
        }
    }

    pub(crate) fn remove_sub_category(&mut self, category_id: i32, id: i32) {
        if let Some(order) = self.sub_order.get_mut(&category_id) {
            order.retain(|sub_id| *sub_id != id);
        }
        self.sub_names.remove(&id);
    }

    pub(crate) fn rename_category(&mut self, id: i32, name: String) {
        self.category_names.insert(id, name);
    }

    pub(crate) fn rename_sub_category(&mut self, id: i32, name: String) {
        self.sub_names.insert(id, name);
    }

    pub(crate) fn category_ids(&self) -> &[i32] {
        &self.category_order
    }

    pub(crate) fn category_name(&self, id: i32) -> Option<&str> {
        self.category_names.get(&id).map(String::as_str)
    }

    pub(crate) fn sub_category_ids(&self, category_id: i32) -> Option<&[i32]> {
        self.sub_order.get(&category_id).map(Vec::as_slice)
    }

    pub(crate) fn sub_category_name(&self, id: i32) -> Option<&str> {
        self.sub_names.get(&id).map(String::as_str)
    }

    pub(crate) fn category_name_exists(&self, name: &str) -> bool {
        self.category_names.values().any(|existing| existing == name)
    }

    pub(crate) fn sub_category_name_exists(&self, category_id: i32, name: &str) -> bool {
        self.sub_order
            .get(&category_id)
            .is_some_and(|sub_ids| {
                sub_ids
                    .iter()
                    .filter_map(|id| self.sub_names.get(id))
                    .any(|existing| existing == name)
            })
    }

    /// The category a sub-category belongs to.
    pub(crate) fn parent_of_sub_category(&self, sub_id: i32) -> Option<i32> {
        self.sub_order
            .iter()
            .find(|(_, sub_ids)| sub_ids.contains(&sub_id))
            .map(|(category_id, _)| *category_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy_with_categories(ids: &[i32]) -> Taxonomy {
        let mut taxonomy = Taxonomy::default();
        for id in ids {
            taxonomy.push_category(*id, format!("C{id}"));
        }
        taxonomy
    }

    #[test]
    fn splice_moves_forward() {
        let mut taxonomy = taxonomy_with_categories(&[10, 11, 12, 13, 14]);
        taxonomy.splice(Scope::Categories, 11, 13).unwrap();
        assert_eq!(taxonomy.category_ids(), &[10, 12, 13, 11, 14]);
    }

    #[test]
    fn splice_moves_backward() {
        let mut taxonomy = taxonomy_with_categories(&[10, 11, 12, 13, 14]);
        taxonomy.splice(Scope::Categories, 13, 11).unwrap();
        assert_eq!(taxonomy.category_ids(), &[10, 13, 11, 12, 14]);
    }

    #[test]
    fn splice_unknown_id_is_rejected() {
        let mut taxonomy = taxonomy_with_categories(&[10, 11]);
        let err = taxonomy.splice(Scope::Categories, 99, 10).unwrap_err();
        assert_eq!(err, EngineError::KeyNotFound("item 99".to_string()));
    }

    #[test]
    fn removing_a_category_drops_its_sub_names() {
        let mut taxonomy = taxonomy_with_categories(&[1, 2]);
        taxonomy.push_sub_category(1, 7, "Lunch".to_string());
        taxonomy.push_sub_category(2, 8, "Bus".to_string());

        taxonomy.remove_category(1);

        assert_eq!(taxonomy.category_ids(), &[2]);
        assert!(taxonomy.sub_category_name(7).is_none());
        assert_eq!(taxonomy.sub_category_name(8), Some("Bus"));
    }
}
