//! Category and sub-category operations: CRUD, seeding and reordering.

use sea_orm::{
    ActiveValue, DatabaseTransaction, QueryFilter, QueryOrder, TransactionTrait, prelude::*,
};

use crate::{
    Engine, EngineError, ResultEngine, categories,
    reorder::{self, SeqEntry},
    sub_categories,
    taxonomy::{Scope, Taxonomy},
};

use super::{normalize_required_name, with_tx};

/// Reference taxonomy installed into a fresh database.
const DEFAULT_TAXONOMY: &[(&str, &[&str])] = &[
    ("Clothes", &["Footwear", "Casual wear", "Formal wear"]),
    ("Food", &["Breakfast", "Lunch", "Dinner", "Snacks"]),
    ("Fuel & Parking", &["Fuel", "Parking", "Toll"]),
    ("Grocery & Household", &["Vegetables", "Provisions", "Appliances"]),
    ("House Maintenance", &["Repairs", "Cleaning"]),
    ("Medicines", &["Consultation", "Pharmacy"]),
    ("Monthly Bill", &["Electricity", "Water", "Phone", "Internet"]),
    ("School", &["Fees", "Books", "Stationery"]),
    ("Vehicle Maintenance", &["Service", "Insurance"]),
];

impl Engine {
    /// Category ids in display order (ascending sequence number).
    pub fn category_ids(&self) -> &[i32] {
        self.taxonomy.category_ids()
    }

    pub fn category_name(&self, category_id: i32) -> Option<&str> {
        self.taxonomy.category_name(category_id)
    }

    /// Sub-category ids of a category in display order, or `None` for an
    /// unknown category.
    pub fn sub_category_ids(&self, category_id: i32) -> Option<&[i32]> {
        self.taxonomy.sub_category_ids(category_id)
    }

    pub fn sub_category_name(&self, sub_category_id: i32) -> Option<&str> {
        self.taxonomy.sub_category_name(sub_category_id)
    }

    pub fn category_name_exists(&self, name: &str) -> bool {
        self.taxonomy.category_name_exists(name.trim())
    }

    pub fn sub_category_name_exists(&self, category_id: i32, name: &str) -> bool {
        self.taxonomy.sub_category_name_exists(category_id, name.trim())
    }

    /// Create a category at the end of the list.
    ///
    /// The new category also gets the placeholder sub-category `<name>`,
    /// so expense entry always has a sub-category to offer; the user can
    /// rename it later.
    pub async fn add_category(&mut self, name: &str) -> ResultEngine<i32> {
        let name = normalize_required_name(name, "category")?;
        if self.taxonomy.category_name_exists(&name) {
            return Err(EngineError::ExistingKey(name));
        }

        let default_sub = format!("<{name}>");
        let (category_id, sub_id) = with_tx!(self, |db_tx| {
            let seq = next_sequence_no(&db_tx, Scope::Categories).await?;
            let category = categories::ActiveModel {
                id: ActiveValue::NotSet,
                name: ActiveValue::Set(name.clone()),
                sequence_no: ActiveValue::Set(seq),
            }
            .insert(&db_tx)
            .await?;

            // First sub-category of a fresh scope.
            let sub = sub_categories::ActiveModel {
                id: ActiveValue::NotSet,
                cat_id: ActiveValue::Set(category.id),
                name: ActiveValue::Set(default_sub.clone()),
                sequence_no: ActiveValue::Set(0),
            }
            .insert(&db_tx)
            .await?;

            Ok((category.id, sub.id))
        })?;

        self.taxonomy.push_category(category_id, name);
        self.taxonomy
            .push_sub_category(category_id, sub_id, default_sub);
        tracing::debug!(category_id, "added category");
        Ok(category_id)
    }

    /// Create a sub-category at the end of its category's list.
    pub async fn add_sub_category(&mut self, category_id: i32, name: &str) -> ResultEngine<i32> {
        let name = normalize_required_name(name, "sub-category")?;
        if !self.taxonomy.contains(Scope::Categories, category_id) {
            return Err(EngineError::KeyNotFound(format!("category {category_id}")));
        }
        if self.taxonomy.sub_category_name_exists(category_id, &name) {
            return Err(EngineError::ExistingKey(name));
        }

        let sub_id = with_tx!(self, |db_tx| {
            let seq = next_sequence_no(&db_tx, Scope::SubCategories { category_id }).await?;
            let sub = sub_categories::ActiveModel {
                id: ActiveValue::NotSet,
                cat_id: ActiveValue::Set(category_id),
                name: ActiveValue::Set(name.clone()),
                sequence_no: ActiveValue::Set(seq),
            }
            .insert(&db_tx)
            .await?;
            Ok(sub.id)
        })?;

        self.taxonomy.push_sub_category(category_id, sub_id, name);
        tracing::debug!(category_id, sub_id, "added sub-category");
        Ok(sub_id)
    }

    pub async fn rename_category(&mut self, category_id: i32, new_name: &str) -> ResultEngine<()> {
        let name = normalize_required_name(new_name, "category")?;
        let current = self
            .taxonomy
            .category_name(category_id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("category {category_id}")))?;
        if current == name {
            return Ok(());
        }
        if self.taxonomy.category_name_exists(&name) {
            return Err(EngineError::ExistingKey(name));
        }

        with_tx!(self, |db_tx| {
            categories::ActiveModel {
                id: ActiveValue::Set(category_id),
                name: ActiveValue::Set(name.clone()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(())
        })?;

        self.taxonomy.rename_category(category_id, name);
        Ok(())
    }

    pub async fn rename_sub_category(
        &mut self,
        sub_category_id: i32,
        new_name: &str,
    ) -> ResultEngine<()> {
        let name = normalize_required_name(new_name, "sub-category")?;
        let category_id = self
            .taxonomy
            .parent_of_sub_category(sub_category_id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("sub-category {sub_category_id}")))?;
        let current = self
            .taxonomy
            .sub_category_name(sub_category_id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("sub-category {sub_category_id}")))?;
        if current == name {
            return Ok(());
        }
        if self.taxonomy.sub_category_name_exists(category_id, &name) {
            return Err(EngineError::ExistingKey(name));
        }

        with_tx!(self, |db_tx| {
            sub_categories::ActiveModel {
                id: ActiveValue::Set(sub_category_id),
                name: ActiveValue::Set(name.clone()),
                ..Default::default()
            }
            .update(&db_tx)
            .await?;
            Ok(())
        })?;

        self.taxonomy.rename_sub_category(sub_category_id, name);
        Ok(())
    }

    /// Delete a category and all of its sub-categories.
    ///
    /// Refused while any expense still references the category. Remaining
    /// categories keep their sequence numbers: the deleted number becomes
    /// a hole that is never backfilled.
    pub async fn remove_category(&mut self, category_id: i32) -> ResultEngine<()> {
        let name = self
            .taxonomy
            .category_name(category_id)
            .ok_or_else(|| EngineError::KeyNotFound(format!("category {category_id}")))?
            .to_string();
        if self.is_category_used(category_id).await? {
            return Err(EngineError::InUse(name));
        }

        with_tx!(self, |db_tx| {
            sub_categories::Entity::delete_many()
                .filter(sub_categories::Column::CatId.eq(category_id))
                .exec(&db_tx)
                .await?;
            categories::Entity::delete_by_id(category_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })?;

        self.taxonomy.remove_category(category_id);
        tracing::debug!(category_id, "removed category");
        Ok(())
    }

    /// Delete a sub-category. Refused while any expense references it.
    pub async fn remove_sub_category(
        &mut self,
        category_id: i32,
        sub_category_id: i32,
    ) -> ResultEngine<()> {
        if !self
            .taxonomy
            .contains(Scope::SubCategories { category_id }, sub_category_id)
        {
            return Err(EngineError::KeyNotFound(format!(
                "sub-category {sub_category_id} in category {category_id}"
            )));
        }
        if self.is_sub_category_used(sub_category_id).await? {
            let name = self
                .taxonomy
                .sub_category_name(sub_category_id)
                .unwrap_or_default()
                .to_string();
            return Err(EngineError::InUse(name));
        }

        with_tx!(self, |db_tx| {
            sub_categories::Entity::delete_by_id(sub_category_id)
                .exec(&db_tx)
                .await?;
            Ok(())
        })?;

        self.taxonomy.remove_sub_category(category_id, sub_category_id);
        tracing::debug!(category_id, sub_category_id, "removed sub-category");
        Ok(())
    }

    /// Move a category to the rank currently held by another category.
    ///
    /// `forward` must be true iff `to_id` currently sits at a larger
    /// sequence number than `from_id` (the item moves down the list). The
    /// caller derives the flag from its own view of the order, typically
    /// by comparing indices in [`Engine::category_ids`].
    pub async fn reorder_category(
        &mut self,
        from_id: i32,
        to_id: i32,
        forward: bool,
    ) -> ResultEngine<()> {
        self.reorder_within(Scope::Categories, from_id, to_id, forward)
            .await
    }

    /// Move a sub-category within its category, see
    /// [`Engine::reorder_category`].
    pub async fn reorder_sub_category(
        &mut self,
        category_id: i32,
        from_id: i32,
        to_id: i32,
        forward: bool,
    ) -> ResultEngine<()> {
        self.reorder_within(Scope::SubCategories { category_id }, from_id, to_id, forward)
            .await
    }

    async fn reorder_within(
        &mut self,
        scope: Scope,
        from_id: i32,
        to_id: i32,
        forward: bool,
    ) -> ResultEngine<()> {
        if from_id == to_id {
            return Ok(());
        }
        for id in [from_id, to_id] {
            if !self.taxonomy.contains(scope, id) {
                return Err(EngineError::KeyNotFound(format!(
                    "item {id} in {}",
                    scope.describe()
                )));
            }
        }

        // The smaller-sequence endpoint comes first in the fetched range:
        // moving forward that is the item itself, moving backward its
        // destination.
        let (id_a, id_b) = if forward {
            (from_id, to_id)
        } else {
            (to_id, from_id)
        };

        with_tx!(self, |db_tx| {
            let entries = affected_range(&db_tx, scope, id_a, id_b).await?;
            reorder::validate_range(&entries, id_a, id_b)?;
            let moves = reorder::plan_reassignments(&entries, forward);
            tracing::debug!(
                scope = %scope.describe(),
                from_id,
                to_id,
                affected = moves.len(),
                "reordering"
            );
            for (id, seq) in moves {
                set_sequence_no(&db_tx, scope, id, seq).await?;
            }
            Ok(())
        })?;

        // The cache only learns about the move once the store committed,
        // so a failed write never leaves a half-applied order behind.
        self.taxonomy.splice(scope, from_id, to_id)
    }

    /// Install the built-in reference taxonomy into an empty database.
    ///
    /// Returns false without touching the store when categories already
    /// exist.
    pub async fn seed_default_taxonomy(&mut self) -> ResultEngine<bool> {
        if !self.taxonomy.category_ids().is_empty() {
            return Ok(false);
        }

        with_tx!(self, |db_tx| {
            for (cat_seq, (cat_name, sub_names)) in DEFAULT_TAXONOMY.iter().enumerate() {
                let category = categories::ActiveModel {
                    id: ActiveValue::NotSet,
                    name: ActiveValue::Set((*cat_name).to_string()),
                    sequence_no: ActiveValue::Set(cat_seq as i32),
                }
                .insert(&db_tx)
                .await?;

                for (sub_seq, sub_name) in sub_names.iter().enumerate() {
                    sub_categories::ActiveModel {
                        id: ActiveValue::NotSet,
                        cat_id: ActiveValue::Set(category.id),
                        name: ActiveValue::Set((*sub_name).to_string()),
                        sequence_no: ActiveValue::Set(sub_seq as i32),
                    }
                    .insert(&db_tx)
                    .await?;
                }
            }
            Ok(())
        })?;

        self.taxonomy = Taxonomy::load(&self.database).await?;
        tracing::info!("seeded default taxonomy");
        Ok(true)
    }
}

/// Next free sequence number at the end of a scope: `max + 1`, or 0 for
/// an empty scope. Holes inside the scope are never reused.
async fn next_sequence_no(db_tx: &DatabaseTransaction, scope: Scope) -> ResultEngine<i32> {
    let highest = match scope {
        Scope::Categories => categories::Entity::find()
            .order_by_desc(categories::Column::SequenceNo)
            .one(db_tx)
            .await?
            .map(|model| model.sequence_no),
        Scope::SubCategories { category_id } => sub_categories::Entity::find()
            .filter(sub_categories::Column::CatId.eq(category_id))
            .order_by_desc(sub_categories::Column::SequenceNo)
            .one(db_tx)
            .await?
            .map(|model| model.sequence_no),
    };
    Ok(highest.map_or(0, |seq| seq + 1))
}

/// All `(id, sequence_no)` tuples of a scope whose sequence number lies in
/// `[seq(id_a), seq(id_b)]`, ascending. When the caller's direction flag
/// contradicts the store, `seq(id_a) > seq(id_b)` and the range comes back
/// empty, which [`reorder::validate_range`] rejects.
async fn affected_range(
    db_tx: &DatabaseTransaction,
    scope: Scope,
    id_a: i32,
    id_b: i32,
) -> ResultEngine<Vec<SeqEntry>> {
    match scope {
        Scope::Categories => {
            let low_seq = category_sequence_no(db_tx, id_a).await?;
            let high_seq = category_sequence_no(db_tx, id_b).await?;
            let models = categories::Entity::find()
                .filter(categories::Column::SequenceNo.between(low_seq, high_seq))
                .order_by_asc(categories::Column::SequenceNo)
                .all(db_tx)
                .await?;
            Ok(models
                .into_iter()
                .map(|model| SeqEntry {
                    id: model.id,
                    seq: model.sequence_no,
                })
                .collect())
        }
        Scope::SubCategories { category_id } => {
            let low_seq = sub_category_sequence_no(db_tx, category_id, id_a).await?;
            let high_seq = sub_category_sequence_no(db_tx, category_id, id_b).await?;
            let models = sub_categories::Entity::find()
                .filter(sub_categories::Column::CatId.eq(category_id))
                .filter(sub_categories::Column::SequenceNo.between(low_seq, high_seq))
                .order_by_asc(sub_categories::Column::SequenceNo)
                .all(db_tx)
                .await?;
            Ok(models
                .into_iter()
                .map(|model| SeqEntry {
                    id: model.id,
                    seq: model.sequence_no,
                })
                .collect())
        }
    }
}

async fn category_sequence_no(db_tx: &DatabaseTransaction, id: i32) -> ResultEngine<i32> {
    categories::Entity::find_by_id(id)
        .one(db_tx)
        .await?
        .map(|model| model.sequence_no)
        .ok_or_else(|| EngineError::KeyNotFound(format!("category {id}")))
}

async fn sub_category_sequence_no(
    db_tx: &DatabaseTransaction,
    category_id: i32,
    id: i32,
) -> ResultEngine<i32> {
    sub_categories::Entity::find_by_id(id)
        .filter(sub_categories::Column::CatId.eq(category_id))
        .one(db_tx)
        .await?
        .map(|model| model.sequence_no)
        .ok_or_else(|| {
            EngineError::KeyNotFound(format!("sub-category {id} in category {category_id}"))
        })
}

/// Point update of one item's sequence number.
async fn set_sequence_no(
    db_tx: &DatabaseTransaction,
    scope: Scope,
    id: i32,
    sequence_no: i32,
) -> ResultEngine<()> {
    match scope {
        Scope::Categories => {
            categories::ActiveModel {
                id: ActiveValue::Set(id),
                sequence_no: ActiveValue::Set(sequence_no),
                ..Default::default()
            }
            .update(db_tx)
            .await?;
        }
        Scope::SubCategories { .. } => {
            sub_categories::ActiveModel {
                id: ActiveValue::Set(id),
                sequence_no: ActiveValue::Set(sequence_no),
                ..Default::default()
            }
            .update(db_tx)
            .await?;
        }
    }
    Ok(())
}
