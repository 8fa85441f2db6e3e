use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};

use engine::{Engine, EngineError};
use migration::MigratorTrait;

/// A migrated in-memory database with categories at the given sequence
/// numbers, plus the ids in insertion order.
async fn engine_with_seqs(seqs: &[i32]) -> (Engine, DatabaseConnection, Vec<i32>) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();

    let backend = db.get_database_backend();
    for (i, seq) in seqs.iter().enumerate() {
        db.execute(Statement::from_sql_and_values(
            backend,
            "INSERT INTO categories (name, sequence_no) VALUES (?, ?)",
            vec![format!("Cat{i}").into(), (*seq).into()],
        ))
        .await
        .unwrap();
    }

    let rows = db
        .query_all(Statement::from_string(
            backend,
            "SELECT id FROM categories ORDER BY id",
        ))
        .await
        .unwrap();
    let ids = rows
        .iter()
        .map(|row| row.try_get::<i32>("", "id").unwrap())
        .collect();

    let engine = Engine::builder().database(db.clone()).build().await.unwrap();
    (engine, db, ids)
}

/// `(id, sequence_no)` pairs straight from the store, display order.
async fn stored_order(db: &DatabaseConnection) -> Vec<(i32, i32)> {
    let rows = db
        .query_all(Statement::from_string(
            db.get_database_backend(),
            "SELECT id, sequence_no FROM categories ORDER BY sequence_no, id",
        ))
        .await
        .unwrap();
    rows.iter()
        .map(|row| {
            (
                row.try_get::<i32>("", "id").unwrap(),
                row.try_get::<i32>("", "sequence_no").unwrap(),
            )
        })
        .collect()
}

#[tokio::test]
async fn forward_move_rotates_sequence_numbers_within_range() {
    let seqs = [0, 2, 6, 8, 9, 10, 11, 12];
    let (mut engine, db, ids) = engine_with_seqs(&seqs).await;

    engine.reorder_category(ids[1], ids[4], true).await.unwrap();

    // The moved item lands on the destination's number, the items in
    // between shift one number down; the existing holes survive and
    // nothing outside the range changes.
    let expected = vec![
        (ids[0], 0),
        (ids[2], 2),
        (ids[3], 6),
        (ids[4], 8),
        (ids[1], 9),
        (ids[5], 10),
        (ids[6], 11),
        (ids[7], 12),
    ];
    assert_eq!(stored_order(&db).await, expected);
    assert_eq!(
        engine.category_ids(),
        &[ids[0], ids[2], ids[3], ids[4], ids[1], ids[5], ids[6], ids[7]]
    );
}

#[tokio::test]
async fn backward_move_rotates_sequence_numbers_within_range() {
    let seqs = [0, 1, 2, 3, 4, 5, 6, 7];
    let (mut engine, db, ids) = engine_with_seqs(&seqs).await;

    engine.reorder_category(ids[4], ids[1], false).await.unwrap();

    let expected = vec![
        (ids[0], 0),
        (ids[4], 1),
        (ids[1], 2),
        (ids[2], 3),
        (ids[3], 4),
        (ids[5], 5),
        (ids[6], 6),
        (ids[7], 7),
    ];
    assert_eq!(stored_order(&db).await, expected);
    assert_eq!(
        engine.category_ids(),
        &[ids[0], ids[4], ids[1], ids[2], ids[3], ids[5], ids[6], ids[7]]
    );
}

#[tokio::test]
async fn adjacent_swap_exchanges_the_two_numbers() {
    let (mut engine, db, ids) = engine_with_seqs(&[3, 7]).await;

    engine.reorder_category(ids[0], ids[1], true).await.unwrap();

    assert_eq!(stored_order(&db).await, vec![(ids[1], 3), (ids[0], 7)]);
    assert_eq!(engine.category_ids(), &[ids[1], ids[0]]);
}

#[tokio::test]
async fn move_onto_itself_is_a_no_op() {
    let (mut engine, db, ids) = engine_with_seqs(&[0, 1, 2]).await;

    engine.reorder_category(ids[1], ids[1], true).await.unwrap();

    assert_eq!(
        stored_order(&db).await,
        vec![(ids[0], 0), (ids[1], 1), (ids[2], 2)]
    );
    assert_eq!(engine.category_ids(), &[ids[0], ids[1], ids[2]]);
}

#[tokio::test]
async fn unknown_id_is_rejected_before_touching_the_store() {
    let (mut engine, db, ids) = engine_with_seqs(&[0, 1]).await;

    let err = engine.reorder_category(ids[0], 999, true).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    assert_eq!(stored_order(&db).await, vec![(ids[0], 0), (ids[1], 1)]);
}

#[tokio::test]
async fn stale_cache_fails_and_leaves_store_and_cache_untouched() {
    let (mut engine, db, ids) = engine_with_seqs(&[0, 1, 2, 3]).await;

    // Move a row behind the cache's back so the cached order and the
    // direction flag derived from it no longer match the store.
    db.execute(Statement::from_sql_and_values(
        db.get_database_backend(),
        "UPDATE categories SET sequence_no = ? WHERE id = ?",
        vec![(-5).into(), ids[2].into()],
    ))
    .await
    .unwrap();

    let err = engine
        .reorder_category(ids[0], ids[2], true)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Inconsistent(_)));

    // Cache kept its pre-move view; the store kept the tampered numbers.
    assert_eq!(engine.category_ids(), &[ids[0], ids[1], ids[2], ids[3]]);
    assert_eq!(
        stored_order(&db).await,
        vec![(ids[2], -5), (ids[0], 0), (ids[1], 1), (ids[3], 3)]
    );
}

#[tokio::test]
async fn failed_write_mid_transaction_rolls_back_store_and_keeps_cache() {
    let (mut engine, db, ids) = engine_with_seqs(&[0, 1, 2, 3]).await;

    // Abort the last point update of the move (the one assigning number
    // 1), after the first two already went through inside the
    // transaction.
    db.execute(Statement::from_string(
        db.get_database_backend(),
        "CREATE TRIGGER block_seq BEFORE UPDATE ON categories \
         WHEN NEW.sequence_no = 1 \
         BEGIN SELECT RAISE(ABORT, 'boom'); END",
    ))
    .await
    .unwrap();

    let err = engine
        .reorder_category(ids[0], ids[2], true)
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Database(_)));

    // The partial updates were rolled back and the cache never heard
    // about the move.
    assert_eq!(
        stored_order(&db).await,
        vec![(ids[0], 0), (ids[1], 1), (ids[2], 2), (ids[3], 3)]
    );
    assert_eq!(engine.category_ids(), &[ids[0], ids[1], ids[2], ids[3]]);
}

#[tokio::test]
async fn sub_category_move_leaves_other_scopes_alone() {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let mut engine = Engine::builder().database(db.clone()).build().await.unwrap();

    let food = engine.add_category("Food").await.unwrap();
    let bills = engine.add_category("Bills").await.unwrap();
    let lunch = engine.add_sub_category(food, "Lunch").await.unwrap();
    let dinner = engine.add_sub_category(food, "Dinner").await.unwrap();
    let water = engine.add_sub_category(bills, "Water").await.unwrap();

    let bills_before = engine.sub_category_ids(bills).unwrap().to_vec();
    let categories_before = engine.category_ids().to_vec();

    engine
        .reorder_sub_category(food, dinner, lunch, false)
        .await
        .unwrap();

    let food_subs = engine.sub_category_ids(food).unwrap();
    assert_eq!(food_subs.last(), Some(&lunch));
    assert_eq!(engine.sub_category_ids(bills).unwrap(), bills_before);
    assert_eq!(engine.category_ids(), categories_before);
    assert!(engine.sub_category_ids(bills).unwrap().contains(&water));
}

#[tokio::test]
async fn rebuilt_engine_sees_the_same_order_as_the_cache() {
    let (mut engine, db, ids) = engine_with_seqs(&[0, 2, 6, 8, 9]).await;

    engine.reorder_category(ids[1], ids[3], true).await.unwrap();
    engine.reorder_category(ids[4], ids[0], false).await.unwrap();

    let rebuilt = Engine::builder().database(db).build().await.unwrap();
    assert_eq!(rebuilt.category_ids(), engine.category_ids());
}
