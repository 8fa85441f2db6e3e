use chrono::{TimeZone, Utc};
use sea_orm::{Database, DatabaseConnection};

use engine::{Engine, EngineError, NewExpense};
use migration::MigratorTrait;

async fn engine_with_db() -> (Engine, DatabaseConnection) {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let engine = Engine::builder().database(db.clone()).build().await.unwrap();
    (engine, db)
}

/// Food (Lunch, Dinner) and Bills (Water), ready for expense entry.
async fn engine_with_taxonomy() -> (Engine, [i32; 5]) {
    let (mut engine, _db) = engine_with_db().await;
    let food = engine.add_category("Food").await.unwrap();
    let bills = engine.add_category("Bills").await.unwrap();
    let lunch = engine.add_sub_category(food, "Lunch").await.unwrap();
    let dinner = engine.add_sub_category(food, "Dinner").await.unwrap();
    let water = engine.add_sub_category(bills, "Water").await.unwrap();
    (engine, [food, bills, lunch, dinner, water])
}

fn expense(category: i32, sub: i32, day: u32, amount: i64) -> NewExpense {
    NewExpense {
        date: Utc.with_ymd_and_hms(2026, 8, day, 0, 0, 0).unwrap(),
        category_id: category,
        sub_category_id: sub,
        paid_by: "alice".to_string(),
        amount,
        description: None,
    }
}

#[tokio::test]
async fn expenses_come_back_newest_first_with_id_as_tiebreak() {
    let (engine, [food, _, lunch, dinner, _]) = engine_with_taxonomy().await;

    let old = engine.add_expense(&expense(food, lunch, 10, 100)).await.unwrap();
    let same_day_a = engine.add_expense(&expense(food, lunch, 20, 200)).await.unwrap();
    let same_day_b = engine.add_expense(&expense(food, dinner, 20, 300)).await.unwrap();

    let listed: Vec<i32> = engine
        .expenses()
        .await
        .unwrap()
        .iter()
        .map(|expense| expense.id)
        .collect();
    assert_eq!(listed, vec![same_day_b.id, same_day_a.id, old.id]);
}

#[tokio::test]
async fn expense_references_are_validated_against_the_taxonomy() {
    let (engine, [food, bills, lunch, _, water]) = engine_with_taxonomy().await;

    let err = engine
        .add_expense(&expense(999, lunch, 10, 100))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    // The sub-category must belong to the given category.
    let err = engine
        .add_expense(&expense(food, water, 10, 100))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    engine.add_expense(&expense(bills, water, 10, 100)).await.unwrap();
}

#[tokio::test]
async fn update_and_delete_report_missing_records() {
    let (engine, [food, _, lunch, dinner, _]) = engine_with_taxonomy().await;

    let mut recorded = engine.add_expense(&expense(food, lunch, 10, 100)).await.unwrap();
    recorded.sub_category_id = dinner;
    recorded.amount = 250;
    engine.update_expense(&recorded).await.unwrap();

    let listed = engine.expenses().await.unwrap();
    assert_eq!(listed, vec![recorded.clone()]);

    let mut missing = recorded.clone();
    missing.id = 999;
    let err = engine.update_expense(&missing).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));

    engine.delete_expense(recorded.id).await.unwrap();
    let err = engine.delete_expense(recorded.id).await.unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}

#[tokio::test]
async fn clearing_the_log_keeps_the_taxonomy() {
    let (engine, [food, _, lunch, _, _]) = engine_with_taxonomy().await;
    engine.add_expense(&expense(food, lunch, 10, 100)).await.unwrap();
    engine.add_expense(&expense(food, lunch, 11, 200)).await.unwrap();

    assert_eq!(engine.delete_all_expenses().await.unwrap(), 2);
    assert!(engine.expenses().await.unwrap().is_empty());
    assert_eq!(engine.category_name(food), Some("Food"));
}

#[tokio::test]
async fn report_aggregates_per_category_sorted_by_total() {
    let (engine, [food, bills, lunch, dinner, water]) = engine_with_taxonomy().await;

    engine.add_expense(&expense(food, lunch, 10, 300)).await.unwrap();
    engine.add_expense(&expense(food, dinner, 11, 100)).await.unwrap();
    engine.add_expense(&expense(bills, water, 12, 150)).await.unwrap();

    let report = engine.report().await.unwrap();
    assert_eq!(report.total, 550);

    // Ascending by amount on both levels.
    assert_eq!(report.categories.len(), 2);
    assert_eq!(report.categories[0].name, "Bills");
    assert_eq!(report.categories[0].total, 150);
    assert_eq!(report.categories[1].name, "Food");
    assert_eq!(report.categories[1].total, 400);

    let food_subs = &report.categories[1].sub_categories;
    assert_eq!(food_subs[0].name, "Dinner");
    assert_eq!(food_subs[0].total, 100);
    assert_eq!(food_subs[1].name, "Lunch");
    assert_eq!(food_subs[1].total, 300);
}

#[tokio::test]
async fn csv_export_quotes_every_field_and_has_no_header() {
    let (engine, [food, _, lunch, _, _]) = engine_with_taxonomy().await;

    let mut with_note = expense(food, lunch, 25, 1250);
    with_note.description = Some("coffee".to_string());
    engine.add_expense(&with_note).await.unwrap();
    engine.add_expense(&expense(food, lunch, 26, 80)).await.unwrap();

    let mut buffer = Vec::new();
    engine.write_csv(&mut buffer).await.unwrap();

    let written = String::from_utf8(buffer).unwrap();
    assert_eq!(
        written,
        "\"08/26/2026\",\"Food\",\"alice\",\"Lunch\",\"80\",\"\"\n\
         \"08/25/2026\",\"Food\",\"alice\",\"Lunch\",\"1250\",\"coffee\"\n"
    );
}

#[tokio::test]
async fn backup_copies_the_database_file() {
    let root = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../target/test_dbs");
    std::fs::create_dir_all(&root).unwrap();

    let db_path = root.join("backup_source.db");
    let _ = std::fs::remove_file(&db_path);
    let url = format!("sqlite:{}?mode=rwc", db_path.display());

    let db = Database::connect(&url).await.unwrap();
    migration::Migrator::up(&db, None).await.unwrap();
    let mut engine = Engine::builder().database(db).build().await.unwrap();
    engine.add_category("Food").await.unwrap();

    let dest_dir = root.join("backup_dest");
    let copied = engine::backup_database(&db_path, &dest_dir).unwrap();
    assert!(copied.is_file());
    assert_eq!(copied.file_name(), db_path.file_name());

    let missing = root.join("no_such.db");
    let err = engine::backup_database(&missing, &dest_dir).unwrap_err();
    assert!(matches!(err, EngineError::KeyNotFound(_)));
}
