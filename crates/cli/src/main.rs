use std::{error::Error, path::PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Args, Parser, Subcommand};
use engine::{Engine, NewExpense};
use migration::MigratorTrait;
use sea_orm::{Database, DatabaseConnection};

#[derive(Parser, Debug)]
#[command(name = "quaderno")]
#[command(about = "Personal expense log with an orderable category taxonomy")]
struct Cli {
    /// Database connection string (also read from `DATABASE_URL`).
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "sqlite:./quaderno.db?mode=rwc"
    )]
    database_url: String,

    /// Log level for the engine and this binary.
    #[arg(long, default_value = "warn")]
    log: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run migrations and install the default taxonomy if empty.
    Init,
    Category(Category),
    Subcategory(Subcategory),
    Expense(Expense),
    /// Per-category totals with a sub-category breakdown.
    Report {
        #[arg(long)]
        json: bool,
    },
    /// Write the expense log as CSV into a directory.
    Export {
        #[arg(default_value = ".")]
        dir: PathBuf,
    },
    /// Copy the database file into a directory.
    Backup {
        dest_dir: PathBuf,
        /// Source file to copy. Defaults to the file behind
        /// `--database-url`.
        #[arg(long)]
        file: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct Category {
    #[command(subcommand)]
    command: CategoryCommand,
}

#[derive(Subcommand, Debug)]
enum CategoryCommand {
    /// Categories in display order.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Append a category (a placeholder sub-category is created with it).
    Add { name: String },
    Rename { id: i32, new_name: String },
    /// Delete a category not referenced by any expense.
    Rm { id: i32 },
    /// Move a category to the rank currently held by another one.
    Move { from_id: i32, to_id: i32 },
}

#[derive(Args, Debug)]
struct Subcategory {
    /// The category the sub-categories belong to.
    #[arg(long)]
    category: i32,

    #[command(subcommand)]
    command: SubcategoryCommand,
}

#[derive(Subcommand, Debug)]
enum SubcategoryCommand {
    /// Sub-categories of the category in display order.
    List {
        #[arg(long)]
        json: bool,
    },
    Add { name: String },
    Rename { id: i32, new_name: String },
    /// Delete a sub-category not referenced by any expense.
    Rm { id: i32 },
    /// Move a sub-category to the rank currently held by another one.
    Move { from_id: i32, to_id: i32 },
}

#[derive(Args, Debug)]
struct Expense {
    #[command(subcommand)]
    command: ExpenseCommand,
}

#[derive(Subcommand, Debug)]
enum ExpenseCommand {
    Add(ExpenseFields),
    /// Overwrite an expense with a full new snapshot.
    Update {
        id: i32,
        #[command(flatten)]
        fields: ExpenseFields,
    },
    Rm { id: i32 },
    /// All expenses, newest first.
    List {
        #[arg(long)]
        json: bool,
    },
    /// Delete every expense record. The taxonomy is kept.
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
struct ExpenseFields {
    /// Day of the expense, `YYYY-MM-DD`. Defaults to today.
    #[arg(long)]
    date: Option<NaiveDate>,
    #[arg(long)]
    category: i32,
    #[arg(long)]
    sub_category: i32,
    #[arg(long)]
    paid_by: String,
    /// Amount in minor currency units.
    #[arg(long)]
    amount: i64,
    #[arg(long)]
    description: Option<String>,
}

impl ExpenseFields {
    fn date_utc(&self) -> DateTime<Utc> {
        let day = self
            .date
            .unwrap_or_else(|| Utc::now().date_naive());
        day.and_hms_opt(0, 0, 0)
            .unwrap_or_default()
            .and_utc()
    }
}

/// The file behind a sqlite connection string, `None` for other
/// backends and in-memory databases.
fn sqlite_file_from_url(url: &str) -> Option<PathBuf> {
    let rest = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))?;
    let path = rest.split('?').next()?;
    if path.is_empty() || path == ":memory:" {
        return None;
    }
    Some(PathBuf::from(path))
}

fn member_of(order: Option<&[i32]>, id: i32) -> Result<(), String> {
    if order.is_some_and(|ids| ids.contains(&id)) {
        Ok(())
    } else {
        Err(format!("unknown id: {id}"))
    }
}

/// The direction flag the reorder operations want: true iff the
/// destination currently sits after the moved item.
fn forward_flag(order: &[i32], from_id: i32, to_id: i32) -> Result<bool, String> {
    let from_pos = order
        .iter()
        .position(|&id| id == from_id)
        .ok_or_else(|| format!("unknown id: {from_id}"))?;
    let to_pos = order
        .iter()
        .position(|&id| id == to_id)
        .ok_or_else(|| format!("unknown id: {to_id}"))?;
    Ok(to_pos > from_pos)
}

async fn connect_db(
    database_url: &str,
) -> Result<DatabaseConnection, Box<dyn Error + Send + Sync>> {
    let db = Database::connect(database_url).await?;
    migration::Migrator::up(&db, None).await?;
    tracing::debug!(database_url, "database connected and migrated");
    Ok(db)
}

fn print_taxonomy_list(engine: &Engine, category_id: Option<i32>, json: bool) {
    let ids: Vec<i32> = match category_id {
        None => engine.category_ids().to_vec(),
        Some(category_id) => engine
            .sub_category_ids(category_id)
            .map(<[i32]>::to_vec)
            .unwrap_or_default(),
    };
    let name = |id: i32| match category_id {
        None => engine.category_name(id),
        Some(_) => engine.sub_category_name(id),
    };

    if json {
        let items: Vec<serde_json::Value> = ids
            .iter()
            .map(|&id| serde_json::json!({ "id": id, "name": name(id) }))
            .collect();
        println!("{}", serde_json::Value::Array(items));
    } else {
        for id in ids {
            println!("{id}\t{}", name(id).unwrap_or("?"));
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(format!(
            "quaderno={level},engine={level},migration={level}",
            level = cli.log
        ))
        .init();

    let db = connect_db(&cli.database_url).await?;
    let mut engine = Engine::builder().database(db).build().await?;

    match cli.command {
        Command::Init => {
            if engine.seed_default_taxonomy().await? {
                println!("installed default taxonomy");
            } else {
                println!("database already initialized");
            }
        }
        Command::Category(Category { command }) => match command {
            CategoryCommand::List { json } => print_taxonomy_list(&engine, None, json),
            CategoryCommand::Add { name } => {
                let id = engine.add_category(&name).await?;
                println!("created category: {name} ({id})");
            }
            CategoryCommand::Rename { id, new_name } => {
                engine.rename_category(id, &new_name).await?;
                println!("renamed category {id} to {new_name}");
            }
            CategoryCommand::Rm { id } => {
                engine.remove_category(id).await?;
                println!("removed category {id}");
            }
            CategoryCommand::Move { from_id, to_id } => {
                let forward = match forward_flag(engine.category_ids(), from_id, to_id) {
                    Ok(forward) => forward,
                    Err(err) => {
                        eprintln!("{err}");
                        std::process::exit(1);
                    }
                };
                engine.reorder_category(from_id, to_id, forward).await?;
                print_taxonomy_list(&engine, None, false);
            }
        },
        Command::Subcategory(Subcategory { category, command }) => match command {
            SubcategoryCommand::List { json } => {
                print_taxonomy_list(&engine, Some(category), json);
            }
            SubcategoryCommand::Add { name } => {
                let id = engine.add_sub_category(category, &name).await?;
                println!("created sub-category: {name} ({id})");
            }
            SubcategoryCommand::Rename { id, new_name } => {
                if let Err(err) = member_of(engine.sub_category_ids(category), id) {
                    eprintln!("{err}");
                    std::process::exit(1);
                }
                engine.rename_sub_category(id, &new_name).await?;
                println!("renamed sub-category {id} to {new_name}");
            }
            SubcategoryCommand::Rm { id } => {
                engine.remove_sub_category(category, id).await?;
                println!("removed sub-category {id}");
            }
            SubcategoryCommand::Move { from_id, to_id } => {
                let order = engine.sub_category_ids(category).unwrap_or_default();
                let forward = match forward_flag(order, from_id, to_id) {
                    Ok(forward) => forward,
                    Err(err) => {
                        eprintln!("{err}");
                        std::process::exit(1);
                    }
                };
                engine
                    .reorder_sub_category(category, from_id, to_id, forward)
                    .await?;
                print_taxonomy_list(&engine, Some(category), false);
            }
        },
        Command::Expense(Expense { command }) => match command {
            ExpenseCommand::Add(fields) => {
                let expense = engine
                    .add_expense(&NewExpense {
                        date: fields.date_utc(),
                        category_id: fields.category,
                        sub_category_id: fields.sub_category,
                        paid_by: fields.paid_by.clone(),
                        amount: fields.amount,
                        description: fields.description.clone(),
                    })
                    .await?;
                println!("recorded expense {}", expense.id);
            }
            ExpenseCommand::Update { id, fields } => {
                engine
                    .update_expense(&engine::Expense {
                        id,
                        date: fields.date_utc(),
                        category_id: fields.category,
                        sub_category_id: fields.sub_category,
                        paid_by: fields.paid_by.clone(),
                        amount: fields.amount,
                        description: fields.description.clone(),
                    })
                    .await?;
                println!("updated expense {id}");
            }
            ExpenseCommand::Rm { id } => {
                engine.delete_expense(id).await?;
                println!("removed expense {id}");
            }
            ExpenseCommand::List { json } => {
                let expenses = engine.expenses().await?;
                if json {
                    println!("{}", serde_json::to_string_pretty(&expenses)?);
                } else {
                    for expense in expenses {
                        println!(
                            "{}\t{}\t{}\t{}\t{}\t{}",
                            expense.id,
                            expense.date.format("%m/%d/%Y"),
                            engine.category_name(expense.category_id).unwrap_or("?"),
                            engine
                                .sub_category_name(expense.sub_category_id)
                                .unwrap_or("?"),
                            expense.paid_by,
                            expense.amount,
                        );
                    }
                }
            }
            ExpenseCommand::Clear { yes } => {
                if !yes {
                    eprintln!("refusing to delete all expenses without --yes");
                    std::process::exit(1);
                }
                let deleted = engine.delete_all_expenses().await?;
                println!("deleted {deleted} expenses");
            }
        },
        Command::Report { json } => {
            let report = engine.report().await?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                println!("total: {}", report.total);
                for category in &report.categories {
                    println!("{}\t{}", category.name, category.total);
                    for sub in &category.sub_categories {
                        println!("  {}\t{}", sub.name, sub.total);
                    }
                }
            }
        }
        Command::Export { dir } => {
            tracing::info!(dir = %dir.display(), "exporting expense log");
            let path = engine.export_csv(&dir).await?;
            println!("exported {}", path.display());
        }
        Command::Backup { dest_dir, file } => {
            let Some(source) = file.or_else(|| sqlite_file_from_url(&cli.database_url)) else {
                eprintln!(
                    "cannot derive a database file from {}; pass --file",
                    cli.database_url
                );
                std::process::exit(1);
            };
            let path = engine::backup_database(&source, &dest_dir)?;
            println!("backup written to {}", path.display());
        }
    }

    Ok(())
}
