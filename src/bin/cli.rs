use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::{Datelike, Duration, Utc};
use clap::{Parser, Subcommand};
use dotenvy::dotenv;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use workforge_hr::utils::{hash_password, utc_now};

#[derive(Parser, Debug)]
#[command(author, version, about = "workforge-hr migration and seed tool", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create a new empty migration with the provided name
    MakeMigration { name: String },
    /// Apply pending migrations
    MigrateRun,
    /// Show migration status against the current database
    MigrateStatus,
    /// Roll back the last applied migration
    MigrateRollback,
    /// Provision demo accounts with profiles, tasks and attendance
    SeedDemo,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    if dotenv().is_err() {
        let crate_env = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join(".env");
        let _ = dotenvy::from_path(crate_env);
    }

    let cli = Cli::parse();

    match cli.command {
        Commands::MakeMigration { name } => {
            let path = make_migration_file(&name)?;
            println!("Created migration: {}", path.display());
        }
        Commands::MigrateRun => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            println!("Migrations applied");
        }
        Commands::MigrateStatus => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            print_status(&pool, &migrator).await?;
        }
        Commands::MigrateRollback => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator
                .undo(&pool, 1)
                .await
                .context("no migrations were rolled back")?;
            println!("Rolled back last migration");
        }
        Commands::SeedDemo => {
            let pool = get_pool().await?;
            let migrator = get_migrator().await?;
            migrator.run(&pool).await?;
            seed_demo(&pool).await?;
        }
    }

    Ok(())
}

fn make_migration_file(name: &str) -> anyhow::Result<PathBuf> {
    let timestamp = Utc::now().format("%Y_%m_%d_%H%M%S");
    let sanitized = sanitize_name(name);
    let filename = format!("{}_{}.sql", timestamp, sanitized);
    let path = Path::new("migrations").join(filename);

    if path.exists() {
        anyhow::bail!("migration already exists: {}", path.display());
    }

    fs::write(&path, "-- Write your migration SQL here\n")
        .with_context(|| format!("failed to create migration at {}", path.display()))?;

    Ok(path)
}

async fn get_pool() -> anyhow::Result<SqlitePool> {
    let database_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .context("failed to connect to database")
}

async fn print_status(pool: &SqlitePool, migrator: &sqlx::migrate::Migrator) -> anyhow::Result<()> {
    let migrations_table = sqlx::query(
        "SELECT name FROM sqlite_master WHERE type='table' AND name='_sqlx_migrations'",
    )
    .fetch_optional(pool)
    .await?;

    let applied_versions: HashSet<i64> = if migrations_table.is_some() {
        let rows = sqlx::query("SELECT version FROM _sqlx_migrations WHERE success = 1")
            .fetch_all(pool)
            .await?;
        rows.iter().filter_map(|row| row.try_get::<i64, _>("version").ok()).collect()
    } else {
        HashSet::new()
    };

    println!("{:<8} {:<20} {}", "Status", "Version", "Name");
    for migration in migrator.iter() {
        let applied = applied_versions.contains(&migration.version);
        let status = if applied { "applied" } else { "pending" };
        let desc = migration.description.as_ref().trim();
        let name = if desc.is_empty() { "unknown" } else { desc };
        println!("{:<8} {:<20} {}", status, migration.version, name);
    }

    Ok(())
}

fn sanitize_name(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '_' => c,
            'A'..='Z' => c.to_ascii_lowercase(),
            _ => '_',
        })
        .collect()
}

async fn get_migrator() -> anyhow::Result<sqlx::migrate::Migrator> {
    let local = Path::new("./migrations");
    let migrator_path = if local.exists() {
        local.to_path_buf()
    } else {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("migrations")
    };

    let migrator_path_display = migrator_path.display().to_string();
    sqlx::migrate::Migrator::new(migrator_path)
        .await
        .with_context(|| format!("failed to load migrations from {}", migrator_path_display))
}

/// One admin, one manager, two reports with employee profiles, plus sample
/// tasks and a week of attendance. Idempotent on the seeded email addresses.
async fn seed_demo(pool: &SqlitePool) -> anyhow::Result<()> {
    let already: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = 'admin@workforge.test')")
            .fetch_one(pool)
            .await?;
    if already {
        println!("Demo data already present, nothing to do");
        return Ok(());
    }

    let now = utc_now();
    let password_hash = hash_password("workforge").map_err(|err| anyhow::anyhow!(err.to_string()))?;

    let admin_id = insert_user(pool, "Demo Admin", "admin@workforge.test", &password_hash, "admin", None).await?;
    let manager_id =
        insert_user(pool, "Meera Nair", "meera@workforge.test", &password_hash, "manager", None).await?;
    let dev_id = insert_user(
        pool,
        "Arjun Rao",
        "arjun@workforge.test",
        &password_hash,
        "user",
        Some(manager_id),
    )
    .await?;
    let qa_id = insert_user(
        pool,
        "Sana Iqbal",
        "sana@workforge.test",
        &password_hash,
        "user",
        Some(manager_id),
    )
    .await?;

    let team_id = Uuid::new_v4();
    sqlx::query(
        "INSERT INTO teams (id, name, description, manager_id, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(team_id)
    .bind("Platform")
    .bind("Demo engineering team")
    .bind(manager_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;

    let joined = now.date_naive() - Duration::days(180);
    let dev_profile = insert_profile(pool, dev_id, "EMP-0001", team_id, "Developer", 60_000_00, joined).await?;
    let qa_profile = insert_profile(pool, qa_id, "EMP-0002", team_id, "QA Engineer", 52_000_00, joined).await?;

    for (profile_id, offset) in [(dev_profile, 0i64), (dev_profile, 1), (qa_profile, 0), (qa_profile, 1)] {
        let date = now.date_naive() - Duration::days(offset);
        sqlx::query(
            "INSERT INTO attendance (id, employee_id, date, status, check_in, check_out, marked_by, created_at, updated_at) \
             VALUES (?, ?, ?, 'present', '09:05', '18:10', ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(profile_id)
        .bind(date)
        .bind(manager_id)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    }

    for (title, assignee) in [
        ("Prepare quarterly report", Some(dev_id)),
        ("Review onboarding checklist", Some(qa_id)),
        ("Plan sprint retrospective", None),
    ] {
        sqlx::query(
            "INSERT INTO tasks (id, title, status, assigned_to, created_by, due_date, assigned_at, created_at, updated_at) \
             VALUES (?, ?, 'todo', ?, ?, ?, ?, ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(title)
        .bind(assignee)
        .bind(manager_id)
        .bind(now.date_naive() + Duration::days(7))
        .bind(assignee.map(|_| now))
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    }

    let month = now.month();
    let year = now.year();
    for (profile_id, salary) in [(dev_profile, 60_000_00i64), (qa_profile, 52_000_00)] {
        sqlx::query(
            "INSERT INTO payroll (id, employee_id, month, year, base_salary, days_worked, days_present, deductions, bonuses, final_pay, status, created_at, updated_at) \
             VALUES (?, ?, ?, ?, ?, 22, 22, 0, 0, ?, 'draft', ?, ?)",
        )
        .bind(Uuid::new_v4())
        .bind(profile_id)
        .bind(month)
        .bind(year)
        .bind(salary)
        .bind(salary / 30 * 22)
        .bind(now)
        .bind(now)
        .execute(pool)
        .await?;
    }

    println!("Seeded demo data:");
    println!("  admin@workforge.test / workforge (admin, id {admin_id})");
    println!("  meera@workforge.test / workforge (manager)");
    println!("  arjun@workforge.test, sana@workforge.test / workforge (team members)");

    Ok(())
}

async fn insert_user(
    pool: &SqlitePool,
    name: &str,
    email: &str,
    password_hash: &str,
    role: &str,
    manager_id: Option<Uuid>,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let now = utc_now();
    sqlx::query(
        "INSERT INTO users (id, name, email, password_hash, role, manager_id, created_at, updated_at) \
         VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(name)
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .bind(manager_id)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(id)
}

async fn insert_profile(
    pool: &SqlitePool,
    user_id: Uuid,
    code: &str,
    team_id: Uuid,
    position: &str,
    base_salary: i64,
    date_of_joining: chrono::NaiveDate,
) -> anyhow::Result<Uuid> {
    let id = Uuid::new_v4();
    let now = utc_now();
    sqlx::query(
        "INSERT INTO employee_profiles (id, user_id, employee_code, date_of_joining, status, team_id, position, base_salary, created_at, updated_at) \
         VALUES (?, ?, ?, ?, 'active', ?, ?, ?, ?, ?)",
    )
    .bind(id)
    .bind(user_id)
    .bind(code)
    .bind(date_of_joining)
    .bind(team_id)
    .bind(position)
    .bind(base_salary)
    .bind(now)
    .bind(now)
    .execute(pool)
    .await?;
    Ok(id)
}
