use anyhow::{Context, Result};
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::{Path, PathBuf};
use tokio::fs;

pub type DbPool = sqlx::PgPool;
pub type OrmConn = DatabaseConnection;

const MIGRATIONS_DIR: &str = "migrations";

/// Create a SeaORM connection.
pub async fn create_orm_conn(database_url: &str) -> Result<DatabaseConnection> {
    let conn = Database::connect(database_url)
        .await
        .context("connecting to the database")?;
    Ok(conn)
}

/// Apply every `migrations/*.sql` file in filename order and return how many ran.
///
/// Every statement must be idempotent since the runner keeps no history table.
pub async fn run_migrations(conn: &DatabaseConnection) -> Result<usize> {
    let files = migration_files(Path::new(MIGRATIONS_DIR)).await?;

    let backend = conn.get_database_backend();
    for file in &files {
        tracing::debug!(file = %file.display(), "applying migration");
        let sql = fs::read_to_string(file)
            .await
            .with_context(|| format!("reading {}", file.display()))?;
        // Postgres prepared statements cannot contain multiple commands.
        for stmt in split_statements(&sql) {
            conn.execute(Statement::from_string(backend, format!("{stmt};")))
                .await
                .with_context(|| format!("applying {}", file.display()))?;
        }
    }

    tracing::info!(count = files.len(), "migrations applied");
    Ok(files.len())
}

async fn migration_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .await
        .with_context(|| format!("reading {}", dir.display()))?;
    let mut files: Vec<PathBuf> = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == "sql") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Split on `;`, dropping chunks that hold nothing but whitespace or `--` comments.
pub fn split_statements(sql: &str) -> Vec<&str> {
    sql.split(';')
        .map(str::trim)
        .filter(|chunk| {
            chunk
                .lines()
                .map(str::trim)
                .any(|line| !line.is_empty() && !line.starts_with("--"))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_only_chunks_are_skipped() {
        let sql = "-- header\nCREATE TABLE a (id INT);\n\n-- trailing note\n";
        assert_eq!(
            split_statements(sql),
            vec!["-- header\nCREATE TABLE a (id INT)"]
        );
    }

    #[test]
    fn shipped_schema_splits_into_statements() {
        let sql = include_str!("../migrations/0001_init.sql");
        let statements = split_statements(sql);
        assert!(statements.iter().any(|s| s.contains("CREATE TABLE IF NOT EXISTS visits")));
        assert!(statements.iter().all(|s| !s.ends_with(';')));
    }
}
