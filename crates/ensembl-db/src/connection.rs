//! Database connection handler.
//!
//! [`DbConnection`] provides ORM-less access to a database: data is read and
//! written through plain SQL, while the handler keeps a reflected view of the
//! database schema (tables, columns, primary keys) and a few conventions of
//! Ensembl databases such as the `meta` table.
//!
//! # Example
//!
//! ```no_run
//! use ensembl_db::DbConnection;
//!
//! # async fn demo() -> ensembl_db::DbResult<()> {
//! let dbc = DbConnection::connect("mysql://ensro@mysql-server:4242/my_db").await?;
//! let rows = dbc.fetch_all("SELECT * FROM my_table").await?;
//! // Or within a transaction (rolled back unless committed):
//! let mut tx = dbc.begin().await?;
//! sqlx::query("DELETE FROM my_table").execute(&mut *tx).await?;
//! tx.commit().await?;
//! # Ok(())
//! # }
//! ```

use std::collections::BTreeMap;

use sqlx::any::{install_default_drivers, AnyPoolOptions, AnyQueryResult, AnyRow};
use sqlx::{Any, AnyPool, Row, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::url::{DbUrl, Dialect};

/// Default size of the connection pool
const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// A column of a reflected table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub name: String,
    pub primary_key: bool,
}

/// A table of the reflected database schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<Column>,
}

impl Table {
    /// Names of all columns, in schema order.
    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|col| col.name.clone()).collect()
    }

    /// Names of the primary key columns, in schema order.
    pub fn primary_key_columns(&self) -> Vec<String> {
        self.columns
            .iter()
            .filter(|col| col.primary_key)
            .map(|col| col.name.clone())
            .collect()
    }
}

/// Database connection handler, providing also the database's schema and properties.
pub struct DbConnection {
    pool: AnyPool,
    url: DbUrl,
    tables: BTreeMap<String, Table>,
}

impl DbConnection {
    /// Connect to the database behind `url` and reflect its schema.
    pub async fn connect(url: &str) -> DbResult<Self> {
        let db_url = DbUrl::parse(url)?;
        install_default_drivers();
        let pool = AnyPoolOptions::new()
            .max_connections(DEFAULT_MAX_CONNECTIONS)
            .connect(url)
            .await?;
        debug!(url = %db_url, "Connected to database");
        let mut dbc = Self {
            pool,
            url: db_url,
            tables: BTreeMap::new(),
        };
        dbc.reload_metadata().await?;
        Ok(dbc)
    }

    /// Database URL (password redacted).
    pub fn url(&self) -> String {
        self.url.to_string()
    }

    /// Database name (the database file path for SQLite).
    pub fn db_name(&self) -> String {
        self.url.database()
    }

    /// Database host, `None` for SQLite databases.
    pub fn host(&self) -> Option<&str> {
        self.url.host()
    }

    /// Database dialect of the database host.
    pub fn dialect(&self) -> Dialect {
        self.url.dialect()
    }

    /// The underlying connection pool.
    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    /// Reflected tables keyed by their name.
    pub fn tables(&self) -> &BTreeMap<String, Table> {
        &self.tables
    }

    fn table(&self, name: &str) -> DbResult<&Table> {
        self.tables
            .get(name)
            .ok_or_else(|| DbError::TableNotFound(name.to_string()))
    }

    /// Column names of the given table.
    pub fn columns(&self, table: &str) -> DbResult<Vec<String>> {
        Ok(self.table(table)?.column_names())
    }

    /// Primary key column names of the given table.
    pub fn primary_key_columns(&self, table: &str) -> DbResult<Vec<String>> {
        Ok(self.table(table)?.primary_key_columns())
    }

    /// Reload the reflected schema.
    ///
    /// A plain refresh would keep tables that no longer exist, so the
    /// reflected view is rebuilt from scratch.
    pub async fn reload_metadata(&mut self) -> DbResult<()> {
        let mut tables = BTreeMap::new();
        for name in self.table_names().await? {
            let columns = self.reflect_columns(&name).await?;
            tables.insert(name.clone(), Table { name, columns });
        }
        self.tables = tables;
        Ok(())
    }

    async fn table_names(&self) -> DbResult<Vec<String>> {
        let sql = match self.dialect() {
            Dialect::Sqlite => {
                "SELECT name FROM sqlite_master \
                 WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name"
            }
            Dialect::Mysql => {
                "SELECT table_name AS name FROM information_schema.tables \
                 WHERE table_schema = DATABASE() ORDER BY table_name"
            }
        };
        let rows = sqlx::query(sql).fetch_all(&self.pool).await?;
        rows.iter()
            .map(|row| row.try_get::<String, _>("name").map_err(DbError::from))
            .collect()
    }

    async fn reflect_columns(&self, table: &str) -> DbResult<Vec<Column>> {
        match self.dialect() {
            Dialect::Sqlite => {
                // PRAGMA arguments cannot be bound; table names come straight
                // from sqlite_master but still get quoted
                let sql = format!("PRAGMA table_info(\"{}\")", table.replace('"', "\"\""));
                let rows = sqlx::query(&sql).fetch_all(&self.pool).await?;
                rows.iter()
                    .map(|row| {
                        Ok(Column {
                            name: row.try_get("name")?,
                            primary_key: row.try_get::<i64, _>("pk")? > 0,
                        })
                    })
                    .collect()
            }
            Dialect::Mysql => {
                let sql = "SELECT column_name AS name, column_key AS column_key \
                           FROM information_schema.columns \
                           WHERE table_schema = DATABASE() AND table_name = ? \
                           ORDER BY ordinal_position";
                let rows = sqlx::query(sql).bind(table).fetch_all(&self.pool).await?;
                rows.iter()
                    .map(|row| {
                        Ok(Column {
                            name: row.try_get("name")?,
                            primary_key: row.try_get::<String, _>("column_key")? == "PRI",
                        })
                    })
                    .collect()
            }
        }
    }

    /// Single value from the `meta` table for the given meta key.
    ///
    /// Exactly one row is expected: missing and duplicated keys are distinct
    /// errors.
    pub async fn meta_value(&self, meta_key: &str) -> DbResult<String> {
        let rows = sqlx::query("SELECT meta_value FROM meta WHERE meta_key = ?")
            .bind(meta_key)
            .fetch_all(&self.pool)
            .await?;
        match rows.as_slice() {
            [] => Err(DbError::MetaKeyNotFound(meta_key.to_string())),
            [row] => Ok(row.try_get(0)?),
            _ => Err(DbError::MetaKeyAmbiguous(meta_key.to_string())),
        }
    }

    /// Schema type of the database, located in the `meta` table.
    pub async fn schema_type(&self) -> DbResult<String> {
        self.meta_value("schema_type").await
    }

    /// Schema version of the database, located in the `meta` table.
    pub async fn schema_version(&self) -> DbResult<u32> {
        let value = self.meta_value("schema_version").await?;
        value.parse().map_err(|_| DbError::InvalidMetaValue {
            key: "schema_version".to_string(),
            value,
        })
    }

    /// Execute a single SQL statement, returning the driver's result summary.
    pub async fn execute(&self, sql: &str) -> DbResult<AnyQueryResult> {
        Ok(sqlx::query(sql).execute(&self.pool).await?)
    }

    /// Run a query and fetch all its rows.
    pub async fn fetch_all(&self, sql: &str) -> DbResult<Vec<AnyRow>> {
        Ok(sqlx::query(sql).fetch_all(&self.pool).await?)
    }

    /// Begin a transaction.
    ///
    /// The transaction is rolled back when dropped without an explicit
    /// `commit()`, which is also the way to get a test-scoped session whose
    /// changes never persist.
    pub async fn begin(&self) -> DbResult<Transaction<'static, Any>> {
        Ok(self.pool.begin().await?)
    }

    /// Dispose of the connection pool.
    pub async fn dispose(&self) {
        self.pool.close().await;
    }
}

impl std::fmt::Debug for DbConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbConnection")
            .field("url", &self.url.to_string())
            .field("tables", &self.tables.keys())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_db(dir: &tempfile::TempDir) -> DbConnection {
        let path = dir.path().join("test_db");
        let url = format!("sqlite://{}?mode=rwc", path.display());
        let dbc = DbConnection::connect(&url).await.unwrap();
        dbc.execute(
            "CREATE TABLE meta (
                meta_id INTEGER NOT NULL,
                species_id INTEGER DEFAULT 1,
                meta_key VARCHAR(40) NOT NULL,
                meta_value VARCHAR(255) NOT NULL,
                PRIMARY KEY (meta_id)
            )",
        )
        .await
        .unwrap();
        dbc.execute(
            "INSERT INTO meta VALUES
                (1, 1, 'schema_type', 'core'),
                (2, 1, 'schema_version', '110'),
                (3, 1, 'assembly.name', 'GRCh38'),
                (4, 1, 'assembly.name', 'GRCh37')",
        )
        .await
        .unwrap();
        dbc
    }

    #[tokio::test]
    async fn test_connect_and_reflect() {
        let dir = tempfile::tempdir().unwrap();
        let mut dbc = test_db(&dir).await;
        // The meta table was created after the initial reflection
        dbc.reload_metadata().await.unwrap();
        assert_eq!(
            dbc.tables().keys().collect::<Vec<_>>(),
            vec![&"meta".to_string()]
        );
        assert_eq!(
            dbc.columns("meta").unwrap(),
            vec!["meta_id", "species_id", "meta_key", "meta_value"]
        );
        assert_eq!(dbc.primary_key_columns("meta").unwrap(), vec!["meta_id"]);
    }

    #[tokio::test]
    async fn test_unknown_table() {
        let dir = tempfile::tempdir().unwrap();
        let dbc = test_db(&dir).await;
        assert!(matches!(
            dbc.columns("nonexistent"),
            Err(DbError::TableNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_schema_type_and_version() {
        let dir = tempfile::tempdir().unwrap();
        let dbc = test_db(&dir).await;
        assert_eq!(dbc.schema_type().await.unwrap(), "core");
        assert_eq!(dbc.schema_version().await.unwrap(), 110);
    }

    #[tokio::test]
    async fn test_meta_value_errors() {
        let dir = tempfile::tempdir().unwrap();
        let dbc = test_db(&dir).await;
        assert!(matches!(
            dbc.meta_value("missing_key").await,
            Err(DbError::MetaKeyNotFound(_))
        ));
        assert!(matches!(
            dbc.meta_value("assembly.name").await,
            Err(DbError::MetaKeyAmbiguous(_))
        ));
    }

    #[tokio::test]
    async fn test_transaction_rolls_back_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let dbc = test_db(&dir).await;
        {
            let mut tx = dbc.begin().await.unwrap();
            sqlx::query("INSERT INTO meta VALUES (5, 1, 'patch', 'none')")
                .execute(&mut *tx)
                .await
                .unwrap();
            // Dropped without commit
        }
        let rows = dbc
            .fetch_all("SELECT * FROM meta WHERE meta_key = 'patch'")
            .await
            .unwrap();
        assert!(rows.is_empty());
    }

    #[tokio::test]
    async fn test_transaction_commit_persists() {
        let dir = tempfile::tempdir().unwrap();
        let dbc = test_db(&dir).await;
        let mut tx = dbc.begin().await.unwrap();
        sqlx::query("INSERT INTO meta VALUES (5, 1, 'patch', 'none')")
            .execute(&mut *tx)
            .await
            .unwrap();
        tx.commit().await.unwrap();
        let rows = dbc
            .fetch_all("SELECT * FROM meta WHERE meta_key = 'patch'")
            .await
            .unwrap();
        assert_eq!(rows.len(), 1);
    }

    #[tokio::test]
    async fn test_execute_unknown_table_fails() {
        let dir = tempfile::tempdir().unwrap();
        let dbc = test_db(&dir).await;
        assert!(dbc.fetch_all("SELECT * FROM my_table").await.is_err());
    }
}
