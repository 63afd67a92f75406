//! Unit testing database handler.
//!
//! [`UnitTestDb`] creates a throwaway database, applies the schema found in a
//! dump directory and imports the table data, so integration tests can run
//! against a realistic database without touching anything shared.
//!
//! The dump directory must contain the schema in `table.sql`, plus one
//! optional TSV data file (without headers) per table following the
//! `<table_name>.txt` convention, with `\N` marking NULL values.
//!
//! # Example
//!
//! ```no_run
//! use ensembl_db::UnitTestDb;
//!
//! # async fn demo() -> ensembl_db::DbResult<()> {
//! let db = UnitTestDb::create("sqlite:///tmp/test_dbs/", "path/to/dumps", Some("my_db")).await?;
//! let rows = db.dbc().fetch_all("SELECT * FROM my_table").await?;
//! // At the end do not forget to drop the database:
//! db.drop().await?;
//! # Ok(())
//! # }
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use sqlx::any::{install_default_drivers, AnyPoolOptions};
use sqlx::pool::PoolConnection;
use sqlx::Any;
use tracing::{debug, info};

use crate::connection::DbConnection;
use crate::error::{DbError, DbResult};
use crate::script::{create_table_name, parse_sql_script};
use crate::url::{DbUrl, Dialect};

/// Marker for NULL values in the TSV dump files
const NULL_MARKER: &str = "\\N";

/// Creates and connects to a new database, applying the schema and importing the data.
///
/// The new database name is prefixed by the current user name, so parallel
/// runs by different users on a shared server do not collide.
pub struct UnitTestDb {
    dbc: DbConnection,
    server_url: String,
    db_name: String,
}

impl UnitTestDb {
    /// Create the database on `server_url` and load the dumps from `dump_dir`.
    ///
    /// If `name` is not provided, the dump directory name is used instead.
    pub async fn create(
        server_url: &str,
        dump_dir: impl AsRef<Path>,
        name: Option<&str>,
    ) -> DbResult<Self> {
        let dump_dir = dump_dir.as_ref();
        if !dump_dir.is_dir() {
            return Err(DbError::DumpDirNotFound(dump_dir.to_path_buf()));
        }
        let schema_file = dump_dir.join("table.sql");
        if !schema_file.is_file() {
            return Err(DbError::SchemaFileNotFound(dump_dir.to_path_buf()));
        }

        // The admin pool below may be the first Any-driver use in the process
        install_default_drivers();

        let server = DbUrl::parse(server_url)?;
        let dir_name = dump_dir
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("test_db");
        let db_name = format!("{}_{}", current_user(), name.unwrap_or(dir_name));
        let db_url = server.with_database(&db_name)?;

        let (dbc, db_name) = match server.dialect() {
            Dialect::Mysql => {
                // InnoDB tables with data cannot always be dropped one by
                // one, so the whole database is dropped before creation
                let admin = AnyPoolOptions::new()
                    .max_connections(1)
                    .connect(server_url)
                    .await?;
                sqlx::query(&format!("DROP DATABASE IF EXISTS `{db_name}`"))
                    .execute(&admin)
                    .await?;
                sqlx::query(&format!("CREATE DATABASE `{db_name}`"))
                    .execute(&admin)
                    .await?;
                admin.close().await;
                (DbConnection::connect(db_url.as_str()).await?, db_name)
            }
            Dialect::Sqlite => {
                let db_file = PathBuf::from(db_url.database());
                if db_file.exists() {
                    fs::remove_file(&db_file)?;
                }
                let url = format!("sqlite://{}?mode=rwc", db_file.display());
                (
                    DbConnection::connect(&url).await?,
                    db_file.display().to_string(),
                )
            }
        };

        let mut db = Self {
            dbc,
            server_url: server_url.to_string(),
            db_name,
        };
        if let Err(error) = db.load_dump(dump_dir, &schema_file).await {
            // Make sure the database is deleted before raising the error
            let _ = db.cleanup().await;
            return Err(error);
        }
        db.dbc.reload_metadata().await?;
        info!(db_name = %db.db_name, dump_dir = %dump_dir.display(), "Unit test database ready");
        Ok(db)
    }

    /// Database connection handler.
    pub fn dbc(&self) -> &DbConnection {
        &self.dbc
    }

    /// Mutable access to the connection handler, e.g. to reload its metadata.
    pub fn dbc_mut(&mut self) -> &mut DbConnection {
        &mut self.dbc
    }

    /// Drop the database.
    pub async fn drop(self) -> DbResult<()> {
        self.cleanup().await
    }

    async fn cleanup(&self) -> DbResult<()> {
        self.dbc.dispose().await;
        match self.dbc.dialect() {
            Dialect::Sqlite => {
                let db_file = Path::new(&self.db_name);
                if db_file.exists() {
                    fs::remove_file(db_file)?;
                }
            }
            Dialect::Mysql => {
                let admin = AnyPoolOptions::new()
                    .max_connections(1)
                    .connect(&self.server_url)
                    .await?;
                sqlx::query(&format!("DROP DATABASE IF EXISTS `{}`", self.db_name))
                    .execute(&admin)
                    .await?;
                admin.close().await;
            }
        }
        debug!(db_name = %self.db_name, "Unit test database dropped");
        Ok(())
    }

    /// Apply the schema and import the data on a single pooled connection,
    /// so the connection-scoped foreign key toggles stay in effect.
    async fn load_dump(&self, dump_dir: &Path, schema_file: &Path) -> DbResult<()> {
        let script = fs::read_to_string(schema_file)?;
        let mut conn = self.dbc.pool().acquire().await?;

        self.set_foreign_key_checks(&mut conn, false).await?;
        for statement in parse_sql_script(&script) {
            match create_table_name(&statement) {
                Some(table) => {
                    if sqlx::query(&statement).execute(&mut *conn).await.is_err() {
                        // Leftover table from a previous run: drop and retry
                        sqlx::query(&format!("DROP TABLE IF EXISTS {table}"))
                            .execute(&mut *conn)
                            .await?;
                        sqlx::query(&statement).execute(&mut *conn).await?;
                    }
                    let data_file = dump_dir.join(format!("{table}.txt"));
                    if data_file.exists() {
                        self.clear_table(&mut conn, &table).await?;
                        self.load_table_data(&mut conn, &table, &data_file).await?;
                    }
                }
                None => {
                    sqlx::query(&statement).execute(&mut *conn).await?;
                }
            }
        }
        self.set_foreign_key_checks(&mut conn, true).await?;
        Ok(())
    }

    async fn set_foreign_key_checks(
        &self,
        conn: &mut PoolConnection<Any>,
        enabled: bool,
    ) -> DbResult<()> {
        let sql = match (self.dbc.dialect(), enabled) {
            (Dialect::Mysql, false) => "SET FOREIGN_KEY_CHECKS=0",
            (Dialect::Mysql, true) => "SET FOREIGN_KEY_CHECKS=1",
            (Dialect::Sqlite, false) => "PRAGMA foreign_keys = OFF",
            (Dialect::Sqlite, true) => "PRAGMA foreign_keys = ON",
        };
        sqlx::query(sql).execute(&mut **conn).await?;
        Ok(())
    }

    async fn clear_table(&self, conn: &mut PoolConnection<Any>, table: &str) -> DbResult<()> {
        let sql = match self.dbc.dialect() {
            // SQLite does not have TRUNCATE
            Dialect::Sqlite => format!("DELETE FROM {table}"),
            Dialect::Mysql => format!("TRUNCATE TABLE {table}"),
        };
        sqlx::query(&sql).execute(&mut **conn).await?;
        Ok(())
    }

    /// Load the table data from the given TSV file, one INSERT per row.
    async fn load_table_data(
        &self,
        conn: &mut PoolConnection<Any>,
        table: &str,
        data_file: &Path,
    ) -> DbResult<()> {
        let content = fs::read_to_string(data_file)?;
        let mut rows = 0usize;
        for line in content.lines() {
            if line.is_empty() {
                continue;
            }
            let fields: Vec<&str> = line.split('\t').collect();
            let placeholders = vec!["?"; fields.len()].join(", ");
            let sql = format!("INSERT INTO {table} VALUES ({placeholders})");
            let mut query = sqlx::query(&sql);
            for field in &fields {
                if *field == NULL_MARKER {
                    query = query.bind(None::<String>);
                } else {
                    query = query.bind(field.to_string());
                }
            }
            query
                .execute(&mut **conn)
                .await
                .map_err(|e| DbError::data_loading(table, e))?;
            rows += 1;
        }
        debug!(table, rows, "Imported table data");
        Ok(())
    }
}

impl std::fmt::Debug for UnitTestDb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitTestDb")
            .field("db_name", &self.db_name)
            .finish()
    }
}

/// User name prefixed to every unit-test database name.
fn current_user() -> String {
    std::env::var("USER").unwrap_or_else(|_| "unknown".to_string())
}
