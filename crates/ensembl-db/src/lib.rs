//! Ensembl Database Library
//!
//! ORM-less database access for Ensembl tools, on top of SQLx's `Any` driver
//! so the same code runs against SQLite and MySQL servers selected purely by
//! the connection URL.
//!
//! - **Connection Handler**: [`DbConnection`] wraps a connection pool and the
//!   reflected schema of the target database
//! - **Unit-Test Databases**: [`UnitTestDb`] creates throwaway databases from
//!   schema/data dumps for integration tests
//! - **Script Parsing**: [`script`] splits SQL dump files into statements
//!
//! # Example
//!
//! ```no_run
//! use ensembl_db::DbConnection;
//!
//! # async fn demo() -> ensembl_db::DbResult<()> {
//! let dbc = DbConnection::connect("mysql://ensro@mysql-server:4242/my_db").await?;
//! let rows = dbc.fetch_all("SELECT * FROM my_table").await?;
//! # Ok(())
//! # }
//! ```

pub mod connection;
pub mod error;
pub mod script;
pub mod unittest_db;
pub mod url;

// Re-export commonly used types
pub use connection::{Column, DbConnection, Table};
pub use error::{DbError, DbResult};
pub use unittest_db::UnitTestDb;
pub use url::{DbUrl, Dialect};
