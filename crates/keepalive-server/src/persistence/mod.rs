use sqlx::SqlitePool;

pub mod migrations;
pub mod targets;

pub type Db = SqlitePool;

pub use migrations::{MigrationLabel, MigrationSnapshot};
pub use targets::{NewTarget, TargetRecord};
