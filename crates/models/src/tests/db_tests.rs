use anyhow::Result;
use migration::MigratorTrait;
use sea_orm::{ConnectionTrait, DatabaseBackend};

use super::setup_test_db;

#[tokio::test]
async fn test_in_memory_connection_is_sqlite() -> Result<()> {
    let db = setup_test_db().await?;
    assert_eq!(db.get_database_backend(), DatabaseBackend::Sqlite);
    Ok(())
}

#[tokio::test]
async fn test_all_migrations_applied() -> Result<()> {
    let db = setup_test_db().await?;
    let applied = migration::Migrator::get_applied_migrations(&db).await?;
    assert_eq!(applied.len(), migration::Migrator::migrations().len());
    let pending = migration::Migrator::get_pending_migrations(&db).await?;
    assert!(pending.is_empty());
    Ok(())
}

#[tokio::test]
async fn test_config_rejects_bad_url_before_connecting() -> Result<()> {
    let cfg = configs::DatabaseConfig { url: "mysql://nope".into(), ..Default::default() };
    assert!(cfg.validate().is_err());
    Ok(())
}
