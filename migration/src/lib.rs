pub use sea_orm_migration::prelude::*;

mod m20251101_000000_create_schema;
mod m20251101_000001_create_developer_tables;
mod m20251101_000002_create_sdk_authorization_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20251101_000000_create_schema::Migration),
            Box::new(m20251101_000001_create_developer_tables::Migration),
            Box::new(m20251101_000002_create_sdk_authorization_tables::Migration),
        ]
    }
}
