pub use sea_orm_migration::prelude::*;

mod m20240301_000001_create_enterprise_tables;
mod m20240301_000002_create_crops_table;
mod m20240301_000003_create_field_tables;
mod m20240301_000004_create_planting_tables;
mod m20240301_000005_add_foreign_key_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20240301_000001_create_enterprise_tables::Migration),
            Box::new(m20240301_000002_create_crops_table::Migration),
            Box::new(m20240301_000003_create_field_tables::Migration),
            Box::new(m20240301_000004_create_planting_tables::Migration),
            Box::new(m20240301_000005_add_foreign_key_indexes::Migration),
        ]
    }
}
