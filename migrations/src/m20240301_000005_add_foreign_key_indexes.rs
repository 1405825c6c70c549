use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, column) in foreign_key_columns() {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(table)
                        .col(column)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        for (name, table, _) in foreign_key_columns() {
            manager
                .drop_index(Index::drop().name(name).table(table).to_owned())
                .await?;
        }

        Ok(())
    }
}

/// Every child-to-parent column; listing children of one parent is the common lookup.
fn foreign_key_columns() -> Vec<(&'static str, Alias, Alias)> {
    [
        ("idx_fields_enterprise_id", "fields", "enterprise_id"),
        ("idx_employees_enterprise_id", "employees", "enterprise_id"),
        ("idx_plantings_field_id", "plantings", "field_id"),
        ("idx_plantings_crop_id", "plantings", "crop_id"),
        ("idx_harvests_planting_id", "harvests", "planting_id"),
        ("idx_field_operations_field_id", "field_operations", "field_id"),
    ]
    .into_iter()
    .map(|(name, table, column)| (name, Alias::new(table), Alias::new(column)))
    .collect()
}
