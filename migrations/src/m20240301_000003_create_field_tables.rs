use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000003_create_field_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Fields::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Fields::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Fields::EnterpriseId).integer().not_null())
                    .col(ColumnDef::new(Fields::Name).string_len(255).not_null())
                    .col(
                        ColumnDef::new(Fields::AreaHectares)
                            .decimal_len(10, 2)
                            .not_null()
                            .check(Expr::col(Fields::AreaHectares).gt(0)),
                    )
                    .col(ColumnDef::new(Fields::SoilType).string_len(100).null())
                    .col(
                        ColumnDef::new(Fields::IsIrrigated)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Fields::Description).text().null())
                    .col(
                        ColumnDef::new(Fields::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_fields_enterprise_id")
                            .from(Fields::Table, Fields::EnterpriseId)
                            .to(Enterprises::Table, Enterprises::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(FieldOperations::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(FieldOperations::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(FieldOperations::FieldId).integer().not_null())
                    .col(ColumnDef::new(FieldOperations::OperationDate).date().not_null())
                    .col(
                        ColumnDef::new(FieldOperations::OperationType)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(FieldOperations::Description).text().null())
                    .col(
                        ColumnDef::new(FieldOperations::FertilizerAmountKg)
                            .decimal_len(10, 2)
                            .null()
                            .check(Expr::col(FieldOperations::FertilizerAmountKg).gte(0)),
                    )
                    .col(
                        ColumnDef::new(FieldOperations::WaterAmountLiters)
                            .decimal_len(12, 2)
                            .null()
                            .check(Expr::col(FieldOperations::WaterAmountLiters).gte(0)),
                    )
                    .col(
                        ColumnDef::new(FieldOperations::Cost)
                            .decimal_len(12, 2)
                            .null()
                            .check(Expr::col(FieldOperations::Cost).gte(0)),
                    )
                    .col(
                        ColumnDef::new(FieldOperations::IsCompleted)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(FieldOperations::PerformedBy)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(FieldOperations::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_field_operations_field_id")
                            .from(FieldOperations::Table, FieldOperations::FieldId)
                            .to(Fields::Table, Fields::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(FieldOperations::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Fields::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Enterprises {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Fields {
    Table,
    Id,
    EnterpriseId,
    Name,
    AreaHectares,
    SoilType,
    IsIrrigated,
    Description,
    CreatedAt,
}

#[derive(DeriveIden)]
enum FieldOperations {
    Table,
    Id,
    FieldId,
    OperationDate,
    OperationType,
    Description,
    FertilizerAmountKg,
    WaterAmountLiters,
    Cost,
    IsCompleted,
    PerformedBy,
    RecordedAt,
}
