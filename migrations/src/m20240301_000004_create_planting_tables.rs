use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000004_create_planting_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Plantings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Plantings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Plantings::FieldId).integer().not_null())
                    .col(ColumnDef::new(Plantings::CropId).integer().not_null())
                    .col(ColumnDef::new(Plantings::PlantingDate).date().not_null())
                    .col(ColumnDef::new(Plantings::ExpectedHarvestDate).date().null())
                    .col(
                        ColumnDef::new(Plantings::SeedAmountKg)
                            .decimal_len(10, 2)
                            .null()
                            .check(Expr::col(Plantings::SeedAmountKg).gte(0)),
                    )
                    .col(ColumnDef::new(Plantings::PlantingMethod).string_len(100).null())
                    .col(ColumnDef::new(Plantings::Notes).text().null())
                    .col(
                        ColumnDef::new(Plantings::IsOrganic)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Plantings::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .check(
                        Expr::col(Plantings::ExpectedHarvestDate)
                            .gt(Expr::col(Plantings::PlantingDate)),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_plantings_field_id")
                            .from(Plantings::Table, Plantings::FieldId)
                            .to(Fields::Table, Fields::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_plantings_crop_id")
                            .from(Plantings::Table, Plantings::CropId)
                            .to(Crops::Table, Crops::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Harvests::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Harvests::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Harvests::PlantingId).integer().not_null())
                    .col(ColumnDef::new(Harvests::HarvestDate).date().not_null())
                    .col(
                        ColumnDef::new(Harvests::YieldKg)
                            .decimal_len(12, 2)
                            .not_null()
                            .check(Expr::col(Harvests::YieldKg).gt(0)),
                    )
                    .col(ColumnDef::new(Harvests::QualityGrade).string_len(50).null())
                    .col(ColumnDef::new(Harvests::StorageLocation).string_len(255).null())
                    .col(ColumnDef::new(Harvests::Notes).text().null())
                    .col(
                        ColumnDef::new(Harvests::IsCertified)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(
                        ColumnDef::new(Harvests::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_harvests_planting_id")
                            .from(Harvests::Table, Harvests::PlantingId)
                            .to(Plantings::Table, Plantings::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Harvests::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Plantings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Fields {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Crops {
    Table,
    Id,
}

#[derive(DeriveIden)]
enum Plantings {
    Table,
    Id,
    FieldId,
    CropId,
    PlantingDate,
    ExpectedHarvestDate,
    SeedAmountKg,
    PlantingMethod,
    Notes,
    IsOrganic,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Harvests {
    Table,
    Id,
    PlantingId,
    HarvestDate,
    YieldKg,
    QualityGrade,
    StorageLocation,
    Notes,
    IsCertified,
    RecordedAt,
}
