use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000002_create_crops_table"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Crops::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Crops::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Crops::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Crops::CropType).string_len(100).not_null())
                    // NULL passes the check, so the column stays optional
                    .col(
                        ColumnDef::new(Crops::GrowingSeasonDays)
                            .integer()
                            .null()
                            .check(Expr::col(Crops::GrowingSeasonDays).gt(0)),
                    )
                    .col(ColumnDef::new(Crops::Description).text().null())
                    .col(
                        ColumnDef::new(Crops::IsAnnual)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Crops::AddedDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Crops::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Crops {
    Table,
    Id,
    Name,
    CropType,
    GrowingSeasonDays,
    Description,
    IsAnnual,
    AddedDate,
}
