use sea_orm_migration::prelude::*;

pub struct Migration;

impl MigrationName for Migration {
    fn name(&self) -> &str {
        "m20240301_000001_create_enterprise_tables"
    }
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Enterprises::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Enterprises::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Enterprises::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Enterprises::Address).text().null())
                    .col(ColumnDef::new(Enterprises::Phone).string_len(50).null())
                    .col(ColumnDef::new(Enterprises::Email).string_len(255).null())
                    .col(
                        ColumnDef::new(Enterprises::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Enterprises::RegistrationDate)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(Employees::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Employees::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Employees::EnterpriseId).integer().not_null())
                    .col(ColumnDef::new(Employees::FirstName).string_len(100).not_null())
                    .col(ColumnDef::new(Employees::LastName).string_len(100).not_null())
                    .col(ColumnDef::new(Employees::Position).string_len(100).null())
                    .col(ColumnDef::new(Employees::Phone).string_len(50).null())
                    .col(ColumnDef::new(Employees::Email).string_len(255).null())
                    .col(ColumnDef::new(Employees::HireDate).date().not_null())
                    .col(
                        ColumnDef::new(Employees::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(Employees::Notes).text().null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_employees_enterprise_id")
                            .from(Employees::Table, Employees::EnterpriseId)
                            .to(Enterprises::Table, Enterprises::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Employees::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Enterprises::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Enterprises {
    Table,
    Id,
    Name,
    Address,
    Phone,
    Email,
    IsActive,
    RegistrationDate,
}

#[derive(DeriveIden)]
enum Employees {
    Table,
    Id,
    EnterpriseId,
    FirstName,
    LastName,
    Position,
    Phone,
    Email,
    HireDate,
    IsActive,
    Notes,
}
