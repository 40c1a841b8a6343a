use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Tenants::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Tenants::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Tenants::Name).string_len(191).not_null())
                    .col(ColumnDef::new(Tenants::CompanyName).string_len(191).not_null())
                    .col(ColumnDef::new(Tenants::TenantKey).string_len(64).not_null().unique_key())
                    .col(ColumnDef::new(Tenants::DbName).string_len(64).not_null().unique_key())
                    .col(ColumnDef::new(Tenants::Subdomain).string_len(191).not_null().unique_key())
                    .col(ColumnDef::new(Tenants::PreferredSubdomain).string_len(191))
                    .col(ColumnDef::new(Tenants::Email).string_len(191).not_null().unique_key())
                    .col(ColumnDef::new(Tenants::Phone).string_len(32).not_null())
                    .col(ColumnDef::new(Tenants::Password).string_len(255).not_null())
                    .col(ColumnDef::new(Tenants::Image).string_len(512))
                    .col(ColumnDef::new(Tenants::DbUrl).text())
                    .col(
                        ColumnDef::new(Tenants::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(
                        ColumnDef::new(Tenants::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Tenants::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(Tenants::DeletedAt).timestamp_with_time_zone())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Tenants::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum Tenants {
    Table,
    Id,
    Name,
    CompanyName,
    TenantKey,
    DbName,
    Subdomain,
    PreferredSubdomain,
    Email,
    Phone,
    Password,
    Image,
    DbUrl,
    IsActive,
    CreatedAt,
    UpdatedAt,
    DeletedAt,
}
