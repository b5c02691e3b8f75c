use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(CacheEntries::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(CacheEntries::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(CacheEntries::LocationKey).string().not_null())
                    .col(ColumnDef::new(CacheEntries::DataType).string().not_null())
                    .col(ColumnDef::new(CacheEntries::Payload).text().not_null())
                    .col(ColumnDef::new(CacheEntries::CreatedAt).string().not_null())
                    .col(ColumnDef::new(CacheEntries::ExpiresAt).string().not_null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cache_entries_key_type")
                    .table(CacheEntries::Table)
                    .col(CacheEntries::LocationKey)
                    .col(CacheEntries::DataType)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_cache_entries_expires_at")
                    .table(CacheEntries::Table)
                    .col(CacheEntries::ExpiresAt)
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(WeatherAlerts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(WeatherAlerts::Id)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(WeatherAlerts::LocationKey).string().not_null())
                    .col(ColumnDef::new(WeatherAlerts::AlertType).string().not_null())
                    .col(ColumnDef::new(WeatherAlerts::Title).string().not_null())
                    .col(ColumnDef::new(WeatherAlerts::Message).text().not_null())
                    .col(ColumnDef::new(WeatherAlerts::Severity).string().not_null())
                    .col(
                        ColumnDef::new(WeatherAlerts::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(WeatherAlerts::CreatedAt).string().not_null())
                    .col(ColumnDef::new(WeatherAlerts::ExpiresAt).string().null())
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_weather_alerts_key_title")
                    .table(WeatherAlerts::Table)
                    .col(WeatherAlerts::LocationKey)
                    .col(WeatherAlerts::Title)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(WeatherAlerts::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(CacheEntries::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum CacheEntries {
    Table,
    Id,
    LocationKey,
    DataType,
    Payload,
    CreatedAt,
    ExpiresAt,
}

#[derive(DeriveIden)]
enum WeatherAlerts {
    Table,
    Id,
    LocationKey,
    AlertType,
    Title,
    Message,
    Severity,
    IsActive,
    CreatedAt,
    ExpiresAt,
}
