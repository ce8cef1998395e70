use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Artist::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Artist::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Artist::Name).string().not_null().unique_key())
                    .col(ColumnDef::new(Artist::City).string_len(120).not_null())
                    .col(ColumnDef::new(Artist::State).string_len(120).not_null())
                    .col(ColumnDef::new(Artist::Phone).string_len(120).null())
                    .col(ColumnDef::new(Artist::Genres).string_len(120).not_null())
                    .col(ColumnDef::new(Artist::WebsiteLink).string_len(120).null())
                    .col(ColumnDef::new(Artist::ImageLink).string_len(500).null())
                    .col(ColumnDef::new(Artist::FacebookLink).string_len(120).null())
                    .col(
                        ColumnDef::new(Artist::SeekingVenue)
                            .boolean()
                            .not_null()
                            .default(false),
                    )
                    .col(ColumnDef::new(Artist::SeekingDescription).text().null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Artist::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Artist {
    Table,
    Id,
    Name,
    City,
    State,
    Phone,
    Genres,
    WebsiteLink,
    ImageLink,
    FacebookLink,
    SeekingVenue,
    SeekingDescription,
}
