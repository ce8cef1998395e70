use sea_orm_migration::prelude::*;

use super::m20240101_000001_create_venue::Venue;
use super::m20240101_000002_create_artist::Artist;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Show::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Show::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Show::ArtistId).integer().not_null())
                    .col(ColumnDef::new(Show::VenueId).integer().not_null())
                    .col(
                        ColumnDef::new(Show::StartTime)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_show_artist_id")
                            .from(Show::Table, Show::ArtistId)
                            .to(Artist::Table, Artist::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_show_venue_id")
                            .from(Show::Table, Show::VenueId)
                            .to(Venue::Table, Venue::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // One booking per artist, venue and start time
        manager
            .create_index(
                Index::create()
                    .name("ux_show_artist_venue_start")
                    .table(Show::Table)
                    .col(Show::ArtistId)
                    .col(Show::VenueId)
                    .col(Show::StartTime)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_show_venue_id")
                    .table(Show::Table)
                    .col(Show::VenueId)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Show::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Show {
    Table,
    Id,
    ArtistId,
    VenueId,
    StartTime,
}
