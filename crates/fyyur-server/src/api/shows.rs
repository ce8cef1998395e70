use axum::{extract::State, response::Redirect, Json};
use chrono::{DateTime, FixedOffset};
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;

use super::Listing;
use crate::error::ApiError;
use crate::form::{FieldReader, FormData};
use fyyur_db::entities::{artist, show, venue};
use fyyur_db::AppState;

#[derive(Debug, Serialize)]
pub struct ShowResponse {
    pub venue_id: i32,
    pub venue_name: String,
    pub artist_id: i32,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: DateTime<FixedOffset>,
}

/// Options for the new-show form.
#[derive(Debug, Serialize)]
pub struct ShowFormResponse {
    pub artists: Vec<Listing>,
    pub venues: Vec<Listing>,
}

/// GET /shows
pub async fn list_shows(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<ShowResponse>>, ApiError> {
    let shows = show::Entity::find()
        .order_by_asc(show::Column::StartTime)
        .order_by_asc(show::Column::Id)
        .all(&state.db)
        .await?;

    if shows.is_empty() {
        return Ok(Json(Vec::new()));
    }

    let artist_ids: Vec<i32> = shows.iter().map(|s| s.artist_id).collect();
    let venue_ids: Vec<i32> = shows.iter().map(|s| s.venue_id).collect();

    let artists: HashMap<i32, artist::Model> = artist::Entity::find()
        .filter(artist::Column::Id.is_in(artist_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|a| (a.id, a))
        .collect();

    let venues: HashMap<i32, venue::Model> = venue::Entity::find()
        .filter(venue::Column::Id.is_in(venue_ids))
        .all(&state.db)
        .await?
        .into_iter()
        .map(|v| (v.id, v))
        .collect();

    let data = shows
        .into_iter()
        .filter_map(|s| {
            let a = artists.get(&s.artist_id)?;
            let v = venues.get(&s.venue_id)?;
            Some(ShowResponse {
                venue_id: v.id,
                venue_name: v.name.clone(),
                artist_id: a.id,
                artist_name: a.name.clone(),
                artist_image_link: a.image_link.clone(),
                start_time: s.start_time,
            })
        })
        .collect();

    Ok(Json(data))
}

/// GET /shows/create
pub async fn create_show_form(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ShowFormResponse>, ApiError> {
    let artists = artist::Entity::find()
        .order_by_asc(artist::Column::Name)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|a| Listing {
            id: a.id,
            name: a.name,
        })
        .collect();

    let venues = venue::Entity::find()
        .order_by_asc(venue::Column::Name)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|v| Listing {
            id: v.id,
            name: v.name,
        })
        .collect();

    Ok(Json(ShowFormResponse { artists, venues }))
}

/// POST /shows/create
pub async fn create_show(
    State(state): State<Arc<AppState>>,
    form: FormData,
) -> Result<Redirect, ApiError> {
    let mut fields = FieldReader::new(&form);
    let artist_id = fields.id("artist_id");
    let venue_id = fields.id("venue_id");
    let start_time = fields.datetime("start_time");

    let txn = state.db.begin().await?;

    if artist_id > 0 && artist::Entity::find_by_id(artist_id).one(&txn).await?.is_none() {
        fields.add_error("artist_id", format!("No artist with id {artist_id}."));
    }
    if venue_id > 0 && venue::Entity::find_by_id(venue_id).one(&txn).await?.is_none() {
        fields.add_error("venue_id", format!("No venue with id {venue_id}."));
    }
    fields.finish(())?;

    let created = show::ActiveModel {
        artist_id: Set(artist_id),
        venue_id: Set(venue_id),
        start_time: Set(start_time),
        ..Default::default()
    }
    .insert(&txn)
    .await
    .map_err(|e| {
        ApiError::from_write(
            e,
            format!("Show of artist {artist_id} at venue {venue_id} on {start_time}"),
        )
    })?;
    txn.commit().await?;

    tracing::info!(show_id = created.id, artist_id, venue_id, "show listed");
    Ok(Redirect::to("/"))
}
