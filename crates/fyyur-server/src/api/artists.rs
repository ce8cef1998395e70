use axum::{
    extract::{Path, State},
    response::Redirect,
    Json,
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder, Set, TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;

use super::Listing;
use crate::error::ApiError;
use crate::form::{FieldReader, FormChoices, FormData};
use crate::timeline;
use fyyur_db::entities::{artist, show, venue};
use fyyur_db::{genres, AppState};

#[derive(Debug, Serialize)]
pub struct ArtistResponse {
    pub id: i32,
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website_link: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

impl From<artist::Model> for ArtistResponse {
    fn from(a: artist::Model) -> Self {
        Self {
            id: a.id,
            genres: genres::split(&a.genres),
            name: a.name,
            city: a.city,
            state: a.state,
            phone: a.phone,
            website_link: a.website_link,
            facebook_link: a.facebook_link,
            image_link: a.image_link,
            seeking_venue: a.seeking_venue,
            seeking_description: a.seeking_description,
        }
    }
}

/// A show on an artist page, joined with the hosting venue.
#[derive(Debug, Serialize)]
pub struct ArtistShow {
    pub venue_id: i32,
    pub venue_name: String,
    pub venue_image_link: Option<String>,
    pub start_time: DateTime<FixedOffset>,
}

#[derive(Debug, Serialize)]
pub struct ArtistDetailResponse {
    #[serde(flatten)]
    pub artist: ArtistResponse,
    pub past_shows: Vec<ArtistShow>,
    pub upcoming_shows: Vec<ArtistShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Debug, Serialize)]
pub struct ArtistFormResponse {
    pub artist: Option<ArtistResponse>,
    pub choices: FormChoices,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtistForm {
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website_link: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_venue: bool,
    pub seeking_description: Option<String>,
}

impl ArtistForm {
    pub fn from_form(form: &FormData) -> Result<Self, ApiError> {
        let mut fields = FieldReader::new(form);
        let artist = Self {
            name: fields.required("name"),
            genres: fields.genres("genres"),
            city: fields.required("city"),
            state: fields.state("state"),
            phone: fields.phone("phone"),
            website_link: fields.link("website_link"),
            image_link: fields.link("image_link"),
            facebook_link: fields.link("facebook_link"),
            seeking_venue: fields.checkbox("seeking_venue"),
            seeking_description: fields.optional("seeking_description"),
        };
        fields.finish(artist)
    }

    fn apply(self, model: &mut artist::ActiveModel) {
        model.name = Set(self.name);
        model.genres = Set(genres::join(&self.genres));
        model.city = Set(self.city);
        model.state = Set(self.state);
        model.phone = Set(self.phone);
        model.website_link = Set(self.website_link);
        model.image_link = Set(self.image_link);
        model.facebook_link = Set(self.facebook_link);
        model.seeking_venue = Set(self.seeking_venue);
        model.seeking_description = Set(self.seeking_description);
    }
}

/// GET /artists
pub async fn list_artists(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<Listing>>, ApiError> {
    let artists = artist::Entity::find()
        .order_by_asc(artist::Column::Id)
        .all(&state.db)
        .await?;

    Ok(Json(
        artists
            .into_iter()
            .map(|a| Listing {
                id: a.id,
                name: a.name,
            })
            .collect(),
    ))
}

/// GET /artists/{id}
pub async fn get_artist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ArtistDetailResponse>, ApiError> {
    let now = Utc::now();
    let artist_model = artist::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Artist {id}")))?;

    let shows: Vec<ArtistShow> = show::Entity::find()
        .filter(show::Column::ArtistId.eq(id))
        .find_also_related(venue::Entity)
        .all(&state.db)
        .await?
        .into_iter()
        .filter_map(|(s, v)| {
            v.map(|v| ArtistShow {
                venue_id: v.id,
                venue_name: v.name,
                venue_image_link: v.image_link,
                start_time: s.start_time,
            })
        })
        .collect();

    let shows = timeline::partition(shows, &now, |s| s.start_time);

    Ok(Json(ArtistDetailResponse {
        artist: ArtistResponse::from(artist_model),
        past_shows_count: shows.past.len(),
        upcoming_shows_count: shows.upcoming.len(),
        past_shows: shows.past,
        upcoming_shows: shows.upcoming,
    }))
}

/// GET /artists/create
pub async fn create_artist_form() -> Json<ArtistFormResponse> {
    Json(ArtistFormResponse {
        artist: None,
        choices: FormChoices::default(),
    })
}

/// POST /artists/create
pub async fn create_artist(
    State(state): State<Arc<AppState>>,
    form: FormData,
) -> Result<Redirect, ApiError> {
    let input = ArtistForm::from_form(&form)?;
    let name = input.name.clone();

    let txn = state.db.begin().await?;
    let mut model = artist::ActiveModel {
        ..Default::default()
    };
    input.apply(&mut model);
    let created = model
        .insert(&txn)
        .await
        .map_err(|e| ApiError::from_write(e, format!("Artist {name}")))?;
    txn.commit().await?;

    tracing::info!(artist_id = created.id, name = %created.name, "artist listed");
    Ok(Redirect::to("/"))
}

/// GET /artists/{id}/edit
pub async fn edit_artist_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<ArtistFormResponse>, ApiError> {
    let artist_model = artist::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Artist {id}")))?;

    Ok(Json(ArtistFormResponse {
        artist: Some(ArtistResponse::from(artist_model)),
        choices: FormChoices::default(),
    }))
}

/// POST /artists/{id}/edit
pub async fn edit_artist(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    form: FormData,
) -> Result<Redirect, ApiError> {
    let input = ArtistForm::from_form(&form)?;
    let name = input.name.clone();

    let txn = state.db.begin().await?;
    let existing = artist::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Artist {id}")))?;

    let mut active: artist::ActiveModel = existing.into();
    input.apply(&mut active);
    active
        .update(&txn)
        .await
        .map_err(|e| ApiError::from_write(e, format!("Artist {name}")))?;
    txn.commit().await?;

    tracing::info!(artist_id = id, "artist modified");
    Ok(Redirect::to(&format!("/artists/{id}")))
}
