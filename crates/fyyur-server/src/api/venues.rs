use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
    TransactionTrait,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::form::{FieldReader, FormChoices, FormData};
use crate::timeline;
use fyyur_db::entities::{artist, show, venue};
use fyyur_db::{genres, AppState};

#[derive(Debug, Serialize)]
pub struct VenueResponse {
    pub id: i32,
    pub name: String,
    pub genres: Vec<String>,
    pub address: String,
    pub city: String,
    pub state: String,
    pub phone: Option<String>,
    pub website_link: Option<String>,
    pub facebook_link: Option<String>,
    pub image_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

impl From<venue::Model> for VenueResponse {
    fn from(v: venue::Model) -> Self {
        Self {
            id: v.id,
            genres: genres::split(&v.genres),
            name: v.name,
            address: v.address,
            city: v.city,
            state: v.state,
            phone: v.phone,
            website_link: v.website_link,
            facebook_link: v.facebook_link,
            image_link: v.image_link,
            seeking_talent: v.seeking_talent,
            seeking_description: v.seeking_description,
        }
    }
}

/// A show on a venue page, joined with the performing artist.
#[derive(Debug, Serialize)]
pub struct VenueShow {
    pub artist_id: i32,
    pub artist_name: String,
    pub artist_image_link: Option<String>,
    pub start_time: DateTime<FixedOffset>,
}

#[derive(Debug, Serialize)]
pub struct VenueDetailResponse {
    #[serde(flatten)]
    pub venue: VenueResponse,
    pub past_shows: Vec<VenueShow>,
    pub upcoming_shows: Vec<VenueShow>,
    pub past_shows_count: usize,
    pub upcoming_shows_count: usize,
}

#[derive(Debug, Serialize)]
pub struct VenueSummary {
    pub id: i32,
    pub name: String,
    pub num_upcoming_shows: u64,
}

/// Venues sharing a city and state.
#[derive(Debug, Serialize)]
pub struct AreaResponse {
    pub city: String,
    pub state: String,
    pub venues: Vec<VenueSummary>,
}

#[derive(Debug, Serialize)]
pub struct VenueFormResponse {
    pub venue: Option<VenueResponse>,
    pub choices: FormChoices,
}

#[derive(Debug, Serialize)]
pub struct DeleteResponse {
    pub url: String,
    pub error: u8,
}

/// A validated venue submission. Every field is written on create and on
/// edit; blank optional fields clear the column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VenueForm {
    pub name: String,
    pub genres: Vec<String>,
    pub city: String,
    pub state: String,
    pub address: String,
    pub phone: Option<String>,
    pub website_link: Option<String>,
    pub image_link: Option<String>,
    pub facebook_link: Option<String>,
    pub seeking_talent: bool,
    pub seeking_description: Option<String>,
}

impl VenueForm {
    pub fn from_form(form: &FormData) -> Result<Self, ApiError> {
        let mut fields = FieldReader::new(form);
        let venue = Self {
            name: fields.required("name"),
            genres: fields.genres("genres"),
            city: fields.required("city"),
            state: fields.state("state"),
            address: fields.required("address"),
            phone: fields.phone("phone"),
            website_link: fields.link("website_link"),
            image_link: fields.link("image_link"),
            facebook_link: fields.link("facebook_link"),
            seeking_talent: fields.checkbox("seeking_talent"),
            seeking_description: fields.optional("seeking_description"),
        };
        fields.finish(venue)
    }

    fn apply(self, model: &mut venue::ActiveModel) {
        model.name = Set(self.name);
        model.genres = Set(genres::join(&self.genres));
        model.city = Set(self.city);
        model.state = Set(self.state);
        model.address = Set(self.address);
        model.phone = Set(self.phone);
        model.website_link = Set(self.website_link);
        model.image_link = Set(self.image_link);
        model.facebook_link = Set(self.facebook_link);
        model.seeking_talent = Set(self.seeking_talent);
        model.seeking_description = Set(self.seeking_description);
    }
}

/// GET /venues
pub async fn list_venues(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AreaResponse>>, ApiError> {
    let now = Utc::now();
    let venues = venue::Entity::find()
        .order_by_asc(venue::Column::State)
        .order_by_asc(venue::Column::City)
        .order_by_asc(venue::Column::Id)
        .all(&state.db)
        .await?;

    let counts = timeline::upcoming_counts(&state.db, show::Column::VenueId, None, &now).await?;

    let mut areas: Vec<AreaResponse> = Vec::new();
    for v in venues {
        let summary = VenueSummary {
            id: v.id,
            name: v.name,
            num_upcoming_shows: counts.get(&v.id).copied().unwrap_or(0),
        };
        match areas.last_mut() {
            Some(area) if area.city == v.city && area.state == v.state => {
                area.venues.push(summary)
            }
            _ => areas.push(AreaResponse {
                city: v.city,
                state: v.state,
                venues: vec![summary],
            }),
        }
    }

    Ok(Json(areas))
}

/// GET /venues/{id}
pub async fn get_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<VenueDetailResponse>, ApiError> {
    let now = Utc::now();
    let venue_model = venue::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Venue {id}")))?;

    let shows: Vec<VenueShow> = show::Entity::find()
        .filter(show::Column::VenueId.eq(id))
        .find_also_related(artist::Entity)
        .all(&state.db)
        .await?
        .into_iter()
        .filter_map(|(s, a)| {
            a.map(|a| VenueShow {
                artist_id: a.id,
                artist_name: a.name,
                artist_image_link: a.image_link,
                start_time: s.start_time,
            })
        })
        .collect();

    let shows = timeline::partition(shows, &now, |s| s.start_time);

    Ok(Json(VenueDetailResponse {
        venue: VenueResponse::from(venue_model),
        past_shows_count: shows.past.len(),
        upcoming_shows_count: shows.upcoming.len(),
        past_shows: shows.past,
        upcoming_shows: shows.upcoming,
    }))
}

/// GET /venues/create
pub async fn create_venue_form() -> Json<VenueFormResponse> {
    Json(VenueFormResponse {
        venue: None,
        choices: FormChoices::default(),
    })
}

/// POST /venues/create
pub async fn create_venue(
    State(state): State<Arc<AppState>>,
    form: FormData,
) -> Result<Redirect, ApiError> {
    let input = VenueForm::from_form(&form)?;
    let name = input.name.clone();

    let txn = state.db.begin().await?;
    let mut model = venue::ActiveModel {
        ..Default::default()
    };
    input.apply(&mut model);
    let created = model
        .insert(&txn)
        .await
        .map_err(|e| ApiError::from_write(e, format!("Venue {name}")))?;
    txn.commit().await?;

    tracing::info!(venue_id = created.id, name = %created.name, "venue listed");
    Ok(Redirect::to("/venues"))
}

/// GET /venues/{id}/edit
pub async fn edit_venue_form(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> Result<Json<VenueFormResponse>, ApiError> {
    let venue_model = venue::Entity::find_by_id(id)
        .one(&state.db)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Venue {id}")))?;

    Ok(Json(VenueFormResponse {
        venue: Some(VenueResponse::from(venue_model)),
        choices: FormChoices::default(),
    }))
}

/// POST /venues/{id}/edit
pub async fn edit_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    form: FormData,
) -> Result<Redirect, ApiError> {
    let input = VenueForm::from_form(&form)?;
    let name = input.name.clone();

    let txn = state.db.begin().await?;
    let existing = venue::Entity::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Venue {id}")))?;

    let mut active: venue::ActiveModel = existing.into();
    input.apply(&mut active);
    active
        .update(&txn)
        .await
        .map_err(|e| ApiError::from_write(e, format!("Venue {name}")))?;
    txn.commit().await?;

    tracing::info!(venue_id = id, "venue modified");
    Ok(Redirect::to(&format!("/venues/{id}")))
}

/// DELETE /venues/{id}
pub async fn delete_venue(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
) -> (StatusCode, Json<DeleteResponse>) {
    match remove_venue(&state.db, id).await {
        Ok(shows_removed) => {
            tracing::info!(venue_id = id, shows_removed, "venue deleted");
            (
                StatusCode::OK,
                Json(DeleteResponse {
                    url: "/venues".to_string(),
                    error: 0,
                }),
            )
        }
        Err(e) => {
            match &e {
                ApiError::Database(db_err) => {
                    tracing::error!(venue_id = id, error = %db_err, "venue delete failed")
                }
                other => tracing::warn!(venue_id = id, "venue delete failed: {other}"),
            }
            (
                e.status(),
                Json(DeleteResponse {
                    url: String::new(),
                    error: 1,
                }),
            )
        }
    }
}

/// Delete a venue and its shows in one transaction. Returns the number of
/// shows removed.
async fn remove_venue(db: &DatabaseConnection, id: i32) -> Result<u64, ApiError> {
    let txn = db.begin().await?;

    // The foreign key cascades too; deleting explicitly keeps the count and
    // does not depend on SQLite's foreign_keys pragma.
    let shows = show::Entity::delete_many()
        .filter(show::Column::VenueId.eq(id))
        .exec(&txn)
        .await?;

    let removed = venue::Entity::delete_by_id(id).exec(&txn).await?;
    if removed.rows_affected == 0 {
        return Err(ApiError::NotFound(format!("Venue {id}")));
    }

    txn.commit().await?;
    Ok(shows.rows_affected)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_venue_model() -> venue::Model {
        venue::Model {
            id: 1,
            name: "The Musical Hop".into(),
            genres: "Jazz,Reggae,Swing,Classical,Folk".into(),
            city: "San Francisco".into(),
            state: "CA".into(),
            address: "1015 Folsom Street".into(),
            phone: Some("123-123-1234".into()),
            website_link: Some("https://www.themusicalhop.com".into()),
            image_link: None,
            facebook_link: Some("https://www.facebook.com/TheMusicalHop".into()),
            seeking_talent: true,
            seeking_description: Some("We are on the lookout for a local artist.".into()),
        }
    }

    fn full_form() -> FormData {
        FormData::parse(
            b"name=The+Dueling+Pianos+Bar&genres=Classical&genres=R%26B&city=New+York\
              &state=NY&address=335+Delancey+Street&phone=914-003-1132\
              &website_link=https%3A%2F%2Fwww.theduelingpianos.com&image_link=\
              &facebook_link=&seeking_talent=y&seeking_description=",
        )
    }

    #[test]
    fn test_venue_response_splits_genres() {
        let resp = VenueResponse::from(make_venue_model());
        assert_eq!(resp.genres, vec!["Jazz", "Reggae", "Swing", "Classical", "Folk"]);
        assert_eq!(resp.name, "The Musical Hop");
    }

    #[test]
    fn test_detail_serializes_flat() {
        let detail = VenueDetailResponse {
            venue: VenueResponse::from(make_venue_model()),
            past_shows: vec![],
            upcoming_shows: vec![],
            past_shows_count: 0,
            upcoming_shows_count: 0,
        };
        let json = serde_json::to_value(&detail).unwrap();
        assert_eq!(json["name"], "The Musical Hop");
        assert_eq!(json["genres"][0], "Jazz");
        assert!(json["past_shows"].as_array().unwrap().is_empty());
        assert_eq!(json["upcoming_shows_count"], 0);
    }

    #[test]
    fn test_form_parses_full_submission() {
        let input = VenueForm::from_form(&full_form()).unwrap();
        assert_eq!(input.name, "The Dueling Pianos Bar");
        assert_eq!(input.genres, vec!["Classical", "R&B"]);
        assert_eq!(input.state, "NY");
        assert!(input.seeking_talent);
        assert_eq!(input.image_link, None);
        assert_eq!(input.facebook_link, None);
        assert_eq!(input.seeking_description, None);
    }

    #[test]
    fn test_form_missing_required_fields() {
        let form = FormData::parse(b"name=&city=&seeking_talent=y");
        match VenueForm::from_form(&form).unwrap_err() {
            ApiError::Validation(fields) => {
                let names: Vec<_> = fields.iter().map(|f| f.field).collect();
                assert_eq!(names, vec!["name", "genres", "city", "state", "address"]);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_apply_overwrites_every_field() {
        let mut active: venue::ActiveModel = make_venue_model().into();
        VenueForm::from_form(&full_form()).unwrap().apply(&mut active);

        assert_eq!(active.name, Set("The Dueling Pianos Bar".to_string()));
        assert_eq!(active.genres, Set("Classical,R&B".to_string()));
        assert_eq!(active.website_link, Set(Some("https://www.theduelingpianos.com".to_string())));
        assert_eq!(active.facebook_link, Set(None));
        assert_eq!(active.seeking_description, Set(None));
    }
}
