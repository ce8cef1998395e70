use axum::{extract::State, Json};
use sea_orm::{EntityTrait, QueryOrder, QuerySelect};
use serde::Serialize;
use std::sync::Arc;

use super::Listing;
use crate::error::ApiError;
use fyyur_db::entities::{artist, venue};
use fyyur_db::AppState;

const RECENT_LIMIT: u64 = 10;

#[derive(Debug, Serialize)]
pub struct HomeResponse {
    pub recent_venues: Vec<Listing>,
    pub recent_artists: Vec<Listing>,
}

/// GET /
pub async fn home(State(state): State<Arc<AppState>>) -> Result<Json<HomeResponse>, ApiError> {
    let recent_venues = venue::Entity::find()
        .order_by_desc(venue::Column::Id)
        .limit(RECENT_LIMIT)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|v| Listing {
            id: v.id,
            name: v.name,
        })
        .collect();

    let recent_artists = artist::Entity::find()
        .order_by_desc(artist::Column::Id)
        .limit(RECENT_LIMIT)
        .all(&state.db)
        .await?
        .into_iter()
        .map(|a| Listing {
            id: a.id,
            name: a.name,
        })
        .collect();

    Ok(Json(HomeResponse {
        recent_venues,
        recent_artists,
    }))
}
