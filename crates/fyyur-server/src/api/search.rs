use axum::{extract::State, Json};
use chrono::Utc;
use sea_orm::{
    sea_query::{Expr, Func, SimpleExpr},
    ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder,
};
use serde::Serialize;
use std::sync::Arc;

use crate::error::ApiError;
use crate::form::FormData;
use crate::timeline;
use fyyur_db::entities::{artist, show, venue};
use fyyur_db::AppState;

/// A parsed `search_term`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SearchTerm {
    /// Substring of name, city or state.
    Text(String),
    /// `<city>,<state>`: substring of city or of state, matched independently.
    Place { city: String, state: String },
}

impl SearchTerm {
    pub fn parse(raw: &str) -> Self {
        match raw.split_once(',') {
            Some((city, state)) => Self::Place {
                city: city.trim().to_string(),
                state: state.trim().to_string(),
            },
            None => Self::Text(raw.trim().to_string()),
        }
    }

    /// Filter for an entity with the given columns, or `None` when the term
    /// can match nothing (a comma with both halves blank).
    pub fn condition<C>(&self, name: C, city: C, state: C) -> Option<Condition>
    where
        C: ColumnTrait,
    {
        match self {
            Self::Text(text) if text.is_empty() => Some(Condition::all()),
            Self::Text(text) => Some(
                Condition::any()
                    .add(contains(name, text))
                    .add(contains(city, text))
                    .add(contains(state, text)),
            ),
            Self::Place {
                city: city_text,
                state: state_text,
            } => {
                let mut cond = Condition::any();
                if !city_text.is_empty() {
                    cond = cond.add(contains(city, city_text));
                }
                if !state_text.is_empty() {
                    cond = cond.add(contains(state, state_text));
                }
                (!cond.is_empty()).then_some(cond)
            }
        }
    }
}

const LIKE_ESCAPE: char = '!';

/// `LOWER(col) LIKE LOWER('%needle%') ESCAPE '!'`. Both sides are folded by
/// the database's own `LOWER`, so they fold identically on every backend
/// (Unicode-aware on PostgreSQL, ASCII-only on SQLite). LIKE wildcards in
/// `needle` are escaped and match literally.
fn contains<C: ColumnTrait>(column: C, needle: &str) -> SimpleExpr {
    let mut pattern = String::with_capacity(needle.len() + 2);
    pattern.push('%');
    for c in needle.chars() {
        if matches!(c, '%' | '_') || c == LIKE_ESCAPE {
            pattern.push(LIKE_ESCAPE);
        }
        pattern.push(c);
    }
    pattern.push('%');

    Expr::cust_with_exprs(
        format!("$1 LIKE LOWER($2) ESCAPE '{LIKE_ESCAPE}'"),
        [
            SimpleExpr::from(Func::lower(Expr::col((column.entity_name(), column)))),
            SimpleExpr::from(Expr::val(pattern)),
        ],
    )
}

#[derive(Debug, Serialize)]
pub struct SearchHit {
    pub id: i32,
    pub name: String,
    pub num_upcoming_shows: u64,
}

#[derive(Debug, Serialize)]
pub struct SearchResults {
    pub search_term: String,
    pub count: usize,
    pub data: Vec<SearchHit>,
}

impl SearchResults {
    fn new(search_term: String, data: Vec<SearchHit>) -> Self {
        Self {
            search_term,
            count: data.len(),
            data,
        }
    }
}

fn search_term(form: &FormData) -> String {
    form.get("search_term").unwrap_or_default().to_string()
}

/// POST /venues/search
pub async fn search_venues(
    State(state): State<Arc<AppState>>,
    form: FormData,
) -> Result<Json<SearchResults>, ApiError> {
    let raw = search_term(&form);
    let Some(cond) = SearchTerm::parse(&raw).condition(
        venue::Column::Name,
        venue::Column::City,
        venue::Column::State,
    ) else {
        return Ok(Json(SearchResults::new(raw, Vec::new())));
    };

    let now = Utc::now();
    let venues = venue::Entity::find()
        .filter(cond)
        .order_by_asc(venue::Column::Id)
        .all(&state.db)
        .await?;

    let ids: Vec<i32> = venues.iter().map(|v| v.id).collect();
    let counts =
        timeline::upcoming_counts(&state.db, show::Column::VenueId, Some(ids.as_slice()), &now)
            .await?;

    tracing::debug!(term = %raw, hits = venues.len(), "venue search");

    let data = venues
        .into_iter()
        .map(|v| SearchHit {
            num_upcoming_shows: counts.get(&v.id).copied().unwrap_or(0),
            id: v.id,
            name: v.name,
        })
        .collect();
    Ok(Json(SearchResults::new(raw, data)))
}

/// POST /artists/search
pub async fn search_artists(
    State(state): State<Arc<AppState>>,
    form: FormData,
) -> Result<Json<SearchResults>, ApiError> {
    let raw = search_term(&form);
    let Some(cond) = SearchTerm::parse(&raw).condition(
        artist::Column::Name,
        artist::Column::City,
        artist::Column::State,
    ) else {
        return Ok(Json(SearchResults::new(raw, Vec::new())));
    };

    let now = Utc::now();
    let artists = artist::Entity::find()
        .filter(cond)
        .order_by_asc(artist::Column::Id)
        .all(&state.db)
        .await?;

    let ids: Vec<i32> = artists.iter().map(|a| a.id).collect();
    let counts =
        timeline::upcoming_counts(&state.db, show::Column::ArtistId, Some(ids.as_slice()), &now)
            .await?;

    tracing::debug!(term = %raw, hits = artists.len(), "artist search");

    let data = artists
        .into_iter()
        .map(|a| SearchHit {
            num_upcoming_shows: counts.get(&a.id).copied().unwrap_or(0),
            id: a.id,
            name: a.name,
        })
        .collect();
    Ok(Json(SearchResults::new(raw, data)))
}
