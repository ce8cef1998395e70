//! Past/upcoming classification of shows.
//!
//! Nothing here is persisted: a show is upcoming when it starts strictly after
//! the instant captured for the current request, past otherwise. Callers take
//! `Utc::now()` once per request and pass it down.

use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DbErr, EntityTrait, QueryFilter, QuerySelect,
};
use serde::Serialize;
use std::collections::HashMap;

use fyyur_db::entities::show;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ShowTiming {
    Past,
    Upcoming,
}

impl ShowTiming {
    pub fn classify(start_time: &DateTime<FixedOffset>, now: &DateTime<Utc>) -> Self {
        if start_time > now {
            Self::Upcoming
        } else {
            Self::Past
        }
    }
}

/// Shows split by [`ShowTiming`]. Upcoming shows are soonest first, past
/// shows most recent first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Partitioned<T> {
    pub past: Vec<T>,
    pub upcoming: Vec<T>,
}

pub fn partition<T, F>(items: Vec<T>, now: &DateTime<Utc>, start_time: F) -> Partitioned<T>
where
    F: Fn(&T) -> DateTime<FixedOffset>,
{
    let (mut upcoming, mut past): (Vec<T>, Vec<T>) = items
        .into_iter()
        .partition(|item| ShowTiming::classify(&start_time(item), now) == ShowTiming::Upcoming);

    upcoming.sort_by_key(|item| start_time(item));
    past.sort_by_key(|item| std::cmp::Reverse(start_time(item)));

    Partitioned { past, upcoming }
}

/// Largest id list bound into one `IN (...)` filter. SQLite caps bound
/// parameters per statement; longer lists fall back to counting every owner.
pub const MAX_BOUND_IDS: usize = 1000;

/// Number of upcoming shows per owner id, where `owner` is
/// `show::Column::VenueId` or `show::Column::ArtistId`. Owners without
/// upcoming shows are absent from the map.
///
/// `ids` narrows the count to those owners; `None` counts every owner. The
/// map may hold extra owners when `ids` is longer than [`MAX_BOUND_IDS`].
pub async fn upcoming_counts<C>(
    db: &C,
    owner: show::Column,
    ids: Option<&[i32]>,
    now: &DateTime<Utc>,
) -> Result<HashMap<i32, u64>, DbErr>
where
    C: ConnectionTrait,
{
    let mut query = show::Entity::find()
        .select_only()
        .column(owner)
        .column_as(Expr::col(show::Column::Id).count(), "upcoming")
        .filter(show::Column::StartTime.gt(now.fixed_offset()))
        .group_by(owner);

    match ids {
        Some([]) => return Ok(HashMap::new()),
        Some(ids) if ids.len() <= MAX_BOUND_IDS => {
            query = query.filter(owner.is_in(ids.iter().copied()));
        }
        _ => {}
    }

    let rows: Vec<(i32, i64)> = query.into_tuple().all(db).await?;

    Ok(rows
        .into_iter()
        .map(|(id, n)| (id, n.max(0) as u64))
        .collect())
}
