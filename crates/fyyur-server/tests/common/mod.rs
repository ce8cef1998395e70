// Shared test utilities for integration tests
#![allow(dead_code)]

use axum_test::TestServer;
use fyyur_db::entities::{artist, venue};
use fyyur_db::{AppState, DatabaseConfig};
use fyyur_server::config::ServerConfig;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use sea_orm_migration::MigratorTrait;
use std::sync::Arc;

/// AppState backed by a fresh, migrated in-memory SQLite database
pub async fn test_app_state() -> Arc<AppState> {
    let db = fyyur_db::connect(&DatabaseConfig::in_memory())
        .await
        .expect("failed to open in-memory database");
    fyyur_migration::Migrator::up(&db, None)
        .await
        .expect("failed to run migrations");
    Arc::new(AppState { db })
}

pub async fn test_server() -> (TestServer, Arc<AppState>) {
    let state = test_app_state().await;
    let app = fyyur_server::app(state.clone(), &ServerConfig::default());
    let server = TestServer::new(app).expect("failed to start test server");
    (server, state)
}

pub type Form = Vec<(&'static str, String)>;

pub fn venue_form(name: &str, city: &str, state: &str) -> Form {
    vec![
        ("name", name.to_string()),
        ("genres", "Jazz".to_string()),
        ("genres", "Folk".to_string()),
        ("city", city.to_string()),
        ("state", state.to_string()),
        ("address", "1015 Folsom Street".to_string()),
        ("phone", "123-123-1234".to_string()),
        ("website_link", "https://www.example.com".to_string()),
        ("image_link", "https://images.example.com/venue.jpg".to_string()),
        ("facebook_link", "https://www.facebook.com/example".to_string()),
        ("seeking_talent", "y".to_string()),
        ("seeking_description", "Looking for local jazz acts.".to_string()),
    ]
}

pub fn artist_form(name: &str, city: &str, state: &str) -> Form {
    vec![
        ("name", name.to_string()),
        ("genres", "Rock n Roll".to_string()),
        ("city", city.to_string()),
        ("state", state.to_string()),
        ("phone", "326-123-5000".to_string()),
        ("website_link", "https://www.example.com/band".to_string()),
        ("image_link", "https://images.example.com/artist.jpg".to_string()),
        ("facebook_link", "".to_string()),
        ("seeking_venue", "y".to_string()),
        ("seeking_description", "Looking for shows!".to_string()),
    ]
}

pub fn show_form(artist_id: i32, venue_id: i32, start_time: &str) -> Form {
    vec![
        ("artist_id", artist_id.to_string()),
        ("venue_id", venue_id.to_string()),
        ("start_time", start_time.to_string()),
    ]
}

pub async fn venue_id(state: &AppState, name: &str) -> i32 {
    venue::Entity::find()
        .filter(venue::Column::Name.eq(name))
        .one(&state.db)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("no venue named {name}"))
        .id
}

pub async fn artist_id(state: &AppState, name: &str) -> i32 {
    artist::Entity::find()
        .filter(artist::Column::Name.eq(name))
        .one(&state.db)
        .await
        .unwrap()
        .unwrap_or_else(|| panic!("no artist named {name}"))
        .id
}
