pub mod artists;
pub mod home;
pub mod search;
pub mod shows;
pub mod venues;

use serde::Serialize;

/// Id and display name of a venue or artist.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Listing {
    pub id: i32,
    pub name: String,
}
