mod common;

use axum::http::StatusCode;
use common::*;
use serde_json::Value;

#[tokio::test]
async fn create_artist_redirects_home_and_lists() {
    let (server, _state) = test_server().await;

    let response = server
        .post("/artists/create")
        .form(&artist_form("Guns N Petals", "San Francisco", "CA"))
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), "/");

    server
        .post("/artists/create")
        .form(&artist_form("Matt Quevedo", "New York", "NY"))
        .await;

    let artists: Value = server.get("/artists").await.json();
    assert_eq!(artists[0]["name"], "Guns N Petals");
    assert_eq!(artists[1]["name"], "Matt Quevedo");
    assert!(artists[1]["id"].as_i64().unwrap() > artists[0]["id"].as_i64().unwrap());
}

#[tokio::test]
async fn duplicate_artist_name_is_rejected() {
    let (server, _state) = test_server().await;

    server
        .post("/artists/create")
        .form(&artist_form("Guns N Petals", "San Francisco", "CA"))
        .await;
    let response = server
        .post("/artists/create")
        .form(&artist_form("Guns N Petals", "Oakland", "CA"))
        .await;

    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(response.json::<Value>()["error"], "already_exists");

    let artists: Value = server.get("/artists").await.json();
    assert_eq!(artists.as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_choices_are_reported() {
    let (server, _state) = test_server().await;

    let mut form = artist_form("Guns N Petals", "San Francisco", "ZZ");
    form.push(("genres", "Polka".to_string()));
    form.retain(|(k, _)| *k != "phone");
    form.push(("phone", "call me".to_string()));

    let response = server.post("/artists/create").form(&form).await;
    assert_eq!(response.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    let body: Value = response.json();
    assert_eq!(body["error"], "validation");
    let fields: Vec<&str> = body["fields"]
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["genres", "state", "phone"]);
}

#[tokio::test]
async fn artist_detail_partitions_shows() {
    let (server, state) = test_server().await;

    server
        .post("/artists/create")
        .form(&artist_form("The Wild Sax Band", "San Francisco", "CA"))
        .await;
    server
        .post("/venues/create")
        .form(&venue_form("Park Square Live Music & Coffee", "San Francisco", "CA"))
        .await;
    let sax = artist_id(&state, "The Wild Sax Band").await;
    let park = venue_id(&state, "Park Square Live Music & Coffee").await;

    for start in [
        "2099-04-15T20:00:00Z",
        "2099-04-01T20:00:00Z",
        "2019-06-15T23:00:00Z",
    ] {
        let response = server
            .post("/shows/create")
            .form(&show_form(sax, park, start))
            .await;
        assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    }

    let detail: Value = server.get(&format!("/artists/{sax}")).await.json();
    assert_eq!(detail["name"], "The Wild Sax Band");
    assert_eq!(detail["genres"], serde_json::json!(["Rock n Roll"]));
    assert_eq!(detail["upcoming_shows_count"], 2);
    assert_eq!(detail["past_shows_count"], 1);
    assert_eq!(
        detail["upcoming_shows"][0]["start_time"],
        "2099-04-01T20:00:00Z"
    );
    assert_eq!(
        detail["upcoming_shows"][0]["venue_name"],
        "Park Square Live Music & Coffee"
    );
    assert_eq!(detail["past_shows"][0]["venue_id"], park);
}

#[tokio::test]
async fn missing_artist_is_not_found() {
    let (server, _state) = test_server().await;

    let response = server.get("/artists/42").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
    assert_eq!(response.json::<Value>()["error"], "not_found");

    let response = server.get("/artists/42/edit").await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);

    let response = server
        .post("/artists/42/edit")
        .form(&artist_form("Nobody", "Austin", "TX"))
        .await;
    assert_eq!(response.status_code(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn edit_artist_overwrites_fields() {
    let (server, state) = test_server().await;

    server
        .post("/artists/create")
        .form(&artist_form("Matt Quevedo", "New York", "NY"))
        .await;
    let id = artist_id(&state, "Matt Quevedo").await;

    let before: Value = server.get(&format!("/artists/{id}/edit")).await.json();
    assert_eq!(before["artist"]["city"], "New York");
    assert_eq!(before["artist"]["seeking_venue"], true);
    assert!(!before["choices"]["genres"].as_array().unwrap().is_empty());

    let response = server
        .post(&format!("/artists/{id}/edit"))
        .form(&[
            ("name", "Matt Quevedo Trio"),
            ("genres", "Jazz"),
            ("genres", "Soul"),
            ("city", "Seattle"),
            ("state", "WA"),
        ])
        .await;
    assert_eq!(response.status_code(), StatusCode::SEE_OTHER);
    assert_eq!(response.header("location"), format!("/artists/{id}").as_str());

    let after: Value = server.get(&format!("/artists/{id}")).await.json();
    assert_eq!(after["name"], "Matt Quevedo Trio");
    assert_eq!(after["genres"], serde_json::json!(["Jazz", "Soul"]));
    assert_eq!(after["state"], "WA");
    assert_eq!(after["seeking_venue"], false);
    assert!(after["phone"].is_null());
    assert!(after["seeking_description"].is_null());
}

#[tokio::test]
async fn artist_create_form_lists_choices() {
    let (server, _state) = test_server().await;

    let form: Value = server.get("/artists/create").await.json();
    assert!(form["artist"].is_null());
    let states = form["choices"]["states"].as_array().unwrap();
    assert!(states.iter().any(|s| s == "CA"));
}
