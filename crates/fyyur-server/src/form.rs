//! Form decoding and field validation.
//!
//! Bodies are `application/x-www-form-urlencoded`. Repeated keys are kept in
//! order, which is how multi-select fields such as `genres` arrive.

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    response::{IntoResponse, Response},
};
use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::error::{ApiError, FieldError};

pub const GENRE_CHOICES: &[&str] = &[
    "Alternative",
    "Blues",
    "Classical",
    "Country",
    "Electronic",
    "Folk",
    "Funk",
    "Hip-Hop",
    "Heavy Metal",
    "Instrumental",
    "Jazz",
    "Musical Theatre",
    "Pop",
    "Punk",
    "R&B",
    "Reggae",
    "Rock n Roll",
    "Soul",
    "Other",
];

pub const STATE_CHOICES: &[&str] = &[
    "AL", "AK", "AZ", "AR", "CA", "CO", "CT", "DE", "DC", "FL", "GA", "HI", "ID", "IL", "IN",
    "IA", "KS", "KY", "LA", "ME", "MT", "NE", "NV", "NH", "NJ", "NM", "NY", "NC", "ND", "OH",
    "OK", "OR", "MD", "MA", "MI", "MN", "MS", "MO", "PA", "RI", "SC", "SD", "TN", "TX", "UT",
    "VT", "VA", "WA", "WV", "WI", "WY",
];

const REQUIRED: &str = "This field is required.";

static PHONE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9(][0-9 ().-]{5,18}[0-9]$").expect("phone regex"));

/// Select options served alongside every venue/artist form.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FormChoices {
    pub genres: &'static [&'static str],
    pub states: &'static [&'static str],
}

impl Default for FormChoices {
    fn default() -> Self {
        Self {
            genres: GENRE_CHOICES,
            states: STATE_CHOICES,
        }
    }
}

/// A decoded form body.
#[derive(Debug, Default, Clone)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn parse(body: &[u8]) -> Self {
        Self {
            pairs: url::form_urlencoded::parse(body).into_owned().collect(),
        }
    }

    /// First value submitted for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn get_all(&self, key: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }
}

impl<S> FromRequest<S> for FormData
where
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let body = Bytes::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(Self::parse(&body))
    }
}

/// Reads typed fields out of a [`FormData`], collecting every problem
/// instead of stopping at the first one.
pub struct FieldReader<'a> {
    form: &'a FormData,
    errors: Vec<FieldError>,
}

impl<'a> FieldReader<'a> {
    pub fn new(form: &'a FormData) -> Self {
        Self {
            form,
            errors: Vec::new(),
        }
    }

    fn reject(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError {
            field,
            message: message.into(),
        });
    }

    /// Trimmed, non-blank text.
    pub fn required(&mut self, field: &'static str) -> String {
        match self.optional(field) {
            Some(value) => value,
            None => {
                self.reject(field, REQUIRED);
                String::new()
            }
        }
    }

    /// Trimmed text; blank or missing becomes `None`.
    pub fn optional(&self, field: &'static str) -> Option<String> {
        self.form
            .get(field)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }

    /// Optional absolute http(s) URL.
    pub fn link(&mut self, field: &'static str) -> Option<String> {
        let value = self.optional(field)?;
        match url::Url::parse(&value) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => Some(value),
            _ => {
                self.reject(field, "Invalid URL.");
                None
            }
        }
    }

    pub fn phone(&mut self, field: &'static str) -> Option<String> {
        let value = self.optional(field)?;
        if PHONE_RE.is_match(&value) {
            Some(value)
        } else {
            self.reject(field, "Invalid phone number.");
            None
        }
    }

    /// Checkbox semantics: present with `y` (or `on`/`true`) means checked.
    pub fn checkbox(&self, field: &'static str) -> bool {
        matches!(
            self.form.get(field).map(|v| v.trim().to_ascii_lowercase()).as_deref(),
            Some("y" | "on" | "true")
        )
    }

    pub fn state(&mut self, field: &'static str) -> String {
        let value = self.required(field);
        if !value.is_empty() && !STATE_CHOICES.contains(&value.as_str()) {
            self.reject(field, "Not a valid choice.");
        }
        value
    }

    /// Multi-select genres; at least one, each from [`GENRE_CHOICES`].
    pub fn genres(&mut self, field: &'static str) -> Vec<String> {
        let values: Vec<String> = self
            .form
            .get_all(field)
            .into_iter()
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .collect();

        if values.is_empty() {
            self.reject(field, "Select at least one genre.");
        } else if let Some(bad) = values.iter().find(|g| !GENRE_CHOICES.contains(&g.as_str())) {
            self.reject(field, format!("'{bad}' is not a valid choice."));
        }
        values
    }

    pub fn id(&mut self, field: &'static str) -> i32 {
        let raw = self.required(field);
        if raw.is_empty() {
            return 0;
        }
        match raw.parse::<i32>() {
            Ok(id) if id > 0 => id,
            _ => {
                self.reject(field, "Not a valid id.");
                0
            }
        }
    }

    pub fn datetime(&mut self, field: &'static str) -> DateTime<FixedOffset> {
        let raw = self.required(field);
        if raw.is_empty() {
            return DateTime::<Utc>::MIN_UTC.fixed_offset();
        }
        match parse_datetime(&raw) {
            Some(at) => at,
            None => {
                self.reject(field, "Not a valid datetime value.");
                DateTime::<Utc>::MIN_UTC.fixed_offset()
            }
        }
    }

    /// Record an error found outside the reader, e.g. a missing foreign row.
    pub fn add_error(&mut self, field: &'static str, message: impl Into<String>) {
        self.reject(field, message);
    }

    /// `Ok(value)` when no field was rejected.
    pub fn finish<T>(self, value: T) -> Result<T, ApiError> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::Validation(self.errors))
        }
    }
}

/// Parse a submitted timestamp. Values without an offset are taken as UTC;
/// every result is normalized to UTC so stored values compare consistently.
pub fn parse_datetime(raw: &str) -> Option<DateTime<FixedOffset>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc).fixed_offset());
    }
    const NAIVE_FORMATS: [&str; 4] = [
        "%Y-%m-%d %H:%M:%S",
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%d %H:%M",
        "%Y-%m-%dT%H:%M",
    ];
    NAIVE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .map(|naive| naive.and_utc().fixed_offset())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn form(body: &str) -> FormData {
        FormData::parse(body.as_bytes())
    }

    #[test]
    fn test_parse_keeps_repeated_keys() {
        let data = form("genres=Jazz&genres=R%26B&name=The+Hop");
        assert_eq!(data.get_all("genres"), vec!["Jazz", "R&B"]);
        assert_eq!(data.get("name"), Some("The Hop"));
        assert_eq!(data.get("missing"), None);
    }

    #[test]
    fn test_required_rejects_blank() {
        let data = form("name=+++&city=Austin");
        let mut reader = FieldReader::new(&data);
        assert_eq!(reader.required("city"), "Austin");
        reader.required("name");
        let err = reader.finish(()).unwrap_err();
        match err {
            ApiError::Validation(fields) => {
                assert_eq!(fields.len(), 1);
                assert_eq!(fields[0].field, "name");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_optional_blank_is_none() {
        let data = form("phone=&facebook_link=+");
        let reader = FieldReader::new(&data);
        assert_eq!(reader.optional("phone"), None);
        assert_eq!(reader.optional("facebook_link"), None);
        assert_eq!(reader.optional("absent"), None);
    }

    #[test]
    fn test_checkbox_values() {
        let data = form("a=y&b=on&c=n&d=");
        let reader = FieldReader::new(&data);
        assert!(reader.checkbox("a"));
        assert!(reader.checkbox("b"));
        assert!(!reader.checkbox("c"));
        assert!(!reader.checkbox("d"));
        assert!(!reader.checkbox("e"));
    }

    #[test]
    fn test_link_requires_http_scheme() {
        let data = form("ok=https%3A%2F%2Fexample.com%2Fhop&bad=ftp%3A%2F%2Fexample.com&junk=not+a+url");
        let mut reader = FieldReader::new(&data);
        assert_eq!(reader.link("ok").as_deref(), Some("https://example.com/hop"));
        assert_eq!(reader.link("bad"), None);
        assert_eq!(reader.link("junk"), None);
        assert!(reader.finish(()).is_err());
    }

    #[test]
    fn test_phone_format() {
        let data = form("a=123-123-1234&b=%2B1+(415)+555-0100&c=call+me&d=(415)+555-0100&e=%2B(44)+20+7946+0958");
        let mut reader = FieldReader::new(&data);
        assert!(reader.phone("a").is_some());
        assert!(reader.phone("b").is_some());
        assert!(reader.phone("d").is_some());
        assert!(reader.phone("e").is_some());
        assert!(reader.phone("c").is_none());
        assert!(reader.finish(()).is_err());
    }

    #[test]
    fn test_genres_require_one_valid_choice() {
        let data = form("genres=Jazz&genres=Folk");
        let mut reader = FieldReader::new(&data);
        assert_eq!(reader.genres("genres"), vec!["Jazz", "Folk"]);
        assert!(reader.finish(()).is_ok());

        let empty = form("genres=");
        let mut reader = FieldReader::new(&empty);
        assert!(reader.genres("genres").is_empty());
        assert!(reader.finish(()).is_err());

        let unknown = form("genres=Polka");
        let mut reader = FieldReader::new(&unknown);
        reader.genres("genres");
        assert!(reader.finish(()).is_err());
    }

    #[test]
    fn test_state_must_be_a_choice() {
        let data = form("good=TX&bad=Texas");
        let mut reader = FieldReader::new(&data);
        assert_eq!(reader.state("good"), "TX");
        reader.state("bad");
        assert!(reader.finish(()).is_err());
    }

    #[test]
    fn test_id_parsing() {
        let data = form("a=12&b=zero&c=-3");
        let mut reader = FieldReader::new(&data);
        assert_eq!(reader.id("a"), 12);
        reader.id("b");
        reader.id("c");
        match reader.finish(()).unwrap_err() {
            ApiError::Validation(fields) => assert_eq!(fields.len(), 2),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_parse_datetime_formats() {
        let expected = Utc.with_ymd_and_hms(2035, 4, 1, 20, 0, 0).unwrap();
        for raw in [
            "2035-04-01 20:00:00",
            "2035-04-01T20:00:00",
            "2035-04-01T20:00",
            "2035-04-01T20:00:00Z",
            "2035-04-01T22:00:00+02:00",
        ] {
            let parsed = parse_datetime(raw).unwrap_or_else(|| panic!("failed on {raw}"));
            assert_eq!(parsed, expected, "{raw}");
            assert_eq!(parsed.offset().local_minus_utc(), 0, "{raw}");
        }
        assert!(parse_datetime("next tuesday").is_none());
    }
}
