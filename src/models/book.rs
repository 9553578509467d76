//! Book model and related request/query types.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{postgres::PgTypeInfo, Decode, Encode, FromRow, Postgres};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{AppError, AppResult, FieldError};

/// Earliest accepted publication year
pub const MIN_PUBLISHED_YEAR: i64 = 1000;

/// Wire names of the user-editable fields, in reporting order
const FIELD_ORDER: [&str; 5] = ["title", "author", "genre", "publishedYear", "status"];

/// Circulation status of a book
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
pub enum BookStatus {
    Available,
    Issued,
}

impl BookStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BookStatus::Available => "Available",
            BookStatus::Issued => "Issued",
        }
    }
}

impl FromStr for BookStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Available" => Ok(BookStatus::Available),
            "Issued" => Ok(BookStatus::Issued),
            _ => Err(format!("Invalid book status: {}", s)),
        }
    }
}

impl fmt::Display for BookStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Stored as TEXT constrained to the two wire values
impl sqlx::Type<Postgres> for BookStatus {
    fn type_info() -> PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for BookStatus {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for BookStatus {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// Book record as stored and returned by the API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    pub id: Uuid,
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: i32,
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated field set used for inserts and wholesale updates
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub genre: String,
    pub published_year: i32,
    pub status: BookStatus,
}

/// Create/update request body.
///
/// Every field is optional at the deserialization level so that missing or
/// malformed values are reported together as field-level validation errors
/// instead of a body rejection.
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPayload {
    #[schema(value_type = Option<String>)]
    pub title: Option<serde_json::Value>,
    #[schema(value_type = Option<String>)]
    pub author: Option<serde_json::Value>,
    #[schema(value_type = Option<String>)]
    pub genre: Option<serde_json::Value>,
    /// Integer year, or a string holding one
    #[schema(value_type = Option<i32>)]
    pub published_year: Option<serde_json::Value>,
    /// `Available` or `Issued`
    #[schema(value_type = Option<String>)]
    pub status: Option<serde_json::Value>,
}

impl From<&NewBook> for BookPayload {
    fn from(book: &NewBook) -> Self {
        Self {
            title: Some(book.title.as_str().into()),
            author: Some(book.author.as_str().into()),
            genre: Some(book.genre.as_str().into()),
            published_year: Some(book.published_year.into()),
            status: Some(book.status.as_str().into()),
        }
    }
}

/// Trimmed text of a string value; blanks and non-strings count as missing
fn non_blank(value: &Option<serde_json::Value>) -> Option<String> {
    value
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn status_value(value: &Option<serde_json::Value>) -> Option<BookStatus> {
    value
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse().ok())
}

/// Whole-number year from a JSON number (`1965`, `1965.0`) or numeric string
fn year_value(value: &serde_json::Value) -> Option<i64> {
    match value {
        serde_json::Value::Number(n) => n.as_i64().or_else(|| {
            n.as_f64()
                .filter(|f| f.fract() == 0.0 && f.abs() <= i64::MAX as f64)
                .map(|f| f as i64)
        }),
        serde_json::Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn field_error(code: &'static str, message: String) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Owned(message));
    error
}

/// Current calendar year, the upper bound for `publishedYear`
pub fn current_year() -> i64 {
    i64::from(Utc::now().year())
}

impl Validate for BookPayload {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if non_blank(&self.title).is_none() {
            errors.add("title", field_error("required", "Title is required".into()));
        }
        if non_blank(&self.author).is_none() {
            errors.add("author", field_error("required", "Author is required".into()));
        }
        if non_blank(&self.genre).is_none() {
            errors.add("genre", field_error("required", "Genre is required".into()));
        }

        let max_year = current_year();
        let year_ok = self
            .published_year
            .as_ref()
            .and_then(year_value)
            .is_some_and(|y| (MIN_PUBLISHED_YEAR..=max_year).contains(&y));
        if !year_ok {
            errors.add(
                "publishedYear",
                field_error(
                    "range",
                    format!(
                        "Published year must be between {} and {}",
                        MIN_PUBLISHED_YEAR, max_year
                    ),
                ),
            );
        }

        if status_value(&self.status).is_none() {
            errors.add(
                "status",
                field_error("enum", "Status must be either Available or Issued".into()),
            );
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Flatten validator errors into wire-ordered field errors
pub fn field_errors(errors: &ValidationErrors) -> Vec<FieldError> {
    let mut details: Vec<FieldError> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            let field = field.to_string();
            errs.iter()
                .map(move |e| {
                    let message = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string());
                    FieldError::new(field.clone(), message)
                })
                .collect::<Vec<_>>()
        })
        .collect();

    details.sort_by_key(|d| {
        FIELD_ORDER
            .iter()
            .position(|f| *f == d.field)
            .unwrap_or(FIELD_ORDER.len())
    });
    details
}

impl BookPayload {
    /// Validate every field and convert into a complete record
    pub fn into_new_book(self) -> AppResult<NewBook> {
        self.validate()
            .map_err(|e| AppError::Validation(field_errors(&e)))?;

        let invalid = || AppError::Internal("Validated payload is incomplete".to_string());

        let published_year = self
            .published_year
            .as_ref()
            .and_then(year_value)
            .and_then(|y| i32::try_from(y).ok())
            .ok_or_else(invalid)?;
        let status = status_value(&self.status).ok_or_else(invalid)?;

        Ok(NewBook {
            title: non_blank(&self.title).ok_or_else(invalid)?,
            author: non_blank(&self.author).ok_or_else(invalid)?,
            genre: non_blank(&self.genre).ok_or_else(invalid)?,
            published_year,
            status,
        })
    }
}

/// Query parameters for listing books
#[derive(Debug, Clone, Default, Serialize, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BookQuery {
    /// Page number (1-based, default: 1)
    pub page: Option<i64>,
    /// Books per page (default: 10)
    pub limit: Option<i64>,
    /// Case-insensitive substring matched against title or author
    pub search: Option<String>,
    /// Exact genre
    pub genre: Option<String>,
    /// `Available` or `Issued`
    pub status: Option<String>,
}

/// Normalised list filter; `None` imposes no constraint
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    pub search: Option<String>,
    pub genre: Option<String>,
    pub status: Option<BookStatus>,
}

impl BookFilter {
    pub fn from_query(query: &BookQuery) -> AppResult<Self> {
        let non_empty = |v: &Option<String>| v.clone().filter(|s| !s.is_empty());

        let status = match non_empty(&query.status) {
            Some(s) => Some(s.parse::<BookStatus>().map_err(|_| {
                AppError::Validation(vec![FieldError::new(
                    "status",
                    "Status must be either Available or Issued",
                )])
            })?),
            None => None,
        };

        Ok(Self {
            search: non_empty(&query.search),
            genre: non_empty(&query.genre),
            status,
        })
    }

    /// Whether a record satisfies every active predicate
    pub fn matches(&self, book: &Book) -> bool {
        let search_ok = self.search.as_ref().map_or(true, |needle| {
            let needle = needle.to_lowercase();
            book.title.to_lowercase().contains(&needle)
                || book.author.to_lowercase().contains(&needle)
        });
        let genre_ok = self.genre.as_ref().map_or(true, |g| &book.genre == g);
        let status_ok = self.status.map_or(true, |s| book.status == s);

        search_ok && genre_ok && status_ok
    }
}

/// One page of books plus totals
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BookPage {
    pub data: Vec<Book>,
    /// Number of books matching the filter across all pages
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    /// `ceil(total / limit)`; zero when nothing matches
    pub total_pages: i64,
}

impl BookPage {
    pub fn new(data: Vec<Book>, total: i64, page: i64, limit: i64) -> Self {
        Self {
            data,
            total,
            page,
            limit,
            total_pages: total_pages(total, limit),
        }
    }
}

pub fn total_pages(total: i64, limit: i64) -> i64 {
    if limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

/// Parse a path id; anything that is not a UUID cannot name a book
pub fn parse_book_id(raw: &str) -> AppResult<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::book_not_found())
}
