// Query string extractor that tolerates repeated keys.
//
// `axum::extract::Query` rejects `?itemId=a&itemId=b` with 400. Classroom and
// hand-edited links occasionally repeat a parameter, so here the first
// occurrence of each key wins and later ones are ignored.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use url::form_urlencoded;

use super::error::PageError;

#[derive(Debug)]
pub struct FirstValueQuery<T>(pub T);

impl<T: DeserializeOwned> FirstValueQuery<T> {
    pub fn from_query(query: Option<&str>) -> Result<Self, PageError> {
        let mut fields = Map::new();
        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            fields
                .entry(key.into_owned())
                .or_insert_with(|| Value::String(value.into_owned()));
        }

        serde_json::from_value(Value::Object(fields))
            .map(FirstValueQuery)
            .map_err(|e| PageError::bad_request(format!("Invalid query string: {}", e)))
    }
}

impl<T, S> FromRequestParts<S> for FirstValueQuery<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = PageError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Self::from_query(parts.uri.query())
    }
}
