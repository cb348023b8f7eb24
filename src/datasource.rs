use crate::errors::DataError;
use crate::models::{Endpoint, RecordCollection};
use serde::Deserialize;
use serde_json::Value;
use std::{fmt, future::Future};
use tracing::info;

/// One dataset request. Requests with a city are scoped to the selection
/// that issued them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FetchRequest {
    pub endpoint: Endpoint,
    pub city: Option<String>,
}

impl FetchRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self { endpoint, city: None }
    }

    pub fn for_city(endpoint: Endpoint, city: impl Into<String>) -> Self {
        Self {
            endpoint,
            city: Some(city.into()),
        }
    }
}

impl fmt::Display for FetchRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.city {
            Some(city) => write!(f, "{}[{city}]", self.endpoint),
            None => write!(f, "{}", self.endpoint),
        }
    }
}

/// Where datasets come from. Every call is a single attempt.
pub trait DataSource: Send + Sync + 'static {
    fn fetch(
        &self,
        request: &FetchRequest,
    ) -> impl Future<Output = Result<RecordCollection, DataError>> + Send;
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    success: Option<bool>,
    #[serde(default)]
    error: Option<String>,
    data: Option<Vec<Value>>,
}

/// Parses a `{ "data": [...] }` body against the endpoint's schema.
pub fn parse_body(request: &FetchRequest, body: &[u8]) -> Result<RecordCollection, DataError> {
    let name = request.to_string();
    let envelope: Envelope =
        serde_json::from_slice(body).map_err(|err| DataError::schema(&name, err.to_string()))?;

    if envelope.success == Some(false) {
        let cause = envelope.error.unwrap_or_else(|| "backend reported failure".to_string());
        return Err(DataError::fetch(name, cause));
    }

    let rows = envelope
        .data
        .ok_or_else(|| DataError::schema(&name, "missing 'data' array"))?;
    RecordCollection::from_rows(name, &request.endpoint.required_fields(), rows)
}

#[derive(Debug, Clone)]
pub struct HttpDataSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpDataSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    pub fn url(&self, request: &FetchRequest) -> String {
        format!("{}{}", self.base_url, request.endpoint.path())
    }
}

impl DataSource for HttpDataSource {
    async fn fetch(&self, request: &FetchRequest) -> Result<RecordCollection, DataError> {
        let name = request.to_string();
        let mut call = self.client.get(self.url(request));
        if let Some(city) = &request.city {
            call = call.query(&[("city", city)]);
        }

        let response = call.send().await.map_err(|err| DataError::fetch(&name, err))?;
        let status = response.status();
        if !status.is_success() {
            return Err(DataError::fetch(name, format!("HTTP {status}")));
        }

        let body = response.bytes().await.map_err(|err| DataError::fetch(&name, err))?;
        let collection = parse_body(request, &body)?;
        info!("fetched {name}: {} rows", collection.len());
        Ok(collection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_with_table_schema_is_accepted() {
        let body = br#"{
            "schema": { "fields": [{ "name": "year" }], "primaryKey": ["year"] },
            "data": [{ "year": 2004, "searches": 10 }, { "year": 2005, "searches": 12 }]
        }"#;
        let collection = parse_body(&FetchRequest::new(Endpoint::SearchByYear), body).unwrap();
        assert_eq!(collection.len(), 2);
        assert_eq!(collection.source(), "searchbyyear");
    }

    #[test]
    fn empty_data_is_not_an_error() {
        let collection =
            parse_body(&FetchRequest::new(Endpoint::SearchByState), br#"{ "data": [] }"#).unwrap();
        assert!(collection.is_empty());
    }

    #[test]
    fn reported_failure_is_fetch_error() {
        let request = FetchRequest::for_city(Endpoint::SearchYearAndCondition, "Austin");
        let err = parse_body(&request, br#"{ "success": false, "error": "db down" }"#).unwrap_err();
        assert_eq!(
            err,
            DataError::fetch("searchyearandcondition[Austin]", "db down")
        );
    }

    #[test]
    fn unparseable_body_is_schema_error() {
        let err = parse_body(&FetchRequest::new(Endpoint::SearchByYear), b"<html>").unwrap_err();
        assert!(matches!(err, DataError::Schema { .. }));

        let err = parse_body(&FetchRequest::new(Endpoint::SearchByYear), b"{}").unwrap_err();
        assert!(err.to_string().contains("missing 'data'"));
    }

    #[test]
    fn url_joins_base_and_endpoint_path() {
        let source = HttpDataSource::new("http://backend:5000");
        assert_eq!(
            source.url(&FetchRequest::new(Endpoint::MostSearched)),
            "http://backend:5000/mostsserached"
        );
    }
}
