//! Address lookup against a Nominatim-compatible geocoder

use std::time::Duration;

use serde::Deserialize;

use crate::{
    config::GeocodingConfig,
    error::{AppError, AppResult},
    models::library::GeoPoint,
};

#[derive(Debug, Deserialize)]
struct Place {
    lat: String,
    lon: String,
}

#[derive(Clone)]
pub struct GeocodingService {
    client: reqwest::Client,
    base_url: String,
}

impl GeocodingService {
    pub fn new(config: &GeocodingConfig) -> AppResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
        })
    }

    /// Best match for a free-text location
    pub async fn locate(&self, location: &str) -> AppResult<GeoPoint> {
        let places: Vec<Place> = self
            .client
            .get(format!("{}/search", self.base_url))
            .query(&[("q", location), ("format", "json"), ("limit", "1")])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        let place = places.into_iter().next().ok_or_else(|| {
            AppError::Validation(format!("Location could not be geocoded: {}", location))
        })?;

        let latitude = parse_coordinate(&place.lat)?;
        let longitude = parse_coordinate(&place.lon)?;
        let point = GeoPoint::new(latitude, longitude)?;

        tracing::debug!(location, latitude, longitude, "Location geocoded");
        Ok(point)
    }
}

fn parse_coordinate(value: &str) -> AppResult<f64> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| AppError::Upstream(format!("Geocoder returned invalid coordinate: {}", value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    fn service(base_url: &str) -> GeocodingService {
        GeocodingService::new(&GeocodingConfig {
            base_url: base_url.to_string(),
            user_agent: "libshare-tests".to_string(),
            timeout_seconds: 5,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_locate_returns_first_match() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/search")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("q".into(), "Alexanderplatz, Berlin".into()),
                Matcher::UrlEncoded("format".into(), "json".into()),
            ]))
            .match_header("user-agent", "libshare-tests")
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"lat": "52.5219", "lon": "13.4132", "display_name": "Alexanderplatz"}]"#)
            .create_async()
            .await;

        let point = service(&server.url()).locate("Alexanderplatz, Berlin").await.unwrap();

        mock.assert_async().await;
        assert_eq!(point, GeoPoint { latitude: 52.5219, longitude: 13.4132 });
    }

    #[tokio::test]
    async fn test_unknown_location_is_validation_error() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body("[]")
            .create_async()
            .await;

        let err = service(&server.url()).locate("nowhere at all").await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn test_garbage_coordinates_are_upstream_errors() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/search")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"[{"lat": "north", "lon": "13.4"}]"#)
            .create_async()
            .await;

        let err = service(&server.url()).locate("Berlin").await.unwrap_err();
        assert!(matches!(err, AppError::Upstream(_)));
    }

    #[test]
    fn test_parse_coordinate() {
        assert_eq!(parse_coordinate(" -33.86 ").unwrap(), -33.86);
        assert!(parse_coordinate("").is_err());
    }
}
