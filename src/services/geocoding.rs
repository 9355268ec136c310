// src/services/geocoding.rs

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::common::error::AppError;
use crate::common::geo::Coordinates;

/// Serviço externo de geocodificação: texto de endereço -> coordenadas.
/// Falível e opcional; a seleção manual de região é sempre um caminho
/// válido quando ele está fora do ar ou não configurado.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn geocode(&self, address: &str) -> Result<Coordinates, AppError>;
}

#[derive(Debug, Deserialize)]
struct MapboxResponse {
    features: Vec<MapboxFeature>,
}

#[derive(Debug, Deserialize)]
struct MapboxFeature {
    // Mapbox devolve [lng, lat]
    center: Vec<f64>,
}

#[derive(Clone)]
pub struct MapboxGeocoder {
    client: reqwest::Client,
    token: String,
}

impl MapboxGeocoder {
    pub fn new(token: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            token,
        }
    }
}

#[async_trait]
impl Geocoder for MapboxGeocoder {
    async fn geocode(&self, address: &str) -> Result<Coordinates, AppError> {
        let url = format!("https://api.mapbox.com/geocoding/v5/mapbox.places/{address}.json");

        let response = self
            .client
            .get(&url)
            .query(&[("access_token", self.token.as_str()), ("limit", "1")])
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map_err(|e| AppError::GeocodingError(e.to_string()))?
            .error_for_status()
            .map_err(|e| AppError::GeocodingError(e.to_string()))?;

        let body: MapboxResponse = response
            .json()
            .await
            .map_err(|e| AppError::GeocodingError(e.to_string()))?;

        let feature = body
            .features
            .first()
            .ok_or_else(|| AppError::GeocodingError("endereço não encontrado".to_string()))?;

        match feature.center.as_slice() {
            [lng, lat] => Ok(Coordinates::new(*lat, *lng)),
            _ => Err(AppError::GeocodingError(
                "resposta de geocodificação inesperada".to_string(),
            )),
        }
    }
}
