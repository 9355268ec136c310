use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::regions::Region;

/// Raio médio da Terra em km (suficiente para erro típico de GPS;
/// correção elipsoidal não é necessária aqui).
const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Coordinates {
    #[validate(range(min = -90.0, max = 90.0, message = "latitude fora do intervalo"))]
    pub latitude: f64,
    #[validate(range(min = -180.0, max = 180.0, message = "longitude fora do intervalo"))]
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self { latitude, longitude }
    }
}

/// Distância de círculo máximo entre duas coordenadas, pela fórmula de
/// haversine. Simétrica e zero para pontos idênticos.
pub fn haversine_km(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lng = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + lat_a.cos() * lat_b.cos() * (d_lng / 2.0).sin().powi(2);
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * c
}

/// Média aritmética de latitude e longitude de todos os pontos.
/// Independente da ordem dos pontos; `None` para conjunto vazio.
pub fn centroid_of(points: &[Coordinates]) -> Option<Coordinates> {
    if points.is_empty() {
        return None;
    }
    let n = points.len() as f64;
    let (sum_lat, sum_lng) = points.iter().fold((0.0, 0.0), |(lat, lng), p| {
        (lat + p.latitude, lng + p.longitude)
    });
    Some(Coordinates::new(sum_lat / n, sum_lng / n))
}

/// Uma região candidata para um endereço, com a distância até o centróide.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegionMatch {
    pub region: Region,
    pub distance_km: f64,
}

/// Filtra as regiões cujo centróide está a no máximo `radius_km` (o raio
/// de CADA região, que pode divergir entre elas) e a no máximo `cap_km`
/// do ponto, ordenadas pela distância crescente. Lista vazia significa
/// que o chamador precisa criar uma região nova.
pub fn match_candidates(regions: &[Region], point: Coordinates, cap_km: f64) -> Vec<RegionMatch> {
    let mut matches: Vec<RegionMatch> = regions
        .iter()
        .filter_map(|region| {
            let distance_km = haversine_km(point, region.center());
            (distance_km <= region.radius_km && distance_km <= cap_km).then(|| RegionMatch {
                region: region.clone(),
                distance_km,
            })
        })
        .collect();
    matches.sort_by(|a, b| a.distance_km.total_cmp(&b.distance_km));
    matches
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn region_at(lat: f64, lng: f64, radius_km: f64) -> Region {
        Region {
            id: Uuid::new_v4(),
            tenant_id: Uuid::new_v4(),
            name: "teste".to_string(),
            center_lat: lat,
            center_lng: lng,
            radius_km,
            max_deliveries_per_day: 13,
        }
    }

    #[test]
    fn haversine_is_symmetric_and_zero_on_identity() {
        let brussels = Coordinates::new(50.8503, 4.3517);
        let antwerp = Coordinates::new(51.2194, 4.4025);

        assert_eq!(haversine_km(brussels, brussels), 0.0);
        let there = haversine_km(brussels, antwerp);
        let back = haversine_km(antwerp, brussels);
        assert!((there - back).abs() < 1e-9);
    }

    #[test]
    fn haversine_matches_known_distance() {
        // Paris -> Londres: ~343,5 km
        let paris = Coordinates::new(48.8566, 2.3522);
        let london = Coordinates::new(51.5074, -0.1278);

        let distance = haversine_km(paris, london);
        assert!((distance - 343.5).abs() < 5.0);
    }

    #[test]
    fn centroid_is_order_independent() {
        let p1 = Coordinates::new(50.0, 4.0);
        let p2 = Coordinates::new(51.0, 5.0);
        let p3 = Coordinates::new(52.0, 3.0);

        let a = centroid_of(&[p1, p2, p3]).unwrap();
        let b = centroid_of(&[p3, p1, p2]).unwrap();

        assert!((a.latitude - b.latitude).abs() < 1e-12);
        assert!((a.longitude - b.longitude).abs() < 1e-12);
        assert!((a.latitude - 51.0).abs() < 1e-12);
        assert!((a.longitude - 4.0).abs() < 1e-12);
    }

    #[test]
    fn appending_the_mean_keeps_the_mean() {
        let points = vec![
            Coordinates::new(50.0, 4.0),
            Coordinates::new(51.0, 5.0),
            Coordinates::new(52.0, 3.0),
        ];
        let mean = centroid_of(&points).unwrap();

        let mut extended = points.clone();
        extended.push(mean);
        let after = centroid_of(&extended).unwrap();

        assert!((after.latitude - mean.latitude).abs() < 1e-9);
        assert!((after.longitude - mean.longitude).abs() < 1e-9);
    }

    #[test]
    fn match_respects_each_regions_own_radius() {
        let near_small = region_at(50.85, 4.35, 5.0);
        let far_big = region_at(51.2194, 4.4025, 60.0);
        let point = Coordinates::new(50.86, 4.36);

        let matches = match_candidates(&[far_big.clone(), near_small.clone()], point, 100.0);
        assert_eq!(matches.len(), 2);
        // A região mais próxima vem primeiro, mesmo listada depois.
        assert_eq!(matches[0].region.id, near_small.id);
        assert!(matches[0].distance_km < matches[1].distance_km);
    }

    #[test]
    fn match_applies_search_cap_on_top_of_region_radius() {
        let big = region_at(51.2194, 4.4025, 60.0);
        let point = Coordinates::new(50.85, 4.35);

        assert_eq!(match_candidates(&[big.clone()], point, 10.0).len(), 0);
        assert_eq!(match_candidates(&[big], point, 100.0).len(), 1);
    }
}
