use crate::pricing::round2;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle (haversine) distance in kilometers, rounded to 2 decimals.
pub fn distance_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let (lat1, lon1, lat2, lon2) = (
        lat1.to_radians(),
        lon1.to_radians(),
        lat2.to_radians(),
        lon2.to_radians(),
    );
    let dlat = lat2 - lat1;
    let dlon = lon2 - lon1;

    let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    round2(EARTH_RADIUS_KM * c)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points() {
        assert_eq!(distance_km(28.6315, 77.2167, 28.6315, 77.2167), 0.0);
    }

    #[test]
    fn test_delhi_to_mumbai() {
        let d = distance_km(28.6315, 77.2167, 19.0822, 72.8880);
        assert!(d > 1150.0 && d < 1160.0, "got {d}");
    }

    #[test]
    fn test_symmetric() {
        let a = distance_km(12.9716, 77.5946, 13.0827, 80.2707);
        let b = distance_km(13.0827, 80.2707, 12.9716, 77.5946);
        assert_eq!(a, b);
    }
}
