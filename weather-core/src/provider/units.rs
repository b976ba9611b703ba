//! Imperial to metric conversions used for station readings.

const KMH_PER_MPH: f64 = 1.609344;
const MB_PER_INHG: f64 = 33.8639;

/// Round to one decimal place.
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn fahrenheit_to_celsius(f: f64) -> f64 {
    round1((f - 32.0) * 5.0 / 9.0)
}

pub fn mph_to_kmh(mph: f64) -> f64 {
    round1(mph * KMH_PER_MPH)
}

pub fn inhg_to_mb(inhg: f64) -> f64 {
    round1(inhg * MB_PER_INHG)
}

pub fn miles_to_km(miles: f64) -> f64 {
    round1(miles * KMH_PER_MPH)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_fahrenheit() {
        assert_eq!(fahrenheit_to_celsius(32.0), 0.0);
        assert_eq!(fahrenheit_to_celsius(212.0), 100.0);
        assert_eq!(fahrenheit_to_celsius(76.1), 24.5);
        assert_eq!(fahrenheit_to_celsius(-40.0), -40.0);
    }

    #[test]
    fn converts_wind_and_pressure() {
        assert_eq!(mph_to_kmh(10.0), 16.1);
        assert_eq!(mph_to_kmh(0.0), 0.0);
        assert_eq!(inhg_to_mb(29.97), 1014.9);
        assert_eq!(miles_to_km(6.2), 10.0);
    }
}
