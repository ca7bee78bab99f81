use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use sigmapcore::math::EARTH_RADIUS_KM;
use sigmapcore::record::{NewSignal, DEFAULT_RADIUS_KM};

/// (type, band start MHz, band end MHz)
const CATALOG: &[(&str, f64, f64)] = &[
    ("NFM", 144.0, 146.0),
    ("FM", 87.5, 108.0),
    ("AM", 118.0, 137.0),
    ("USB", 14.0, 14.35),
    ("DMR", 438.0, 440.0),
    ("TETRA", 380.0, 400.0),
    ("D-STAR", 430.0, 432.0),
    ("FT8", 7.074, 7.076),
    ("PACKET", 144.8, 144.8),
    ("CTU", 165.0, 170.0),
    ("unknown", 400.0, 470.0),
];

const CITIES: &[&str] = &["Praha", "Brno", "Ostrava", "Plzeň", "Olomouc", "Liberec"];

/// Knobs for a synthetic map dataset.
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub count: usize,
    pub seed: u64,
    pub center_lat: f64,
    pub center_lon: f64,
    pub spread_km: f64,
    /// Every n-th record lands a few metres from the previous one.
    pub cluster_every: usize,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            count: 40,
            seed: 0,
            center_lat: 49.8,
            center_lon: 15.5,
            spread_km: 150.0,
            cluster_every: 4,
        }
    }
}

fn offset(lat: f64, lon: f64, north_km: f64, east_km: f64) -> (f64, f64) {
    let km_per_degree = EARTH_RADIUS_KM.to_radians();
    let d_lat = north_km / km_per_degree;
    let d_lon = east_km / (km_per_degree * lat.to_radians().cos().max(1e-6));
    (lat + d_lat, lon + d_lon)
}

pub fn build_demo_signals(config: &GeneratorConfig, timestamp: i64) -> Vec<NewSignal> {
    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut signals: Vec<NewSignal> = Vec::with_capacity(config.count);

    for index in 0..config.count {
        let &(kind, low, high) = CATALOG.choose(&mut rng).unwrap_or(&CATALOG[0]);
        let frequency = if high > low {
            rng.gen_range(low..high)
        } else {
            low
        };
        let frequency = (frequency * 1000.0).round() / 1000.0;

        let clustered =
            config.cluster_every > 0 && index % config.cluster_every == config.cluster_every - 1;
        let (lat, lon, city) = match signals.last().filter(|_| clustered) {
            Some(previous) => {
                let (lat, lon) = offset(
                    previous.lat,
                    previous.lon,
                    rng.gen_range(-0.03..0.03),
                    rng.gen_range(-0.03..0.03),
                );
                (lat, lon, previous.city.clone())
            }
            None => {
                let spread = config.spread_km.max(0.001);
                let (lat, lon) = offset(
                    config.center_lat,
                    config.center_lon,
                    rng.gen_range(-spread..spread),
                    rng.gen_range(-spread..spread),
                );
                let city = CITIES.choose(&mut rng).copied().unwrap_or("Praha");
                (lat, lon, city.to_string())
            }
        };

        signals.push(NewSignal {
            frequency,
            city,
            description: format!("demo #{index}"),
            kind: kind.to_string(),
            color: None,
            lat,
            lon,
            radius_km: Some(rng.gen_range(1.0..=DEFAULT_RADIUS_KM * 2.0)),
            timestamp,
        });
    }

    signals
}
