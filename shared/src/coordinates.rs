use crate::models::Coordinate;

/// Centre of the default sampling grid (Mumbai).
pub const GRID_CENTER: (f64, f64) = (19.0760, 72.8777);
/// Half-width of the grid in degrees, roughly 50 km.
pub const GRID_RANGE: f64 = 0.5;
pub const GRID_POINTS_LAT: usize = 32;
pub const GRID_POINTS_LON: usize = 16;

#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    pub center: (f64, f64),
    pub lat_range: f64,
    pub lon_range: f64,
    pub points_lat: usize,
    pub points_lon: usize,
}

impl Default for Grid {
    fn default() -> Self {
        Grid {
            center: GRID_CENTER,
            lat_range: GRID_RANGE,
            lon_range: GRID_RANGE,
            points_lat: GRID_POINTS_LAT,
            points_lon: GRID_POINTS_LON,
        }
    }
}

impl Grid {
    /// Row-major lattice: every longitude for the first latitude, then the next.
    pub fn coordinates(&self) -> Vec<Coordinate> {
        let (lat, lon) = self.center;
        let lats = linspace(lat - self.lat_range, lat + self.lat_range, self.points_lat);
        let lons = linspace(lon - self.lon_range, lon + self.lon_range, self.points_lon);

        lats.iter()
            .flat_map(|lat| lons.iter().map(move |lon| Coordinate::unlabeled(*lat, *lon)))
            .collect()
    }
}

/// `n` evenly spaced values over `[start, end]`, both ends included.
pub fn linspace(start: f64, end: f64, n: usize) -> Vec<f64> {
    match n {
        0 => vec![],
        1 => vec![start],
        _ => {
            let step = (end - start) / (n - 1) as f64;
            (0..n)
                .map(|i| if i == n - 1 { end } else { start + step * i as f64 })
                .collect()
        }
    }
}

pub fn landmarks() -> Vec<Coordinate> {
    vec![
        Coordinate::new("Gateway of India", 18.9219, 72.8347),
        Coordinate::new("Marine Drive", 18.9388, 72.8231),
        Coordinate::new("Bandra-Worli Sea Link", 19.0300, 72.8347),
        Coordinate::new("Chhatrapati Shivaji Maharaj Terminus", 18.9400, 72.8350),
        Coordinate::new("Elephanta Caves", 18.9276, 72.9398),
        Coordinate::new("Vasai", 19.3753, 72.8333),
        Coordinate::new("Andheri", 19.0993, 72.8347),
        Coordinate::new("Dadar", 19.0187, 72.8498),
        Coordinate::new("Mira Road", 19.2974, 72.8508),
        Coordinate::new("Bhayandar", 19.2853, 72.8555),
        Coordinate::new("Kandivali", 19.2144, 72.8492),
        Coordinate::new("Mulund", 19.1890, 72.9262),
        Coordinate::new("Borivali", 19.2875, 72.8582),
        Coordinate::new("Goregaon", 19.1640, 72.8499),
        Coordinate::new("Versova", 19.0980, 72.8282),
        Coordinate::new("Malad", 19.1802, 72.8349),
        Coordinate::new("Worli", 18.9940, 72.8268),
        Coordinate::new("Juhu", 19.0976, 72.8263),
    ]
}
