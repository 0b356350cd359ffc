use geo::{Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use serde_json::Value;

use crate::models::{Feature, FeatureCollection, LatLng};

/// Earth radius used by Leaflet's `L.CRS.Earth`.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Padding applied to the boundary bounds before fitting the view.
pub const FIT_PAD: f64 = 0.015;
/// Padding applied to the boundary bounds for the pan limit.
pub const MAX_BOUNDS_PAD: f64 = 0.03;

/// Great-circle distance in meters, identical to `L.CRS.Earth.distance`.
pub fn distance(a: LatLng, b: LatLng) -> f64 {
    let rad = std::f64::consts::PI / 180.0;
    let lat1 = a.lat * rad;
    let lat2 = b.lat * rad;
    let sin_dlat = ((b.lat - a.lat) * rad / 2.0).sin();
    let sin_dlng = ((b.lng - a.lng) * rad / 2.0).sin();
    let h = sin_dlat * sin_dlat + lat1.cos() * lat2.cos() * sin_dlng * sin_dlng;
    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    EARTH_RADIUS_M * c
}

/// Inclusive radius test: a point exactly on the circle is inside.
pub fn within_radius(distance_m: f64, radius_km: f64) -> bool {
    distance_m <= radius_km * 1000.0
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLngBounds {
    pub south_west: LatLng,
    pub north_east: LatLng,
}

impl LatLngBounds {
    pub const fn new(south_west: LatLng, north_east: LatLng) -> Self {
        Self {
            south_west,
            north_east,
        }
    }

    /// Smallest bounds covering every point, or `None` when there are none.
    pub fn from_points(points: impl IntoIterator<Item = LatLng>) -> Option<Self> {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let mut bounds = Self::new(first, first);
        for p in iter {
            bounds.extend(p);
        }
        Some(bounds)
    }

    pub fn extend(&mut self, p: LatLng) {
        self.south_west.lat = self.south_west.lat.min(p.lat);
        self.south_west.lng = self.south_west.lng.min(p.lng);
        self.north_east.lat = self.north_east.lat.max(p.lat);
        self.north_east.lng = self.north_east.lng.max(p.lng);
    }

    /// Grows each side by `ratio` of the span, like `LatLngBounds.pad`.
    pub fn pad(&self, ratio: f64) -> Self {
        let lat_buf = (self.south_west.lat - self.north_east.lat).abs() * ratio;
        let lng_buf = (self.south_west.lng - self.north_east.lng).abs() * ratio;
        Self::new(
            LatLng::new(self.south_west.lat - lat_buf, self.south_west.lng - lng_buf),
            LatLng::new(self.north_east.lat + lat_buf, self.north_east.lng + lng_buf),
        )
    }

    pub fn center(&self) -> LatLng {
        LatLng::new(
            (self.south_west.lat + self.north_east.lat) / 2.0,
            (self.south_west.lng + self.north_east.lng) / 2.0,
        )
    }

    pub fn contains(&self, p: LatLng) -> bool {
        p.lat >= self.south_west.lat
            && p.lat <= self.north_east.lat
            && p.lng >= self.south_west.lng
            && p.lng <= self.north_east.lng
    }
}

/// Fallback view box used when the boundary file cannot be loaded.
pub const NEWARK_BOUNDS: LatLngBounds = LatLngBounds::new(
    LatLng::new(40.6737966266808, -74.2513883524854),
    LatLng::new(40.7882755927157, -74.1140973062534),
);

/// City outline used for point-in-boundary tests and view limits.
#[derive(Debug, Clone, PartialEq)]
pub struct BoundaryShape {
    polygons: MultiPolygon<f64>,
    bounds: LatLngBounds,
}

impl BoundaryShape {
    /// Reads a `Polygon` or `MultiPolygon` feature. Other geometries yield `None`.
    pub fn from_feature(feature: &Feature) -> Option<Self> {
        let geometry = feature.geometry.as_ref()?;
        let polygons: Vec<Polygon<f64>> = match geometry.kind.as_str() {
            "Polygon" => vec![polygon_from_rings(&geometry.coordinates)?],
            "MultiPolygon" => geometry
                .coordinates
                .as_array()?
                .iter()
                .filter_map(polygon_from_rings)
                .collect(),
            _ => return None,
        };
        let bounds = LatLngBounds::from_points(
            polygons
                .iter()
                .flat_map(|p| p.exterior().coords())
                .map(|c| LatLng::new(c.y, c.x)),
        )?;
        Some(Self {
            polygons: MultiPolygon::new(polygons),
            bounds,
        })
    }

    pub fn contains(&self, p: LatLng) -> bool {
        self.polygons.contains(&Point::new(p.lng, p.lat))
    }

    pub fn bounds(&self) -> LatLngBounds {
        self.bounds
    }
}

fn ring(value: &Value) -> Option<LineString<f64>> {
    let coords: Vec<Coord<f64>> = value
        .as_array()?
        .iter()
        .filter_map(|pos| {
            let pos = pos.as_array()?;
            Some(Coord {
                x: pos.first()?.as_f64()?,
                y: pos.get(1)?.as_f64()?,
            })
        })
        .collect();
    (coords.len() >= 3).then(|| LineString::new(coords))
}

fn polygon_from_rings(value: &Value) -> Option<Polygon<f64>> {
    let mut rings = value.as_array()?.iter().filter_map(ring);
    let exterior = rings.next()?;
    Some(Polygon::new(exterior, rings.collect()))
}

/// Finds the feature whose `NAME` property is "newark", ignoring case.
pub fn find_city_feature<'a>(collection: &'a FeatureCollection, name: &str) -> Option<&'a Feature> {
    collection.features.iter().find(|f| {
        f.text_property("NAME")
            .is_some_and(|n| n.eq_ignore_ascii_case(name))
    })
}
