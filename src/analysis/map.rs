//! Map projection: crash points for a set of municipalities, colored per municipality.

use super::AnalysisError;
use crate::data::CrashTable;
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// RGB color triple.
pub type Rgb = [u8; 3];

/// Initial zoom level for the map view.
pub const DEFAULT_MAP_ZOOM: f64 = 10.0;

/// Base palette, used as-is while the selection fits in it.
const PALETTE: [Rgb; 10] = [
    [231, 76, 60],  // Red
    [46, 204, 113], // Green
    [155, 89, 182], // Purple
    [243, 156, 18], // Orange
    [26, 188, 156], // Teal
    [233, 30, 99],  // Pink
    [0, 188, 212],  // Cyan
    [255, 87, 34],  // Deep Orange
    [121, 85, 72],  // Brown
    [52, 152, 219], // Blue
];

/// A single crash location on the map.
#[derive(Debug, Clone, PartialEq)]
pub struct MapPoint {
    pub id: i64,
    pub municipality: String,
    pub latitude: f64,
    pub longitude: f64,
    pub roadway: Option<String>,
    pub color: Rgb,
}

impl MapPoint {
    pub fn tooltip(&self) -> String {
        format!(
            "Crash Location: {}, {}\nRoadway: {}",
            self.latitude,
            self.longitude,
            self.roadway.as_deref().unwrap_or("-")
        )
    }
}

/// Points to plot plus the view center.
#[derive(Debug, Clone, PartialEq)]
pub struct MapProjection {
    pub center_latitude: f64,
    pub center_longitude: f64,
    pub zoom: f64,
    pub points: Vec<MapPoint>,
    /// Municipality colors, ascending by name, for those with at least one point.
    pub legend: Vec<(String, Rgb)>,
}

/// Project the crashes of the selected municipalities onto the map.
///
/// Rows without valid coordinates are left out of both the points and the
/// center mean. Returns [`AnalysisError::EmptySelection`] when nothing is
/// left to plot.
pub fn project(
    table: &CrashTable,
    municipalities: &BTreeSet<String>,
) -> Result<MapProjection, AnalysisError> {
    if municipalities.is_empty() {
        return Err(AnalysisError::EmptySelection);
    }

    let colors = assign_colors(municipalities);

    let points: Vec<MapPoint> = table
        .records()
        .iter()
        .filter_map(|record| {
            let city = record.municipality.as_ref()?;
            let color = *colors.get(city.as_str())?;
            let (latitude, longitude) = record.coordinates()?;
            Some(MapPoint {
                id: record.id,
                municipality: city.clone(),
                latitude,
                longitude,
                roadway: record.roadway.clone(),
                color,
            })
        })
        .collect();

    if points.is_empty() {
        return Err(AnalysisError::EmptySelection);
    }

    let n = points.len() as f64;
    let center_latitude = points.iter().map(|p| p.latitude).sum::<f64>() / n;
    let center_longitude = points.iter().map(|p| p.longitude).sum::<f64>() / n;

    let plotted: BTreeSet<&str> = points.iter().map(|p| p.municipality.as_str()).collect();
    let legend = colors
        .iter()
        .filter(|(city, _)| plotted.contains(*city))
        .map(|(city, color)| (city.to_string(), *color))
        .collect();

    Ok(MapProjection {
        center_latitude,
        center_longitude,
        zoom: DEFAULT_MAP_ZOOM,
        points,
        legend,
    })
}

/// Index-based colors over the names in ascending order, distinct within the call.
fn assign_colors(municipalities: &BTreeSet<String>) -> BTreeMap<&str, Rgb> {
    let total = municipalities.len();
    let mut used: HashSet<Rgb> = HashSet::with_capacity(total);

    municipalities
        .iter()
        .enumerate()
        .map(|(i, city)| {
            let mut color = if total <= PALETTE.len() {
                PALETTE[i]
            } else {
                hsv_to_rgb(i as f64 / total as f64 * 360.0, 0.65, 0.9)
            };
            while !used.insert(color) {
                color = next_color(color);
            }
            (city.as_str(), color)
        })
        .collect()
}

/// Step to the adjacent 24-bit color.
fn next_color([r, g, b]: Rgb) -> Rgb {
    let packed = (u32::from(r) << 16 | u32::from(g) << 8 | u32::from(b)).wrapping_add(1) & 0xFF_FFFF;
    [(packed >> 16) as u8, (packed >> 8) as u8, packed as u8]
}

fn hsv_to_rgb(hue: f64, saturation: f64, value: f64) -> Rgb {
    let c = value * saturation;
    let h = (hue % 360.0) / 60.0;
    let x = c * (1.0 - (h % 2.0 - 1.0).abs());
    let (r, g, b) = match h as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = value - c;
    let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
    [channel(r), channel(g), channel(b)]
}
