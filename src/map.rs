//! Map view handed to the rendering widget.
//!
//! Records sharing a location are grouped into one marker; each marker
//! carries a tooltip and a popup. Radius lookups also carry the search
//! polygon. The whole view serializes to GeoJSON-like JSON.

use geo::Polygon;
use hashbrown::HashMap;
use serde::Serialize;

use crate::lookup::LookupOutcome;
use crate::models::{Coordinate, Record};

/// Center used when a lookup yields no location
pub const DEFAULT_CENTER: Coordinate = Coordinate {
    lat: 32.1602,
    lon: 34.8097,
};

pub const DEFAULT_ZOOM: u8 = 16;

/// Rows listed in a multi-record popup
pub const POPUP_MAX_ROWS: usize = 15;

/// Records at one exact location
#[derive(Debug, Clone)]
pub struct MarkerGroup {
    pub position: Coordinate,
    pub records: Vec<Record>,
}

impl MarkerGroup {
    pub fn tooltip(&self) -> String {
        format!("Click for Details ({} entries)", self.records.len())
    }

    pub fn popup(&self) -> Popup {
        match self.records.as_slice() {
            [single] => Popup::Single {
                row: PopupRow::from(single),
                coordinates: [single.lat, single.lon],
            },
            records => {
                let rows: Vec<PopupRow> = records
                    .iter()
                    .take(POPUP_MAX_ROWS)
                    .map(PopupRow::from)
                    .collect();
                Popup::Multiple {
                    title: format!(
                        "Multiple Entries at this Location: (showing {} of {})",
                        rows.len(),
                        records.len()
                    ),
                    shown: rows.len(),
                    total: records.len(),
                    truncated: records.len() > POPUP_MAX_ROWS,
                    rows,
                }
            }
        }
    }
}

/// Group records by exact (lat, lon), keeping first-seen order.
pub fn group_markers(records: &[Record]) -> Vec<MarkerGroup> {
    let mut slots: HashMap<(u64, u64), usize> = HashMap::new();
    let mut groups: Vec<MarkerGroup> = Vec::new();

    for r in records {
        let key = (r.lat.to_bits(), r.lon.to_bits());
        match slots.get(&key) {
            Some(&slot) => groups[slot].records.push(r.clone()),
            None => {
                slots.insert(key, groups.len());
                groups.push(MarkerGroup {
                    position: Coordinate::new(r.lat, r.lon),
                    records: vec![r.clone()],
                });
            }
        }
    }

    groups
}

/// One line of a popup table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PopupRow {
    pub name: String,
    pub id: i64,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub city: Option<String>,
}

impl From<&Record> for PopupRow {
    fn from(r: &Record) -> Self {
        Self {
            name: r.full_name(),
            id: r.id,
            phone: r.phone.clone(),
            street: r.street_name.clone(),
            city: r.city.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Popup {
    Single {
        row: PopupRow,
        /// [lat, lon]
        coordinates: [f64; 2],
    },
    Multiple {
        title: String,
        shown: usize,
        total: usize,
        /// Only the first [`POPUP_MAX_ROWS`] records are listed
        truncated: bool,
        rows: Vec<PopupRow>,
    },
}

#[derive(Debug, Serialize)]
pub struct PointGeometry {
    #[serde(rename = "type")]
    pub geo_type: &'static str,
    /// [lon, lat]
    pub coordinates: [f64; 2],
}

#[derive(Debug, Serialize)]
pub struct MarkerProperties {
    pub count: usize,
    pub tooltip: String,
    pub popup: Popup,
}

#[derive(Debug, Serialize)]
pub struct MarkerFeature {
    #[serde(rename = "type")]
    pub feature_type: &'static str,
    pub geometry: PointGeometry,
    pub properties: MarkerProperties,
}

impl From<&MarkerGroup> for MarkerFeature {
    fn from(group: &MarkerGroup) -> Self {
        Self {
            feature_type: "Feature",
            geometry: PointGeometry {
                geo_type: "Point",
                coordinates: [group.position.lon, group.position.lat],
            },
            properties: MarkerProperties {
                count: group.records.len(),
                tooltip: group.tooltip(),
                popup: group.popup(),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub collection_type: &'static str,
    pub features: Vec<MarkerFeature>,
}

#[derive(Debug, Serialize)]
pub struct PolygonGeometry {
    #[serde(rename = "type")]
    pub geo_type: &'static str,
    /// Exterior ring then holes, each as [lon, lat] pairs
    pub coordinates: Vec<Vec<[f64; 2]>>,
}

impl From<&Polygon<f64>> for PolygonGeometry {
    fn from(polygon: &Polygon<f64>) -> Self {
        let ring = |ls: &geo::LineString<f64>| -> Vec<[f64; 2]> {
            ls.coords().map(|c| [c.x, c.y]).collect()
        };
        let mut coordinates = vec![ring(polygon.exterior())];
        coordinates.extend(polygon.interiors().iter().map(ring));
        Self {
            geo_type: "Polygon",
            coordinates,
        }
    }
}

/// Drawing hints for the search polygon
#[derive(Debug, Serialize)]
pub struct AreaStyle {
    pub name: &'static str,
    pub fill_color: &'static str,
    pub color: &'static str,
    pub weight: u8,
    pub fill_opacity: f64,
}

impl Default for AreaStyle {
    fn default() -> Self {
        Self {
            name: "Search Radius",
            fill_color: "yellow",
            color: "black",
            weight: 2,
            fill_opacity: 0.3,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchArea {
    #[serde(rename = "type")]
    pub feature_type: &'static str,
    pub geometry: PolygonGeometry,
    pub properties: AreaStyle,
}

/// Everything the map widget needs for one lookup
#[derive(Debug, Serialize)]
pub struct MapView {
    /// [lat, lon]
    pub center: [f64; 2],
    pub zoom: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub search_area: Option<SearchArea>,
    pub markers: FeatureCollection,
}

impl MapView {
    /// Center on the radius input point, else the first record, else the default.
    pub fn from_outcome(outcome: &LookupOutcome) -> Self {
        let center = outcome
            .center
            .or_else(|| {
                outcome
                    .records
                    .first()
                    .map(|r| Coordinate::new(r.lat, r.lon))
            })
            .unwrap_or(DEFAULT_CENTER);

        let search_area = outcome.search_area.as_ref().map(|polygon| SearchArea {
            feature_type: "Feature",
            geometry: PolygonGeometry::from(polygon),
            properties: AreaStyle::default(),
        });

        let features = group_markers(&outcome.records)
            .iter()
            .map(MarkerFeature::from)
            .collect();

        Self {
            center: [center.lat, center.lon],
            zoom: DEFAULT_ZOOM,
            search_area,
            markers: FeatureCollection {
                collection_type: "FeatureCollection",
                features,
            },
        }
    }
}
