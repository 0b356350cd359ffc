use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Heat radius used until the sliders report a value.
pub const DEFAULT_HEAT_RADIUS: u32 = 60;
/// Per-point heat intensity and heat canvas opacity used until the sliders report a value.
pub const DEFAULT_HEAT_INTENSITY: f64 = 1.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl std::fmt::Display for LatLng {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.5}, {:.5}", self.lat, self.lng)
    }
}

/// A single weighted sample fed to a heat layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatPoint {
    pub lat: f64,
    pub lng: f64,
    pub intensity: f64,
}

/// The two thematic datasets drawn on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Produce,
    FastFood,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Produce, Category::FastFood];

    pub fn icon(&self) -> MarkerIcon {
        match self {
            Category::Produce => MarkerIcon {
                class_name: "custom-div-icon",
                html: "<i class='fas fa-apple-alt fresh-food-icon' aria-hidden='true'></i>",
                size: 24,
            },
            Category::FastFood => MarkerIcon {
                class_name: "custom-div-icon",
                html: "<i class='fas fa-hamburger fast-food-icon' aria-hidden='true'></i>",
                size: 24,
            },
        }
    }

    /// Heat gradient for this category under the selected palette.
    pub fn gradient(&self, accessible: bool) -> Gradient {
        match (self, accessible) {
            (Category::Produce, false) => Gradient::new("blue", "cyan"),
            (Category::FastFood, false) => Gradient::new("red", "orange"),
            (Category::Produce, true) => Gradient::new("#00429d", "#73a2c6"),
            (Category::FastFood, true) => Gradient::new("#b10026", "#f4a582"),
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Category::Produce => write!(f, "Fresh Food"),
            Category::FastFood => write!(f, "Fast Food"),
        }
    }
}

/// Two-stop heat gradient keyed at 0.4 and 1.0.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Gradient {
    pub stops: [(f64, &'static str); 2],
}

impl Gradient {
    pub const fn new(low: &'static str, high: &'static str) -> Self {
        Self {
            stops: [(0.4, low), (1.0, high)],
        }
    }
}

/// `L.divIcon` settings for a category's markers. The anchor is the icon center.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MarkerIcon {
    pub class_name: &'static str,
    pub html: &'static str,
    pub size: u32,
}

impl MarkerIcon {
    pub fn anchor(&self) -> u32 {
        self.size / 2
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub coordinates: Value,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(rename = "type", default = "feature_type")]
    pub kind: String,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

fn feature_type() -> String {
    "Feature".to_string()
}

impl Feature {
    /// Builds a point feature with the given string properties.
    pub fn point(lat: f64, lng: f64, properties: &[(&str, &str)]) -> Self {
        let properties = properties
            .iter()
            .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
            .collect();
        Self {
            kind: feature_type(),
            geometry: Some(Geometry {
                kind: "Point".to_string(),
                coordinates: Value::from(vec![lng, lat]),
            }),
            properties: Some(properties),
        }
    }

    /// Position of a point geometry. GeoJSON stores `[lng, lat]`; both must be finite numbers.
    pub fn position(&self) -> Option<LatLng> {
        let coords = self.geometry.as_ref()?.coordinates.as_array()?;
        let lng = coords.first()?.as_f64()?;
        let lat = coords.get(1)?.as_f64()?;
        let pos = LatLng::new(lat, lng);
        pos.is_finite().then_some(pos)
    }

    /// Property rendered as text. Missing, null and empty values read as absent.
    pub fn text_property(&self, key: &str) -> Option<String> {
        match self.properties.as_ref()?.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            Value::Bool(true) => Some("true".to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(default)]
    pub features: Vec<Feature>,
}

/// Heat rendering settings shared by both categories.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeatSettings {
    pub radius: u32,
    pub intensity: f64,
}

impl Default for HeatSettings {
    fn default() -> Self {
        Self {
            radius: DEFAULT_HEAT_RADIUS,
            intensity: DEFAULT_HEAT_INTENSITY,
        }
    }
}

/// User-facing display switches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ViewState {
    pub show_heatmap: bool,
    pub show_border: bool,
    pub show_legend: bool,
    pub produce_visible: bool,
    pub fast_food_visible: bool,
    pub accessible_palette: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            show_heatmap: true,
            show_border: true,
            show_legend: true,
            produce_visible: true,
            fast_food_visible: true,
            accessible_palette: false,
        }
    }
}

impl ViewState {
    pub fn is_visible(&self, category: Category) -> bool {
        match category {
            Category::Produce => self.produce_visible,
            Category::FastFood => self.fast_food_visible,
        }
    }

    pub fn set_visible(&mut self, category: Category, visible: bool) {
        match category {
            Category::Produce => self.produce_visible = visible,
            Category::FastFood => self.fast_food_visible = visible,
        }
    }

    /// Button captions and pressed states derived from the switches.
    pub fn labels(&self) -> ControlLabels {
        ControlLabels {
            mode_button: if self.show_heatmap {
                "Switch to Cluster View"
            } else {
                "Switch to Heatmap View"
            },
            legend_button: if self.show_legend {
                "Hide Map Legend"
            } else {
                "Show Map Legend"
            },
            legend_pressed: self.show_legend,
            border_button: if self.show_border {
                "Hide Newark Border"
            } else {
                "Show Newark Border"
            },
            produce_checked: self.produce_visible,
            fast_food_checked: self.fast_food_visible,
            accessible_checked: self.accessible_palette,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlLabels {
    pub mode_button: &'static str,
    pub legend_button: &'static str,
    pub legend_pressed: bool,
    pub border_button: &'static str,
    pub produce_checked: bool,
    pub fast_food_checked: bool,
    pub accessible_checked: bool,
}

impl Default for ControlLabels {
    fn default() -> Self {
        ViewState::default().labels()
    }
}
