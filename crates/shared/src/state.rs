use crate::models::{Category, Feature, HeatPoint, HeatSettings, LatLng, MarkerIcon, ViewState};
use crate::spatial::BoundaryShape;
use crate::surface::LayerId;

/// Layers and data for one category.
#[derive(Debug, Clone)]
pub struct ThematicLayerState {
    pub category: Category,
    /// Unfiltered features as loaded. Every filter starts from these.
    pub raw_features: Vec<Feature>,
    /// Features currently shown, after the active filter.
    pub shown_features: Vec<Feature>,
    pub heat_points: Vec<HeatPoint>,
    pub heat_layer: Option<LayerId>,
    pub cluster_layer: Option<LayerId>,
    pub icon: MarkerIcon,
}

impl ThematicLayerState {
    pub fn empty(category: Category) -> Self {
        Self {
            category,
            raw_features: Vec::new(),
            shown_features: Vec::new(),
            heat_points: Vec::new(),
            heat_layer: None,
            cluster_layer: None,
            icon: category.icon(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct BoundaryOverlay {
    pub outline: LayerId,
    pub ghost: LayerId,
    pub shape: BoundaryShape,
}

#[derive(Debug, Clone, Default)]
pub struct ActiveFilter {
    pub center: Option<LatLng>,
    pub radius_km: f64,
    pub circle: Option<LayerId>,
}

/// Transient decorations shown only while an export snapshot is taken,
/// plus the busy flags for export and print.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presentation {
    pub title: Option<&'static str>,
    pub hidden_legend_rows: Vec<&'static str>,
    pub panel_collapsed: bool,
    pub exporting: bool,
    pub printing: bool,
}

impl Presentation {
    /// An export or a print is in progress.
    pub fn busy(&self) -> bool {
        self.exporting || self.printing
    }
}

#[derive(Debug, Clone)]
pub struct MapState {
    pub view: ViewState,
    pub heat: HeatSettings,
    pub produce: ThematicLayerState,
    pub fast_food: ThematicLayerState,
    pub boundary: Option<BoundaryOverlay>,
    pub filter: ActiveFilter,
    pub presentation: Presentation,
    pub(crate) filter_seq: u64,
}

impl Default for MapState {
    fn default() -> Self {
        Self {
            view: ViewState::default(),
            heat: HeatSettings::default(),
            produce: ThematicLayerState::empty(Category::Produce),
            fast_food: ThematicLayerState::empty(Category::FastFood),
            boundary: None,
            filter: ActiveFilter::default(),
            presentation: Presentation::default(),
            filter_seq: 0,
        }
    }
}

impl MapState {
    pub fn layer(&self, category: Category) -> &ThematicLayerState {
        match category {
            Category::Produce => &self.produce,
            Category::FastFood => &self.fast_food,
        }
    }

    pub fn layer_mut(&mut self, category: Category) -> &mut ThematicLayerState {
        match category {
            Category::Produce => &mut self.produce,
            Category::FastFood => &mut self.fast_food,
        }
    }
}
