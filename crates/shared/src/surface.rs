use crate::models::{Feature, Gradient, HeatPoint, LatLng, MarkerIcon};
use crate::spatial::LatLngBounds;

/// Opaque handle to a layer owned by a [`MapSurface`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LayerId(pub u32);

#[derive(Debug, Clone, PartialEq)]
pub struct MarkerSpec {
    pub position: LatLng,
    pub popup_html: String,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MapView {
    pub center: LatLng,
    pub zoom: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaseTiles {
    Standard,
    Gray,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoundaryStyle {
    /// Green city outline with a faint fill.
    Outline,
    /// Invisible, non-interactive copy kept for export snapshots.
    Ghost,
}

/// Dashed outline drawn around the active filter radius.
pub const FILTER_CIRCLE_COLOR: &str = "#333";
pub const FILTER_CIRCLE_DASH: &str = "4";

/// The map engine as seen by the controllers.
///
/// Layers are created detached; `attach`/`detach` are idempotent. An
/// implementation must tolerate calls after the underlying map is gone.
pub trait MapSurface {
    fn create_heat_layer(&mut self, points: &[HeatPoint], radius: u32, gradient: &Gradient) -> LayerId;
    fn create_cluster_layer(&mut self) -> LayerId;
    fn create_boundary_layer(&mut self, feature: &Feature, style: BoundaryStyle) -> LayerId;
    fn create_circle(&mut self, center: LatLng, radius_m: f64) -> LayerId;
    /// Detaches the layer and releases the handle.
    fn discard(&mut self, layer: LayerId);

    fn attach(&mut self, layer: LayerId);
    fn detach(&mut self, layer: LayerId);
    fn has_layer(&self, layer: LayerId) -> bool;

    fn set_heat_radius(&mut self, layer: LayerId, radius: u32);
    fn set_heat_points(&mut self, layer: LayerId, points: &[HeatPoint]);
    fn set_heat_gradient(&mut self, layer: LayerId, gradient: &Gradient);
    /// Opacity of every rendered heat canvas. The heat plugin has no option for it.
    fn set_heat_opacity(&mut self, opacity: f64);

    fn clear_markers(&mut self, cluster: LayerId);
    fn add_marker(&mut self, cluster: LayerId, icon: &MarkerIcon, marker: &MarkerSpec);

    fn view(&self) -> MapView;
    fn set_view(&mut self, view: MapView);
    /// Fits the view to `fit` and limits panning and zooming out to `max`.
    fn fit_within(&mut self, fit: LatLngBounds, max: LatLngBounds);
    fn invalidate_size(&mut self);
    fn set_base_tiles(&mut self, tiles: BaseTiles);
}
