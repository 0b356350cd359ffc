use tracing::{info, warn};

use crate::cluster;
use crate::loader::to_heat_points;
use crate::models::{Category, ControlLabels, Feature, FeatureCollection, HeatSettings};
use crate::popup::popup_html;
use crate::spatial::{find_city_feature, BoundaryShape, LatLngBounds, FIT_PAD, MAX_BOUNDS_PAD, NEWARK_BOUNDS};
use crate::state::{BoundaryOverlay, MapState, Presentation};
use crate::surface::{BoundaryStyle, MapSurface};

/// Owns the map page state and the rendering surface. Every user action is
/// routed through one of its methods; the per-concern methods live next to
/// their helpers in `view_mode`, `heat`, `filter` and `export`.
pub struct MapController<S> {
    pub(crate) state: MapState,
    pub(crate) surface: S,
}

impl<S: MapSurface> MapController<S> {
    pub fn new(surface: S, heat: HeatSettings) -> Self {
        Self {
            state: MapState {
                heat,
                ..MapState::default()
            },
            surface,
        }
    }

    pub fn state(&self) -> &MapState {
        &self.state
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    pub fn labels(&self) -> ControlLabels {
        self.state.view.labels()
    }

    pub fn presentation(&self) -> &Presentation {
        &self.state.presentation
    }

    pub fn invalidate_size(&mut self) {
        self.surface.invalidate_size();
    }

    /// Initial view over the fallback city box, used until the boundary loads.
    pub fn fit_default_view(&mut self) {
        self.fit_to(NEWARK_BOUNDS);
    }

    fn fit_to(&mut self, bounds: LatLngBounds) {
        self.surface
            .fit_within(bounds.pad(FIT_PAD), bounds.pad(MAX_BOUNDS_PAD));
    }

    /// Builds the cluster and heat layers for a freshly loaded category.
    /// Layers start detached; [`MapController::refresh_view`] attaches them.
    pub fn install_category(&mut self, category: Category, features: Vec<Feature>) {
        let accessible = self.state.view.accessible_palette;
        let heat = self.state.heat;

        let cluster = self.surface.create_cluster_layer();
        let icon = category.icon();
        let markers = cluster::populate(&mut self.surface, cluster, &features, &icon, |f| {
            popup_html(category, f)
        });
        let points = to_heat_points(&features, heat.intensity);
        let heat_layer =
            self.surface
                .create_heat_layer(&points, heat.radius, &category.gradient(accessible));

        info!(%category, features = features.len(), markers, "installed map layer");

        let layer = self.state.layer_mut(category);
        layer.raw_features = features.clone();
        layer.shown_features = features;
        layer.heat_points = points;
        layer.heat_layer = Some(heat_layer);
        layer.cluster_layer = Some(cluster);
    }

    /// Adds the city outline and its ghost copy, then fits the view to it.
    /// Returns `false` when the collection has no usable city polygon.
    pub fn install_boundary(&mut self, collection: &FeatureCollection) -> bool {
        let Some(feature) = find_city_feature(collection, "newark") else {
            warn!(features = collection.features.len(), "no Newark feature in boundary data");
            return false;
        };
        let Some(shape) = BoundaryShape::from_feature(feature) else {
            warn!("Newark boundary feature has no polygon geometry");
            return false;
        };

        let outline = self
            .surface
            .create_boundary_layer(feature, BoundaryStyle::Outline);
        let ghost = self.surface.create_boundary_layer(feature, BoundaryStyle::Ghost);
        if self.state.view.show_border {
            self.surface.attach(outline);
        }
        self.surface.attach(ghost);

        self.fit_to(shape.bounds());
        self.state.boundary = Some(BoundaryOverlay {
            outline,
            ghost,
            shape,
        });
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::BaseTiles;
    use crate::testing::{newark_square, sample_features, RecordingSurface};

    fn controller() -> MapController<RecordingSurface> {
        MapController::new(RecordingSurface::default(), HeatSettings::default())
    }

    #[test]
    fn test_install_category_builds_detached_layers() {
        let mut c = controller();
        c.install_category(Category::Produce, sample_features());

        let layer = c.state().layer(Category::Produce);
        let heat = layer.heat_layer.unwrap();
        let cluster = layer.cluster_layer.unwrap();
        assert_eq!(layer.raw_features.len(), 3);
        assert_eq!(layer.heat_points.len(), 2);
        assert!(layer.heat_points.len() <= layer.raw_features.len());
        assert_eq!(c.surface().markers(cluster).len(), 2);
        assert!(!c.surface().has_layer(heat));
        assert!(!c.surface().has_layer(cluster));
    }

    #[test]
    fn test_install_then_refresh_attaches_heat() {
        let mut c = controller();
        c.install_category(Category::Produce, sample_features());
        c.install_category(Category::FastFood, sample_features());
        c.refresh_view();

        for category in Category::ALL {
            let layer = c.state().layer(category);
            assert!(c.surface().has_layer(layer.heat_layer.unwrap()));
            assert!(!c.surface().has_layer(layer.cluster_layer.unwrap()));
        }
        assert_eq!(c.surface().tiles, BaseTiles::Standard);
    }

    #[test]
    fn test_install_boundary_fits_view() {
        let mut c = controller();
        assert!(c.install_boundary(&newark_square()));

        let boundary = c.state().boundary.as_ref().unwrap();
        assert!(c.surface().has_layer(boundary.outline));
        assert!(c.surface().has_layer(boundary.ghost));
        let (fit, max) = c.surface().fitted.unwrap();
        assert!(max.south_west.lat < fit.south_west.lat);
        assert!(fit.contains(boundary.shape.bounds().center()));
    }

    #[test]
    fn test_install_boundary_without_city_feature() {
        let mut c = controller();
        let collection = FeatureCollection {
            features: vec![Feature::point(40.7, -74.1, &[("NAME", "Irvington")])],
        };
        assert!(!c.install_boundary(&collection));
        assert!(c.state().boundary.is_none());
    }
}
