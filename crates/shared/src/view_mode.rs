use crate::controller::MapController;
use crate::models::{Category, ControlLabels};
use crate::surface::{BaseTiles, LayerId, MapSurface};

/// Which of a category's layers should be on the map.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayerPlan {
    pub heat: bool,
    pub cluster: bool,
}

/// Heat and cluster layers are mutually exclusive; a hidden category shows neither.
pub fn layer_plan(category_visible: bool, show_heatmap: bool) -> LayerPlan {
    LayerPlan {
        heat: category_visible && show_heatmap,
        cluster: category_visible && !show_heatmap,
    }
}

fn sync_layer<S: MapSurface>(surface: &mut S, layer: Option<LayerId>, wanted: bool) {
    let Some(id) = layer else {
        return;
    };
    match (wanted, surface.has_layer(id)) {
        (true, false) => surface.attach(id),
        (false, true) => surface.detach(id),
        _ => {}
    }
}

impl<S: MapSurface> MapController<S> {
    fn sync_category(&mut self, category: Category) {
        let plan = layer_plan(
            self.state.view.is_visible(category),
            self.state.view.show_heatmap,
        );
        let layer = self.state.layer(category);
        let (heat, cluster) = (layer.heat_layer, layer.cluster_layer);
        sync_layer(&mut self.surface, heat, plan.heat);
        sync_layer(&mut self.surface, cluster, plan.cluster);
    }

    /// Re-evaluates both categories against the view state, then redraws the
    /// heatmap when it is the active mode.
    pub fn refresh_view(&mut self) -> ControlLabels {
        for category in Category::ALL {
            self.sync_category(category);
        }
        self.refresh_heatmap();
        self.labels()
    }

    pub fn toggle_category(&mut self, category: Category) -> ControlLabels {
        let visible = self.state.view.is_visible(category);
        self.state.view.set_visible(category, !visible);
        self.refresh_view()
    }

    pub fn toggle_mode(&mut self) -> ControlLabels {
        self.state.view.show_heatmap = !self.state.view.show_heatmap;
        self.refresh_view()
    }

    pub fn toggle_legend(&mut self) -> ControlLabels {
        self.state.view.show_legend = !self.state.view.show_legend;
        self.labels()
    }

    /// Shows or hides the city outline. The ghost copy is left alone.
    pub fn set_border(&mut self, visible: bool) -> ControlLabels {
        self.state.view.show_border = visible;
        if let Some(outline) = self.state.boundary.as_ref().map(|b| b.outline) {
            sync_layer(&mut self.surface, Some(outline), visible);
        }
        self.labels()
    }

    pub fn toggle_border(&mut self) -> ControlLabels {
        self.set_border(!self.state.view.show_border)
    }

    /// Swaps base tiles and heat gradients for the colour-blind safe palette.
    pub fn set_accessible_palette(&mut self, accessible: bool) -> ControlLabels {
        self.state.view.accessible_palette = accessible;
        self.surface.set_base_tiles(if accessible {
            BaseTiles::Gray
        } else {
            BaseTiles::Standard
        });
        for category in Category::ALL {
            if let Some(heat) = self.state.layer(category).heat_layer {
                self.surface
                    .set_heat_gradient(heat, &category.gradient(accessible));
            }
        }
        self.refresh_heatmap();
        self.labels()
    }
}
