use tracing::debug;

use crate::controller::MapController;
use crate::loader::to_heat_points;
use crate::models::{Category, HeatSettings, DEFAULT_HEAT_INTENSITY, DEFAULT_HEAT_RADIUS};
use crate::surface::MapSurface;

/// Delay before the one-off heat re-apply that follows page start-up.
pub const DEFERRED_APPLY_MS: u32 = 200;

/// Integer prefix of `raw`, the way a slider value is read.
/// Absent, unparsable or non-positive input yields the default radius.
pub fn parse_radius(raw: Option<&str>) -> u32 {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return DEFAULT_HEAT_RADIUS;
    };
    let end = raw
        .char_indices()
        .find(|&(i, c)| !(c.is_ascii_digit() || (i == 0 && (c == '+' || c == '-'))))
        .map_or(raw.len(), |(i, _)| i);
    match raw[..end].parse::<i64>() {
        Ok(v) if v > 0 => u32::try_from(v).unwrap_or(u32::MAX),
        _ => DEFAULT_HEAT_RADIUS,
    }
}

/// Absent, unparsable or non-finite input yields the default intensity.
pub fn parse_intensity(raw: Option<&str>) -> f64 {
    raw.map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(DEFAULT_HEAT_INTENSITY)
}

impl<S: MapSurface> MapController<S> {
    /// Stores new slider values and redraws. The values are kept even while
    /// the cluster view is active; they take effect when the heatmap returns.
    pub fn apply_heat_inputs(&mut self, radius: Option<&str>, intensity: Option<&str>) -> HeatSettings {
        self.state.heat = HeatSettings {
            radius: parse_radius(radius),
            intensity: parse_intensity(intensity),
        };
        debug!(radius = self.state.heat.radius, intensity = self.state.heat.intensity, "heat settings");
        let intensity = self.state.heat.intensity;
        for category in Category::ALL {
            let layer = self.state.layer_mut(category);
            layer.heat_points = to_heat_points(&layer.shown_features, intensity);
        }
        self.refresh_heatmap();
        self.state.heat
    }

    /// Pushes the stored settings and points to every attached heat layer.
    /// Does nothing in cluster view.
    pub fn refresh_heatmap(&mut self) {
        if !self.state.view.show_heatmap {
            return;
        }
        let HeatSettings { radius, intensity } = self.state.heat;
        for category in Category::ALL {
            let layer = self.state.layer(category);
            let Some(heat) = layer.heat_layer else {
                continue;
            };
            if self.surface.has_layer(heat) {
                self.surface.set_heat_radius(heat, radius);
                self.surface.set_heat_points(heat, &layer.heat_points);
            }
        }
        self.surface.set_heat_opacity(intensity);
    }

    /// Pan, zoom and layer add/remove all leave the heat canvas stale.
    pub fn on_viewport_change(&mut self) {
        if self.state.view.show_heatmap {
            self.refresh_heatmap();
        }
    }
}
