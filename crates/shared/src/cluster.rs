use crate::models::{Feature, MarkerIcon};
use crate::surface::{LayerId, MapSurface, MarkerSpec};

/// Rebuilds `cluster` from scratch: one marker per feature with a usable
/// position. Returns the number of markers added.
pub fn populate<S, P>(
    surface: &mut S,
    cluster: LayerId,
    features: &[Feature],
    icon: &MarkerIcon,
    popup: P,
) -> usize
where
    S: MapSurface,
    P: Fn(&Feature) -> String,
{
    surface.clear_markers(cluster);
    let mut added = 0;
    for feature in features {
        let Some(position) = feature.position() else {
            continue;
        };
        let marker = MarkerSpec {
            position,
            popup_html: popup(feature),
        };
        surface.add_marker(cluster, icon, &marker);
        added += 1;
    }
    added
}
