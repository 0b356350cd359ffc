use crate::models::{Category, Feature};

const DIRECTIONS_URL: &str = "https://www.google.com/maps/dir/?api=1&destination=";

/// Escapes text for interpolation into popup HTML.
pub fn escape_html(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn prop_or(feature: &Feature, key: &str, fallback: &str) -> String {
    escape_html(&feature.text_property(key).unwrap_or_else(|| fallback.to_string()))
}

/// Popup markup for a feature. Features without a position get an empty popup.
pub fn popup_html(category: Category, feature: &Feature) -> String {
    let Some(pos) = feature.position() else {
        return String::new();
    };
    let directions = format!(
        "<a href='{DIRECTIONS_URL}{},{}' target='_blank' rel='noopener'>Directions</a>",
        pos.lat, pos.lng
    );

    match category {
        Category::Produce => {
            let mut html = format!(
                "<strong>{}</strong><br>Type: {}",
                prop_or(feature, "name", "Fresh Food Location"),
                prop_or(feature, "type", "Fresh Food"),
            );
            for key in ["description", "distance_rutgers_1", "distance_rutgers_2"] {
                if let Some(v) = feature.text_property(key) {
                    html.push_str("<br>");
                    html.push_str(&escape_html(&v));
                }
            }
            if let Some(source) = feature.text_property("source") {
                html.push_str(&format!("<br><small>Source: {}</small>", escape_html(&source)));
            }
            html.push_str("<br>");
            html.push_str(&directions);
            html
        }
        Category::FastFood => format!(
            "<strong>{}</strong><br>{}<br>{directions}",
            prop_or(feature, "name", "Fast Food"),
            prop_or(feature, "type", "Fast Food"),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_html() {
        assert_eq!(escape_html("<b>Tom & Jerry's</b>"), "&lt;b&gt;Tom &amp; Jerry&#39;s&lt;/b&gt;");
    }

    #[test]
    fn test_produce_popup_defaults() {
        let f = Feature::point(40.73, -74.17, &[]);
        let html = popup_html(Category::Produce, &f);
        assert!(html.starts_with("<strong>Fresh Food Location</strong><br>Type: Fresh Food"));
        assert!(html.contains("destination=40.73,-74.17"));
        assert!(!html.contains("Source:"));
    }

    #[test]
    fn test_produce_popup_optional_fields() {
        let f = Feature::point(
            40.73,
            -74.17,
            &[("name", "Market"), ("description", "Open daily"), ("source", "USDA")],
        );
        let html = popup_html(Category::Produce, &f);
        assert!(html.contains("<strong>Market</strong>"));
        assert!(html.contains("<br>Open daily"));
        assert!(html.contains("<small>Source: USDA</small>"));
    }

    #[test]
    fn test_fast_food_popup_escapes_name() {
        let f = Feature::point(40.7, -74.2, &[("name", "<script>")]);
        let html = popup_html(Category::FastFood, &f);
        assert!(html.starts_with("<strong>&lt;script&gt;</strong><br>Fast Food<br>"));
    }

    #[test]
    fn test_popup_empty_without_position() {
        assert_eq!(popup_html(Category::FastFood, &Feature::default()), "");
    }
}
