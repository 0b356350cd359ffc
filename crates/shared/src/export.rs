use std::cell::RefCell;
use std::future::Future;

use tracing::{info, warn};

use crate::controller::MapController;
use crate::error::{MapError, Result};
use crate::models::{ControlLabels, LatLng};
use crate::state::Presentation;
use crate::surface::{MapSurface, MapView};

pub const EXPORT_TITLE: &str = "Newark Food Access Map";
pub const EXPORT_FILE_NAME: &str = "newark-food-map-export.png";
pub const EXPORT_SCALE: f64 = 2.0;
pub const EXPORT_BACKGROUND: &str = "#ffffff";
/// Time given to the map to redraw before the snapshot.
pub const EXPORT_SETTLE_MS: u32 = 300;

pub const PRINT_SETTLE_MS: u32 = 200;
pub const PRINT_DIALOG_MS: u32 = 300;
pub const PRINT_RESTORE_MS: u32 = 800;
pub const PRINT_VIEW: MapView = MapView {
    center: LatLng::new(40.7357, -74.183),
    zoom: 13.0,
};

pub const SHARE_COPIED: &str = "Map link copied to clipboard!";
pub const SHARE_PROMPT: &str = "Copy this link:";

/// Legend rows in display order.
pub const LEGEND_ROWS: [&str; 5] = ["Fresh Food", "Fast Food", "Newark", "Filter", "Clusters"];

/// Legend rows that describe interactive state and are left out of exports.
pub fn rows_hidden_for_export(rows: &[&'static str]) -> Vec<&'static str> {
    rows.iter()
        .copied()
        .filter(|row| {
            let row = row.to_ascii_lowercase();
            row.contains("filter") || row.contains("clusters")
        })
        .collect()
}

/// What an export changed, so it can be put back.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct ExportSnapshot {
    show_heatmap: bool,
    show_border: bool,
    circle_attached: bool,
    ghost_attached: bool,
}

/// What a print changed, so it can be put back.
#[derive(Debug, Clone, Copy, PartialEq)]
#[must_use]
pub struct PrintSnapshot {
    show_heatmap: bool,
    show_border: bool,
    view: MapView,
}

impl<S: MapSurface> MapController<S> {
    /// Switches to the export presentation: heatmap on, outline hidden,
    /// filter circle and ghost outline detached, title shown, interactive
    /// legend rows hidden and the control panel collapsed.
    pub fn begin_export(&mut self) -> ExportSnapshot {
        let circle = self.state.filter.circle;
        let ghost = self.state.boundary.as_ref().map(|b| b.ghost);
        let snapshot = ExportSnapshot {
            show_heatmap: self.state.view.show_heatmap,
            show_border: self.state.view.show_border,
            circle_attached: circle.is_some_and(|id| self.surface.has_layer(id)),
            ghost_attached: ghost.is_some_and(|id| self.surface.has_layer(id)),
        };

        self.state.view.show_heatmap = true;
        self.set_border(false);
        self.refresh_view();

        for id in [circle, ghost].into_iter().flatten() {
            self.surface.detach(id);
        }
        self.state.presentation = Presentation {
            title: Some(EXPORT_TITLE),
            hidden_legend_rows: rows_hidden_for_export(&LEGEND_ROWS),
            panel_collapsed: true,
            exporting: true,
            printing: self.state.presentation.printing,
        };
        snapshot
    }

    /// Undoes [`MapController::begin_export`]. Runs whether or not the snapshot succeeded.
    pub fn finish_export(&mut self, snapshot: ExportSnapshot) -> ControlLabels {
        self.state.presentation = Presentation {
            printing: self.state.presentation.printing,
            ..Presentation::default()
        };

        let circle = self.state.filter.circle.filter(|_| snapshot.circle_attached);
        let ghost = self
            .state
            .boundary
            .as_ref()
            .map(|b| b.ghost)
            .filter(|_| snapshot.ghost_attached);
        for id in [circle, ghost].into_iter().flatten() {
            self.surface.attach(id);
        }

        self.set_border(snapshot.show_border);
        self.state.view.show_heatmap = snapshot.show_heatmap;
        self.refresh_view()
    }

    /// Switches to the print presentation: heatmap on, outline shown.
    /// Returns `None` while an export or another print is in progress.
    pub fn begin_print(&mut self) -> Option<PrintSnapshot> {
        if self.state.presentation.busy() {
            warn!("print requested while busy, ignoring");
            return None;
        }
        let snapshot = PrintSnapshot {
            show_heatmap: self.state.view.show_heatmap,
            show_border: self.state.view.show_border,
            view: self.surface.view(),
        };
        self.state.presentation.printing = true;
        self.state.view.show_heatmap = true;
        self.set_border(true);
        self.refresh_view();
        Some(snapshot)
    }

    /// Moves to the fixed print framing once the layout has settled.
    pub fn show_print_view(&mut self) {
        self.surface.set_view(PRINT_VIEW);
        self.surface.invalidate_size();
    }

    pub fn finish_print(&mut self, snapshot: PrintSnapshot) -> ControlLabels {
        self.state.presentation.printing = false;
        self.state.view.show_heatmap = snapshot.show_heatmap;
        self.set_border(snapshot.show_border);
        self.surface.set_view(snapshot.view);
        self.refresh_view()
    }
}

/// Takes an image export. `settle` is awaited between entering the export
/// presentation and calling `capture`; the previous presentation is restored
/// afterwards even when the capture fails. Without a capture backend, or while
/// another export or a print is running, nothing changes.
pub async fn export_image<S, W, C, F>(
    controller: &RefCell<MapController<S>>,
    settle: W,
    capture: Option<C>,
) -> Result<()>
where
    S: MapSurface,
    W: Future<Output = ()>,
    C: FnOnce() -> F,
    F: Future<Output = Result<()>>,
{
    let Some(capture) = capture else {
        return Err(MapError::RenderUnavailable("Export library"));
    };
    if controller.borrow().presentation().busy() {
        warn!("export requested while busy, ignoring");
        return Ok(());
    }

    let snapshot = controller.borrow_mut().begin_export();
    settle.await;
    let result = capture().await;
    controller.borrow_mut().finish_export(snapshot);

    match &result {
        Ok(()) => info!(file = EXPORT_FILE_NAME, "map exported"),
        Err(e) => warn!(error = %e, "map export failed"),
    }
    result
}

/// How the share button hands the page link to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShareMethod {
    Native,
    Clipboard,
    Prompt,
}

/// Native share sheet first, then the clipboard, then a prompt.
pub fn choose_share_method(native_share: bool, clipboard: bool) -> ShareMethod {
    if native_share {
        ShareMethod::Native
    } else if clipboard {
        ShareMethod::Clipboard
    } else {
        ShareMethod::Prompt
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Category, HeatSettings};
    use crate::testing::{newark_square, sample_features, RecordingSurface};
    use futures::executor::block_on;

    fn loaded() -> MapController<RecordingSurface> {
        let mut c = MapController::new(RecordingSurface::default(), HeatSettings::default());
        c.install_category(Category::Produce, sample_features());
        c.install_category(Category::FastFood, sample_features());
        c.install_boundary(&newark_square());
        c.refresh_view();
        c.apply_filter(Some(LatLng::new(40.73, -74.17)), 1.0);
        c
    }

    /// Layer attachment and view state that export and print must put back.
    fn fingerprint(c: &MapController<RecordingSurface>) -> (Vec<bool>, bool, bool, bool) {
        let s = c.state();
        let boundary = s.boundary.as_ref().unwrap();
        let ids = [
            s.produce.heat_layer.unwrap(),
            s.produce.cluster_layer.unwrap(),
            s.fast_food.heat_layer.unwrap(),
            s.fast_food.cluster_layer.unwrap(),
            boundary.outline,
            boundary.ghost,
            s.filter.circle.unwrap(),
        ];
        (
            ids.iter().map(|&id| c.surface().has_layer(id)).collect(),
            s.view.show_heatmap,
            s.view.show_border,
            s.view.show_legend,
        )
    }

    #[test]
    fn test_rows_hidden_for_export() {
        assert_eq!(rows_hidden_for_export(&LEGEND_ROWS), vec!["Filter", "Clusters"]);
        assert_eq!(rows_hidden_for_export(&["FILTER area"]), vec!["FILTER area"]);
    }

    #[test]
    fn test_begin_export_presentation() {
        let mut c = loaded();
        c.toggle_mode();
        let _snapshot = c.begin_export();

        let s = c.state();
        assert!(s.view.show_heatmap);
        assert!(!s.view.show_border);
        assert!(!c.surface().has_layer(s.filter.circle.unwrap()));
        assert!(!c.surface().has_layer(s.boundary.as_ref().unwrap().ghost));
        assert_eq!(s.presentation.title, Some(EXPORT_TITLE));
        assert!(s.presentation.panel_collapsed);
        assert!(s.presentation.exporting);
    }

    #[test]
    fn test_export_restores_after_success() {
        let mut c = loaded();
        c.toggle_mode();
        let before = fingerprint(&c);
        let controller = RefCell::new(c);

        let result = block_on(export_image(
            &controller,
            async {},
            Some(|| async { Ok::<(), MapError>(()) }),
        ));

        assert!(result.is_ok());
        let c = controller.borrow();
        assert_eq!(fingerprint(&c), before);
        assert_eq!(c.presentation(), &Presentation::default());
    }

    #[test]
    fn test_export_restores_after_failure() {
        let c = loaded();
        let before = fingerprint(&c);
        let controller = RefCell::new(c);

        let result = block_on(export_image(
            &controller,
            async {},
            Some(|| async { Err::<(), MapError>(MapError::Snapshot("canvas tainted".to_string())) }),
        ));

        assert!(result.is_err());
        let c = controller.borrow();
        assert_eq!(fingerprint(&c), before);
        assert_eq!(c.presentation().title, None);
        assert!(c.presentation().hidden_legend_rows.is_empty());
    }

    #[test]
    fn test_export_title_visible_during_capture() {
        let controller = RefCell::new(loaded());
        let seen = RefCell::new(None);
        let (ctrl, seen_ref) = (&controller, &seen);

        let _ = block_on(export_image(
            ctrl,
            async {},
            Some(move || async move {
                *seen_ref.borrow_mut() = ctrl.borrow().presentation().title;
                Ok::<(), MapError>(())
            }),
        ));

        assert_eq!(*seen.borrow(), Some(EXPORT_TITLE));
    }

    #[test]
    fn test_export_without_library_changes_nothing() {
        let c = loaded();
        let before = fingerprint(&c);
        let controller = RefCell::new(c);

        type Capture = fn() -> std::future::Ready<Result<()>>;
        let result = block_on(export_image(&controller, async {}, None::<Capture>));

        assert_eq!(result, Err(MapError::RenderUnavailable("Export library")));
        assert_eq!(fingerprint(&controller.borrow()), before);
    }

    #[test]
    fn test_print_round_trip() {
        let mut c = loaded();
        c.toggle_mode();
        c.toggle_border();
        let before = fingerprint(&c);
        let view_before = c.surface().view();

        let snapshot = c.begin_print().unwrap();
        assert!(c.state().presentation.printing);
        assert!(c.state().view.show_heatmap);
        assert!(c.state().view.show_border);
        c.show_print_view();
        assert_eq!(c.surface().view(), PRINT_VIEW);

        c.finish_print(snapshot);
        assert_eq!(fingerprint(&c), before);
        assert_eq!(c.surface().view(), view_before);
        assert!(!c.state().presentation.printing);
    }

    #[test]
    fn test_overlapping_prints_restore_original_view() {
        let mut c = loaded();
        c.toggle_mode();
        c.toggle_border();
        let view_before = c.state().view;
        assert!(!view_before.show_heatmap);
        assert!(!view_before.show_border);

        let first = c.begin_print();
        let second = c.begin_print();
        assert!(first.is_some());
        assert!(second.is_none());

        for snapshot in [first, second].into_iter().flatten() {
            c.finish_print(snapshot);
        }
        assert_eq!(c.state().view, view_before);

        // A fresh print is allowed once the first one has finished.
        let again = c.begin_print().unwrap();
        c.finish_print(again);
        assert_eq!(c.state().view, view_before);
    }

    #[test]
    fn test_print_refused_during_export() {
        let mut c = loaded();
        let view_before = c.state().view;
        let export = c.begin_export();

        assert!(c.begin_print().is_none());
        c.finish_export(export);
        assert_eq!(c.state().view, view_before);
        assert!(!c.presentation().busy());
    }

    #[test]
    fn test_export_skipped_during_print() {
        let mut c = loaded();
        c.toggle_mode();
        let view_before = c.state().view;
        let print = c.begin_print().unwrap();
        let controller = RefCell::new(c);
        let captured = RefCell::new(false);
        let captured_ref = &captured;

        let result = block_on(export_image(
            &controller,
            async {},
            Some(move || async move {
                *captured_ref.borrow_mut() = true;
                Ok::<(), MapError>(())
            }),
        ));

        assert!(result.is_ok());
        assert!(!*captured.borrow());
        let mut c = controller.into_inner();
        c.finish_print(print);
        assert_eq!(c.state().view, view_before);
    }

    #[test]
    fn test_export_keeps_printing_flag() {
        let mut c = loaded();
        let print = c.begin_print().unwrap();

        let export = c.begin_export();
        assert!(c.presentation().printing);
        c.finish_export(export);
        assert!(c.presentation().printing);

        c.finish_print(print);
        assert!(!c.presentation().busy());
    }

    #[test]
    fn test_choose_share_method() {
        assert_eq!(choose_share_method(true, true), ShareMethod::Native);
        assert_eq!(choose_share_method(false, true), ShareMethod::Clipboard);
        assert_eq!(choose_share_method(false, false), ShareMethod::Prompt);
    }
}
