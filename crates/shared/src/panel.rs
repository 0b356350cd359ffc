/// Below this width the panel stacks above the map and resizes vertically.
pub const MOBILE_QUERY: &str = "(max-width: 700px)";
pub const KEYBOARD_STEP: f64 = 24.0;
/// Delay between a layout change and the map size invalidation.
pub const INVALIDATE_DELAY_MS: u32 = 120;
pub const DEFAULT_PANEL_WIDTH: f64 = 340.0;
/// Share of the viewport height the stacked panel starts at, at most.
pub const MOBILE_HEIGHT_SHARE: f64 = 0.45;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Size {
    pub width: f64,
    pub height: f64,
}

impl Size {
    pub const fn new(width: f64, height: f64) -> Self {
        Self { width, height }
    }
}

pub const PANEL_MIN: Size = Size::new(240.0, 160.0);
pub const MAP_MIN: Size = Size::new(320.0, 260.0);

/// The dimension the resizer currently controls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    Width,
    Height,
}

impl Axis {
    pub fn for_layout(is_mobile: bool) -> Self {
        if is_mobile {
            Axis::Height
        } else {
            Axis::Width
        }
    }

    /// `aria-orientation` of the separator, which runs across the resize direction.
    pub fn orientation(&self) -> &'static str {
        match self {
            Axis::Width => "vertical",
            Axis::Height => "horizontal",
        }
    }

    pub fn aria_label(&self) -> &'static str {
        match self {
            Axis::Width => "Resize map control panel width",
            Axis::Height => "Resize map control panel height",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelMode {
    Normal,
    Compact,
    Collapsed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrowKey {
    Left,
    Right,
    Up,
    Down,
}

/// Inline size to put on the panel element.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanelSizing {
    Width(f64),
    Height(f64),
}

impl PanelSizing {
    pub fn style(&self) -> String {
        match self {
            PanelSizing::Width(w) => format!("width: {w}px;"),
            PanelSizing::Height(h) => format!("height: {h}px; flex-basis: {h}px;"),
        }
    }
}

/// Clamps a panel size so the map keeps at least `map_min` of `available`.
/// When even that leaves less than `panel_min`, the panel gets `panel_min`.
pub fn clamp_panel(value: f64, panel_min: f64, available: f64, map_min: f64) -> f64 {
    let limit = available - map_min;
    let max = if limit > panel_min { limit } else { panel_min };
    value.max(panel_min).min(max)
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Drag {
    pointer_id: i32,
    start_size: f64,
    start_pointer: f64,
}

/// Size and mode of the map control panel.
#[derive(Debug, Clone, PartialEq)]
pub struct PanelGeometry {
    pub axis: Axis,
    pub mode: PanelMode,
    was_compact: bool,
    last_desktop_width: f64,
    last_mobile_height: f64,
    drag: Option<Drag>,
}

impl PanelGeometry {
    /// `measured` is the panel's rendered size; zero means unknown.
    pub fn new(measured: Size, viewport_height: f64) -> Self {
        let width = if measured.width > 0.0 {
            measured.width
        } else {
            DEFAULT_PANEL_WIDTH
        };
        let height = if measured.height > 0.0 {
            measured.height
        } else {
            PANEL_MIN.height
        };
        Self {
            axis: Axis::Width,
            mode: PanelMode::Normal,
            was_compact: false,
            last_desktop_width: width,
            last_mobile_height: PANEL_MIN
                .height
                .max(height.min(viewport_height * MOBILE_HEIGHT_SHARE)),
            drag: None,
        }
    }

    pub fn is_collapsed(&self) -> bool {
        self.mode == PanelMode::Collapsed
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn sizing(&self) -> PanelSizing {
        match self.axis {
            Axis::Width => PanelSizing::Width(self.last_desktop_width),
            Axis::Height => PanelSizing::Height(self.last_mobile_height),
        }
    }

    fn apply(&mut self, axis: Axis, value: f64, container: Size) -> PanelSizing {
        match axis {
            Axis::Width => {
                self.last_desktop_width =
                    clamp_panel(value, PANEL_MIN.width, container.width, MAP_MIN.width);
            }
            Axis::Height => {
                self.last_mobile_height =
                    clamp_panel(value, PANEL_MIN.height, container.height, MAP_MIN.height);
            }
        }
        self.sizing()
    }

    /// Picks the axis for the current layout. The outgoing axis remembers the
    /// panel's measured size; the incoming one is clamped and applied.
    pub fn update_axis(&mut self, is_mobile: bool, measured: Size, container: Size) -> Option<PanelSizing> {
        if self.is_collapsed() {
            return None;
        }
        let axis = Axis::for_layout(is_mobile);
        match axis {
            Axis::Height if measured.width > 0.0 => self.last_desktop_width = measured.width,
            Axis::Width if measured.height > 0.0 => self.last_mobile_height = measured.height,
            _ => {}
        }
        self.axis = axis;
        let remembered = match axis {
            Axis::Width => self.last_desktop_width,
            Axis::Height => self.last_mobile_height,
        };
        Some(self.apply(axis, remembered, container))
    }

    /// Window resize: re-clamp the remembered size against the new container.
    pub fn handle_resize(&mut self, container: Size) -> Option<PanelSizing> {
        if self.is_collapsed() {
            return None;
        }
        let remembered = match self.axis {
            Axis::Width => self.last_desktop_width,
            Axis::Height => self.last_mobile_height,
        };
        Some(self.apply(self.axis, remembered, container))
    }

    pub fn begin_drag(&mut self, pointer_id: i32, pointer: (f64, f64), measured: Size) -> bool {
        if self.is_collapsed() {
            return false;
        }
        let (start_size, start_pointer) = match self.axis {
            Axis::Width => (measured.width, pointer.0),
            Axis::Height => (measured.height, pointer.1),
        };
        self.drag = Some(Drag {
            pointer_id,
            start_size,
            start_pointer,
        });
        true
    }

    pub fn drag_to(&mut self, pointer: (f64, f64), container: Size) -> Option<PanelSizing> {
        let drag = self.drag?;
        let current = match self.axis {
            Axis::Width => pointer.0,
            Axis::Height => pointer.1,
        };
        Some(self.apply(self.axis, drag.start_size + (current - drag.start_pointer), container))
    }

    /// Ends the drag, returning the captured pointer id if one was active.
    pub fn end_drag(&mut self) -> Option<i32> {
        self.drag.take().map(|d| d.pointer_id)
    }

    /// Arrow keys resize along the active axis only.
    pub fn step(&mut self, key: ArrowKey, container: Size) -> Option<PanelSizing> {
        if self.is_collapsed() {
            return None;
        }
        let (axis, delta) = match (self.axis, key) {
            (Axis::Width, ArrowKey::Left) => (Axis::Width, -KEYBOARD_STEP),
            (Axis::Width, ArrowKey::Right) => (Axis::Width, KEYBOARD_STEP),
            (Axis::Height, ArrowKey::Up) => (Axis::Height, -KEYBOARD_STEP),
            (Axis::Height, ArrowKey::Down) => (Axis::Height, KEYBOARD_STEP),
            _ => return None,
        };
        let current = match axis {
            Axis::Width => self.last_desktop_width,
            Axis::Height => self.last_mobile_height,
        };
        Some(self.apply(axis, current + delta, container))
    }

    /// Ignored while collapsed. Returns whether the mode changed.
    pub fn toggle_compact(&mut self) -> bool {
        self.mode = match self.mode {
            PanelMode::Collapsed => return false,
            PanelMode::Compact => PanelMode::Normal,
            PanelMode::Normal => PanelMode::Compact,
        };
        true
    }

    pub fn minimize(&mut self) -> bool {
        if self.is_collapsed() {
            return false;
        }
        self.was_compact = self.mode == PanelMode::Compact;
        self.mode = PanelMode::Collapsed;
        self.drag = None;
        true
    }

    /// Re-opens a collapsed panel in the mode it had before.
    pub fn restore(&mut self) -> bool {
        if !self.is_collapsed() {
            return false;
        }
        self.mode = if self.was_compact {
            PanelMode::Compact
        } else {
            PanelMode::Normal
        };
        true
    }

    pub fn class(&self) -> &'static str {
        match self.mode {
            PanelMode::Normal => "control-panel",
            PanelMode::Compact => "control-panel compact",
            PanelMode::Collapsed => "control-panel collapsed",
        }
    }
}

/// Collapses repeated invalidation requests into one per animation frame.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FrameGate {
    pending: bool,
}

impl FrameGate {
    /// True when the caller should schedule a frame.
    pub fn request(&mut self) -> bool {
        if self.pending {
            return false;
        }
        self.pending = true;
        true
    }

    pub fn fire(&mut self) {
        self.pending = false;
    }
}
