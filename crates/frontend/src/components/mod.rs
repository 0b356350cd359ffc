pub mod carousel;
pub mod control_panel;
pub mod legend;
pub mod lightbox;
pub mod nav_drawer;
pub mod panel_resizer;
pub mod reveal;
