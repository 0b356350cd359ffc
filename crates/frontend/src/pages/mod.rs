pub mod gallery;
pub mod home;
pub mod kpi;
pub mod map;
pub mod story;
