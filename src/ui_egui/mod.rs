mod app;
pub mod input;
pub mod toast;
pub mod week_grid;

pub use app::PlannerApp;
