// Rust Planner Application
// Main entry point

use std::path::PathBuf;

use rust_planner::models::settings::InteractionSettings;
use rust_planner::services::settings::SettingsService;
use rust_planner::ui_egui::PlannerApp;

type AppResult = Result<Box<dyn eframe::App>, Box<dyn std::error::Error + Send + Sync>>;

fn main() -> eframe::Result<()> {
    // Initialize logging
    env_logger::init();

    log::info!("Starting Rust Planner");

    let settings = load_settings();
    let db_path = database_path();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title("Rust Planner")
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([800.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Rust Planner",
        options,
        Box::new(move |cc: &eframe::CreationContext<'_>| -> AppResult {
            let app = PlannerApp::new(cc, settings, &db_path)?;
            Ok(Box::new(app))
        }),
    )
}

fn load_settings() -> InteractionSettings {
    match SettingsService::default_location() {
        Some(service) => service.load_or_default(),
        None => {
            log::warn!("No config directory available, using default interaction settings");
            InteractionSettings::default()
        }
    }
}

fn database_path() -> PathBuf {
    // Development builds keep the database next to the binary
    if cfg!(debug_assertions) {
        return PathBuf::from("planner.db");
    }

    match directories::ProjectDirs::from("com", "RustPlanner", "Planner") {
        Some(dirs) => {
            let data_dir = dirs.data_dir();
            if let Err(e) = std::fs::create_dir_all(data_dir) {
                log::warn!("Failed to create data directory {:?}: {}", data_dir, e);
                return PathBuf::from("planner.db");
            }
            data_dir.join("planner.db")
        }
        None => PathBuf::from("planner.db"),
    }
}
