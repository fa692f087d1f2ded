//! Primer Library Builder - desktop front end
//!
//! Builds sets of mutually compatible DNA primers by rejection sampling
//! or exhaustive enumeration, followed by sequential admission.

use mimalloc::MiMalloc;

#[global_allocator]
static GLOBAL: MiMalloc = MiMalloc;

mod app;

use app::PrimerLibraryApp;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .init();

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 760.0])
            .with_min_inner_size([760.0, 520.0])
            .with_title("Primer Library Builder"),
        ..Default::default()
    };

    eframe::run_native(
        "Primer Library Builder",
        native_options,
        Box::new(|cc| Ok(Box::new(PrimerLibraryApp::new(cc)))),
    )
}
