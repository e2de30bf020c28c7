mod config;
mod dataset;
mod persistence;
mod sampler;
mod scheduler;
mod settings;
mod state;
mod stream;
mod ui;

use log::{info, warn};

use config::StreamConfig;
use settings::{AppSettings, default_settings_path};
use state::AppState;
use ui::StreamScopeApp;

fn main() -> eframe::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    info!("StreamScope starting");

    let settings_path = default_settings_path();
    let settings = AppSettings::load(&settings_path);

    let state = AppState::new(settings.stream.clone(), settings.tick_interval)
        .or_else(|err| {
            warn!("Falling back to default stream configuration: {err}");
            AppState::new(StreamConfig::defaults(), settings.tick_interval)
        })
        .expect("Default stream configuration is valid");

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 700.0])
            .with_title("StreamScope"),
        ..Default::default()
    };
    let result = eframe::run_native(
        "StreamScope",
        options,
        Box::new(move |cc| Box::new(StreamScopeApp::new(cc, state, settings_path, settings))),
    );
    info!("StreamScope exiting");
    result
}
