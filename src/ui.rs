use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use egui::{self, Align2, Color32, ComboBox, Layout, Rounding, Stroke};
use egui_plot::{Legend, Line, Plot, PlotPoints};
use log::{info, warn};

use crate::config::{StreamConfig, Waveform};
use crate::persistence::{read_csv, write_csv};
use crate::scheduler::FrameClock;
use crate::settings::{AppSettings, ThemeKind};
use crate::state::AppState;

/// Colors for one theme. `trace` draws the stream line, `plot_bg` and `grid`
/// frame it.
struct Palette {
    dark: bool,
    panel: Color32,
    plot_bg: Color32,
    grid: Color32,
    trace: Color32,
    warning: Color32,
    fault: Color32,
}

const DARK_PALETTE: Palette = Palette {
    dark: true,
    panel: Color32::from_rgb(20, 24, 30),
    plot_bg: Color32::from_rgb(12, 15, 20),
    grid: Color32::from_rgb(48, 56, 68),
    trace: Color32::from_rgb(70, 200, 255),
    warning: Color32::from_rgb(235, 185, 60),
    fault: Color32::from_rgb(255, 96, 96),
};

const LIGHT_PALETTE: Palette = Palette {
    dark: false,
    panel: Color32::from_rgb(243, 245, 248),
    plot_bg: Color32::WHITE,
    grid: Color32::from_rgb(206, 212, 220),
    trace: Color32::from_rgb(0, 110, 190),
    warning: Color32::from_rgb(170, 115, 0),
    fault: Color32::from_rgb(196, 40, 40),
};

fn palette(theme: ThemeKind) -> &'static Palette {
    match theme {
        ThemeKind::Dark => &DARK_PALETTE,
        ThemeKind::Light => &LIGHT_PALETTE,
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Tab {
    Dashboard,
    Config,
}

#[derive(Clone, Copy)]
enum NoticeKind {
    Info,
    Warning,
    Error,
}

struct Notice {
    kind: NoticeKind,
    title: &'static str,
    message: String,
}

pub struct StreamScopeApp {
    state: AppState,
    clock: FrameClock<AppState>,
    settings_path: PathBuf,
    settings: AppSettings,
    tab: Tab,
    draft: StreamConfig,
    draft_interval_ms: u64,
    status: String,
    notice: Option<Notice>,
    fault_reported: bool,
}

impl StreamScopeApp {
    pub fn new(
        cc: &eframe::CreationContext<'_>,
        state: AppState,
        settings_path: PathBuf,
        settings: AppSettings,
    ) -> Self {
        apply_theme(&cc.egui_ctx, settings.theme);
        let draft = state.config().clone();
        let draft_interval_ms = state.stream().interval().as_millis() as u64;
        info!("Main window initialized");
        Self {
            state,
            clock: FrameClock::new(Instant::now()),
            settings_path,
            settings,
            tab: Tab::Dashboard,
            draft,
            draft_interval_ms,
            status: "Ready".to_string(),
            notice: None,
            fault_reported: false,
        }
    }

    fn persist(&mut self) {
        self.settings.stream = self.state.config().clone();
        self.settings.tick_interval = self.state.stream().interval();
        if let Err(err) = self.settings.save(&self.settings_path) {
            warn!(
                "Failed to save settings to {}: {err}",
                self.settings_path.display()
            );
        }
    }

    fn notify(&mut self, kind: NoticeKind, title: &'static str, message: impl Into<String>) {
        self.notice = Some(Notice {
            kind,
            title,
            message: message.into(),
        });
    }

    fn on_pause(&mut self) {
        self.state.pause(&mut self.clock);
        self.status = "Paused".to_string();
    }

    fn on_resume(&mut self) {
        self.fault_reported = false;
        self.state.resume(&mut self.clock);
        self.status = "Running".to_string();
    }

    fn on_clear(&mut self) {
        self.state.clear(&mut self.clock);
        self.status = "Cleared".to_string();
    }

    fn on_save_data(&mut self) {
        let path = self.settings.data_path.trim().to_string();
        if path.is_empty() {
            self.notify(
                NoticeKind::Warning,
                "Error",
                "Please enter a file path to save.",
            );
            return;
        }
        match write_csv(Path::new(&path), self.state.dataset().points()) {
            Ok(count) => {
                let message = format!("Saved {count} points to {path}");
                self.status = format!("Saved: {message}");
                self.notify(NoticeKind::Info, "Success", message);
            }
            Err(err) => {
                self.status = format!("Save failed: {err}");
                self.notify(NoticeKind::Error, "Error", err.to_string());
            }
        }
    }

    fn on_load_data(&mut self) {
        let path = self.settings.data_path.trim().to_string();
        if path.is_empty() {
            self.notify(
                NoticeKind::Warning,
                "Error",
                "Please enter a file path to load.",
            );
            return;
        }
        match read_csv(Path::new(&path)) {
            Ok(points) => {
                let message = format!("Loaded {} points from {path}", points.len());
                self.state.load_points(points, &mut self.clock);
                self.status = format!("Loaded: {message}");
                self.notify(NoticeKind::Info, "Success", message);
            }
            Err(err) => {
                self.status = format!("Load failed: {err}");
                self.notify(NoticeKind::Error, "Error", err.to_string());
            }
        }
    }

    fn on_apply_config(&mut self) {
        match self.state.apply_config(self.draft.clone()) {
            Ok(()) => {
                let interval = Duration::from_millis(self.draft_interval_ms.max(1));
                self.state.set_interval(interval, &mut self.clock);
                self.persist();
                self.status = "Configuration applied".to_string();
                self.notify(
                    NoticeKind::Info,
                    "Success",
                    "Configuration applied successfully.",
                );
            }
            Err(err) => {
                self.status = format!("Config error: {err}");
                self.notify(NoticeKind::Error, "Configuration Error", err.to_string());
            }
        }
    }

    fn on_reset_config(&mut self) {
        self.state.reset_config();
        self.draft = self.state.config().clone();
        self.persist();
        self.status = "Configuration reset to defaults".to_string();
    }

    fn dashboard(&mut self, ui: &mut egui::Ui) {
        let running = self.state.is_running();
        let mut settings_changed = false;

        card(ui, "Stream", |ui| {
            ui.horizontal(|ui| {
                if ui.add_enabled(running, egui::Button::new("Pause")).clicked() {
                    self.on_pause();
                }
                if ui
                    .add_enabled(!running, egui::Button::new("Resume"))
                    .clicked()
                {
                    self.on_resume();
                }
                if ui.button("Clear").clicked() {
                    self.on_clear();
                }
                ui.separator();
                ui.label("File path");
                settings_changed |= ui
                    .add(
                        egui::TextEdit::singleline(&mut self.settings.data_path)
                            .desired_width(260.0),
                    )
                    .changed();
                if ui.button("Save data").clicked() {
                    self.on_save_data();
                }
                if ui.button("Load data").clicked() {
                    self.on_load_data();
                }
            });
            ui.add_space(6.0);
            ui.horizontal(|ui| {
                ui.label("X label");
                settings_changed |= ui
                    .add(egui::TextEdit::singleline(&mut self.settings.x_label).desired_width(120.0))
                    .changed();
                ui.label("Y label");
                settings_changed |= ui
                    .add(egui::TextEdit::singleline(&mut self.settings.y_label).desired_width(120.0))
                    .changed();
                ui.label("Dataset name");
                let mut name = self.state.dataset().name().to_string();
                if ui
                    .add(egui::TextEdit::singleline(&mut name).desired_width(160.0))
                    .changed()
                {
                    self.state.dataset_mut().set_name(name);
                }
            });
        });
        ui.add_space(8.0);

        card(ui, "Plot", |ui| self.plot(ui));

        if settings_changed {
            self.persist();
        }
    }

    fn plot(&self, ui: &mut egui::Ui) {
        let dataset = self.state.dataset();
        if dataset.is_empty() {
            ui.weak("Waiting for data... press Resume to start the stream.");
        }
        let points: PlotPoints = dataset
            .x_values()
            .into_iter()
            .zip(dataset.y_values())
            .map(|(x, y)| [x, y])
            .collect();
        let line = Line::new(points)
            .name(dataset.name())
            .color(palette(self.settings.theme).trace)
            .width(1.5);

        Plot::new("stream_plot")
            .legend(Legend::default())
            .x_axis_label(self.settings.x_label.clone())
            .y_axis_label(self.settings.y_label.clone())
            .show_grid([true, true])
            .allow_zoom(true)
            .allow_drag(true)
            .show(ui, |plot_ui| plot_ui.line(line));
    }

    fn config_tab(&mut self, ui: &mut egui::Ui) {
        card(ui, "Waveform", |ui| {
            egui::Grid::new("config_grid")
                .num_columns(2)
                .spacing([16.0, 8.0])
                .show(ui, |ui| {
                    ui.label("Waveform type");
                    ComboBox::from_id_source("waveform")
                        .selected_text(self.draft.waveform.label())
                        .show_ui(ui, |ui| {
                            for waveform in Waveform::ALL {
                                let label = waveform.label().to_string();
                                ui.selectable_value(&mut self.draft.waveform, waveform, label);
                            }
                        });
                    ui.end_row();

                    ui.label("Amplitude");
                    ui.add(
                        egui::DragValue::new(&mut self.draft.amplitude)
                            .speed(0.01)
                            .clamp_range(0.01..=100.0),
                    );
                    ui.end_row();

                    ui.label("Frequency (Hz)");
                    ui.add(
                        egui::DragValue::new(&mut self.draft.frequency)
                            .speed(0.01)
                            .clamp_range(0.0..=10.0),
                    );
                    ui.end_row();

                    ui.label("Noise (std dev)");
                    ui.add(
                        egui::DragValue::new(&mut self.draft.noise)
                            .speed(0.001)
                            .clamp_range(0.0..=1.0),
                    );
                    ui.end_row();

                    ui.label("X-step (sample interval)");
                    ui.add(
                        egui::DragValue::new(&mut self.draft.x_step)
                            .speed(0.001)
                            .clamp_range(0.001..=1.0),
                    );
                    ui.end_row();

                    ui.label("Max points in buffer");
                    ui.add(
                        egui::DragValue::new(&mut self.draft.max_points)
                            .speed(10.0)
                            .clamp_range(10..=100_000),
                    );
                    ui.end_row();

                    ui.label("Tick interval (ms)");
                    ui.add(
                        egui::DragValue::new(&mut self.draft_interval_ms)
                            .speed(1.0)
                            .clamp_range(10..=2_000),
                    );
                    ui.end_row();
                });
        });
        ui.add_space(8.0);
        ui.horizontal(|ui| {
            if ui.button("Apply").clicked() {
                self.on_apply_config();
            }
            if ui.button("Reset defaults").clicked() {
                self.on_reset_config();
            }
            if &self.draft != self.state.config() {
                ui.colored_label(palette(self.settings.theme).warning, "Unapplied changes");
            }
        });
    }

    fn report_fault(&mut self) {
        if self.fault_reported {
            return;
        }
        if let Some(fault) = self.state.last_fault() {
            self.status = format!("Stream stopped: {fault}");
            self.fault_reported = true;
        }
    }

    fn show_notice(&mut self, ctx: &egui::Context) {
        let mut dismissed = false;
        if let Some(notice) = &self.notice {
            let color = match notice.kind {
                NoticeKind::Info => ctx.style().visuals.text_color(),
                NoticeKind::Warning => palette(self.settings.theme).warning,
                NoticeKind::Error => palette(self.settings.theme).fault,
            };
            egui::Window::new(notice.title)
                .collapsible(false)
                .resizable(false)
                .anchor(Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.colored_label(color, notice.message.as_str());
                    ui.add_space(6.0);
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
        }
        if dismissed {
            self.notice = None;
        }
    }
}

impl eframe::App for StreamScopeApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        let now = Instant::now();
        self.clock.advance(now, &mut self.state);
        self.report_fault();

        egui::TopBottomPanel::top("header").show(ctx, |ui| {
            ui.add_space(4.0);
            ui.horizontal(|ui| {
                ui.strong("StreamScope");
                ui.separator();
                ui.selectable_value(&mut self.tab, Tab::Dashboard, "Dashboard");
                ui.selectable_value(&mut self.tab, Tab::Config, "Config");
                ui.with_layout(Layout::right_to_left(egui::Align::Center), |ui| {
                    if theme_selector(ui, ctx, &mut self.settings) {
                        self.persist();
                    }
                });
            });
            ui.add_space(4.0);
        });

        egui::TopBottomPanel::bottom("status").show(ctx, |ui| {
            ui.horizontal(|ui| {
                ui.label(self.status.as_str());
                ui.separator();
                let dataset = self.state.dataset();
                ui.label(format!(
                    "Points: {} / {}",
                    dataset.point_count(),
                    dataset.max_points()
                ));
                ui.separator();
                match self.state.dataset().last_point() {
                    Some((x, y)) => ui.label(format!("Latest: ({x:.3}, {y:.3})")),
                    None => ui.label("Latest: (-, -)"),
                };
            });
        });

        egui::CentralPanel::default().show(ctx, |ui| match self.tab {
            Tab::Dashboard => self.dashboard(ui),
            Tab::Config => self.config_tab(ui),
        });

        self.show_notice(ctx);

        if let Some(deadline) = self.clock.next_deadline() {
            ctx.request_repaint_after(deadline.saturating_duration_since(now));
        }
    }
}

fn card(ui: &mut egui::Ui, title: &str, add_contents: impl FnOnce(&mut egui::Ui)) {
    egui::Frame::none()
        .fill(ui.visuals().faint_bg_color)
        .stroke(Stroke::new(1.0, ui.visuals().widgets.noninteractive.bg_stroke.color))
        .rounding(Rounding::same(8.0))
        .inner_margin(egui::Margin::same(12.0))
        .show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.strong(title);
                ui.add_space(6.0);
                ui.separator();
            });
            ui.add_space(6.0);
            add_contents(ui);
        });
}

/// Dark/light toggle for the header. Returns true when the theme changed.
fn theme_selector(ui: &mut egui::Ui, ctx: &egui::Context, settings: &mut AppSettings) -> bool {
    let before = settings.theme;
    for theme in ThemeKind::ALL.into_iter().rev() {
        ui.selectable_value(&mut settings.theme, theme, theme.label());
    }
    if settings.theme == before {
        return false;
    }
    apply_theme(ctx, settings.theme);
    true
}

/// Base visuals with the plot background, grid and trace taken from the
/// theme's palette.
fn apply_theme(ctx: &egui::Context, theme: ThemeKind) {
    let palette = palette(theme);
    let mut visuals = if palette.dark {
        egui::Visuals::dark()
    } else {
        egui::Visuals::light()
    };
    visuals.panel_fill = palette.panel;
    visuals.window_fill = palette.panel;
    visuals.extreme_bg_color = palette.plot_bg;
    visuals.widgets.noninteractive.bg_stroke = Stroke::new(1.0, palette.grid);
    visuals.selection.bg_fill = palette.trace.gamma_multiply(0.45);
    visuals.selection.stroke = Stroke::new(1.0, palette.trace);
    visuals.hyperlink_color = palette.trace;
    visuals.warn_fg_color = palette.warning;
    visuals.error_fg_color = palette.fault;
    ctx.set_visuals(visuals);
}
