//! Application state, event wiring and the egui surface.

use dirs_next as dirs;
use eframe::{App, Frame, NativeOptions, egui};
use egui_plot::{MarkerShape, Plot, PlotBounds, PlotPoint, Points, Text};
use rfd::FileDialog;
use serde::{Deserialize, Serialize};
use std::sync::mpsc;
use std::time::{Duration, Instant};

use chrono::Local;
use log::info;

mod export;
use export::{save_workouts_csv, save_workouts_json};
mod form;
use form::{FormMode, WorkoutForm};
mod geolocate;
use geolocate::GeolocateError;
mod storage;
mod store;
use store::{ALL_SORT_FIELDS, SortField, WorkoutStore};
mod view;
use view::{MarkerLayer, WorkoutList};
mod workout;
use workout::{ALL_KINDS, Coords, Workout, WorkoutDetails, WorkoutId, WorkoutKind};

/// Persistent user preferences.
///
/// Serialized to a JSON file so the map zoom survives restarts. `zoom` uses
/// a default function so older files without the field still load.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
struct Settings {
    #[serde(default = "default_zoom")]
    zoom: f64,
}

fn default_zoom() -> f64 {
    13.0
}

impl Settings {
    const FILE: &'static str = "waytrack_settings.json";

    fn path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join(Self::FILE))
    }

    fn load() -> Self {
        if let Some(path) = Self::path() {
            if let Ok(data) = std::fs::read_to_string(&path) {
                if let Ok(cfg) = serde_json::from_str(&data) {
                    return cfg;
                }
            }
        }
        Self::default()
    }

    fn save(&self) {
        if let Some(path) = Self::path() {
            if let Some(parent) = path.parent() {
                let _ = std::fs::create_dir_all(parent);
            }
            if let Ok(data) = serde_json::to_string_pretty(self) {
                let _ = std::fs::write(path, data);
            }
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            zoom: default_zoom(),
        }
    }
}

/// Camera state for the map panel. `ready` flips once the position fix
/// arrives; until then the panel shows a waiting message and no markers
/// exist. `pending_center` is a one-frame recenter request.
#[derive(Debug, Default)]
struct MapView {
    ready: bool,
    pending_center: Option<Coords>,
}

/// Degrees of longitude spanned by the viewport at a given zoom level,
/// following the usual web-map convention of halving per step.
fn zoom_span(zoom: f64) -> f64 {
    360.0 / 2f64.powf(zoom)
}

fn kind_color(kind: WorkoutKind) -> egui::Color32 {
    match kind {
        WorkoutKind::Running => egui::Color32::from_rgb(0, 196, 106),
        WorkoutKind::Cycling => egui::Color32::from_rgb(255, 181, 69),
    }
}

fn format_restore_message(count: usize) -> String {
    if count == 1 {
        "Restored 1 workout".to_string()
    } else {
        format!("Restored {count} workouts")
    }
}

fn row_details(workout: &Workout) -> String {
    match workout.details {
        WorkoutDetails::Running { cadence, pace } => format!(
            "{} {} km  \u{23F1} {} min  \u{26A1} {pace:.1} min/km  \u{1F9B6} {cadence} spm",
            workout.kind().emoji(),
            workout.distance,
            workout.duration,
        ),
        WorkoutDetails::Cycling {
            elevation_gain,
            speed,
        } => format!(
            "{} {} km  \u{23F1} {} min  \u{26A1} {speed:.1} km/h  \u{26F0} {elevation_gain} m",
            workout.kind().emoji(),
            workout.distance,
            workout.duration,
        ),
    }
}

/// Ids are derived from the wall clock; bump past any collision so two
/// submissions in the same millisecond stay distinct.
fn next_workout_id(store: &WorkoutStore, base: WorkoutId) -> WorkoutId {
    let mut id = base;
    while store.contains(id) {
        id += 1;
    }
    id
}

enum RowAction {
    Recenter(WorkoutId),
    Edit(WorkoutId),
    Delete(WorkoutId),
}

struct WaytrackApp {
    store: WorkoutStore,
    list: WorkoutList,
    markers: MarkerLayer,
    form: WorkoutForm,
    sort_field: Option<SortField>,
    map: MapView,
    location_rx: Option<mpsc::Receiver<Result<Coords, GeolocateError>>>,
    settings: Settings,
    show_settings: bool,
    settings_dirty: bool,
    alert: Option<String>,
    toast_message: Option<String>,
    toast_start: Option<Instant>,
}

impl Default for WaytrackApp {
    fn default() -> Self {
        let settings = Settings::load();
        let store = WorkoutStore::from_workouts(storage::load());
        let mut list = WorkoutList::default();
        list.rebuild(&store);

        let mut app = Self {
            store,
            list,
            markers: MarkerLayer::default(),
            form: WorkoutForm::default(),
            sort_field: None,
            map: MapView::default(),
            location_rx: None,
            settings,
            show_settings: false,
            settings_dirty: false,
            alert: None,
            toast_message: None,
            toast_start: None,
        };

        if !app.store.is_empty() {
            info!("Restored {} workouts", app.store.len());
            app.toast_message = Some(format_restore_message(app.store.len()));
            app.toast_start = Some(Instant::now());
        }

        app
    }
}

impl WaytrackApp {
    fn new() -> Self {
        let mut app = Self::default();
        app.spawn_locate();
        app
    }

    fn spawn_locate(&mut self) {
        let (tx, rx) = mpsc::channel();
        self.location_rx = Some(rx);
        std::thread::spawn(move || {
            let _ = tx.send(geolocate::locate());
        });
    }

    fn poll_location(&mut self) {
        if let Some(rx) = self.location_rx.take() {
            match rx.try_recv() {
                Ok(result) => self.apply_location(result),
                Err(mpsc::TryRecvError::Empty) => self.location_rx = Some(rx),
                Err(mpsc::TryRecvError::Disconnected) => {
                    self.alert = Some("Could not get your position".to_string());
                }
            }
        }
    }

    fn apply_location(&mut self, result: Result<Coords, GeolocateError>) {
        match result {
            Ok(coords) => {
                info!("Position fix at {:.4}, {:.4}", coords.lat, coords.lon);
                self.map_ready(coords);
            }
            Err(e) => {
                log::error!("Geolocation failed: {e}");
                self.alert = Some("Could not get your position".to_string());
            }
        }
    }

    /// The map exists from here on: center it and materialize markers for
    /// everything restored before the fix arrived.
    fn map_ready(&mut self, center: Coords) {
        self.map.ready = true;
        self.map.pending_center = Some(center);
        self.markers.rebuild(&self.store);
    }

    fn persist(&self) {
        if let Err(e) = storage::save(self.store.all()) {
            log::error!("Failed to save workouts: {e}");
        }
    }

    fn submit_form(&mut self) {
        let values = match self.form.validate() {
            Ok(values) => values,
            Err(_) => {
                self.form.error = true;
                return;
            }
        };

        match self.form.mode {
            FormMode::Add => {
                let Some(coords) = self.form.pending_coords else {
                    log::warn!("Submit without a map point; ignoring");
                    return;
                };
                let id = next_workout_id(&self.store, Local::now().timestamp_millis());
                let workout = values.build(id, Local::now().date_naive(), coords);
                self.list.on_create(workout.id);
                if self.map.ready {
                    self.markers.add(&workout);
                }
                self.store.append(workout);
                self.form.close();
                self.persist();
            }
            FormMode::Edit(id) => {
                let updated = self.store.update(id, |w| values.apply_to(w));
                if updated {
                    if let Some(workout) = self.store.find(id) {
                        self.markers.refresh(workout);
                    }
                    self.persist();
                } else {
                    log::warn!("Edit target {id} is gone; dropping the edit");
                }
                self.form.close();
                self.form.mode = FormMode::Add;
            }
        }
    }

    fn begin_edit(&mut self, id: WorkoutId) {
        if let Some(workout) = self.store.find(id) {
            self.form.begin_edit(workout);
        }
    }

    fn delete_workout(&mut self, id: WorkoutId) {
        if self.form.editing() == Some(id) {
            self.form.close();
            self.form.mode = FormMode::Add;
        }
        self.store.remove(id);
        self.list.on_delete(id);
        self.markers.remove(id);
        self.persist();
    }

    fn delete_all(&mut self) {
        self.store.remove_all();
        self.list.clear();
        self.markers.clear();
        self.sort_field = None;
        self.form.close();
        self.form.mode = FormMode::Add;
        storage::clear();
    }

    /// Reorder the rows only. The store and the markers keep their order;
    /// the ordering is not persisted.
    fn sort_list(&mut self, field: Option<SortField>) {
        self.sort_field = field;
        match field {
            Some(field) => {
                let order = self.store.sorted_ids(field);
                self.list.set_order(order);
            }
            None => self.list.rebuild(&self.store),
        }
        self.form.close();
    }

    fn recenter_on(&mut self, id: WorkoutId) {
        if !self.map.ready {
            return;
        }
        if let Some(workout) = self.store.find(id) {
            self.map.pending_center = Some(workout.coords);
        }
    }

    fn menu_bar(&mut self, ctx: &egui::Context) {
        egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
            egui::menu::bar(ui, |ui| {
                ui.menu_button("File", |ui| {
                    if ui.button("Settings").clicked() {
                        self.show_settings = true;
                        ui.close_menu();
                    }
                    if ui.button("Export Workouts").clicked() {
                        if let Some(path) = FileDialog::new()
                            .add_filter("JSON", &["json"])
                            .add_filter("CSV", &["csv"])
                            .save_file()
                        {
                            match path
                                .extension()
                                .and_then(|e| e.to_str())
                                .map(|s| s.to_lowercase())
                            {
                                Some(ext) if ext == "csv" => {
                                    if let Err(e) = save_workouts_csv(&path, self.store.all()) {
                                        log::error!("Failed to export workouts: {e}");
                                    }
                                }
                                _ => {
                                    if let Err(e) = save_workouts_json(&path, self.store.all()) {
                                        log::error!("Failed to export workouts: {e}");
                                    }
                                }
                            }
                        }
                        ui.close_menu();
                    }
                });
            });
        });
    }

    fn form_ui(&mut self, ui: &mut egui::Ui) -> bool {
        let mut submit = false;
        let mut edited = false;
        ui.group(|ui| {
            let title = match self.form.mode {
                FormMode::Add => "New workout",
                FormMode::Edit(_) => "Edit workout",
            };
            ui.strong(title);

            egui::ComboBox::from_id_source("workout_kind")
                .selected_text(self.form.kind.label())
                .show_ui(ui, |ui| {
                    for kind in ALL_KINDS {
                        ui.selectable_value(&mut self.form.kind, kind, kind.label());
                    }
                });

            ui.horizontal(|ui| {
                ui.label("Distance (km)");
                edited |= ui
                    .add(egui::TextEdit::singleline(&mut self.form.distance).desired_width(60.0))
                    .changed();
            });
            ui.horizontal(|ui| {
                ui.label("Duration (min)");
                edited |= ui
                    .add(egui::TextEdit::singleline(&mut self.form.duration).desired_width(60.0))
                    .changed();
            });
            match self.form.kind {
                WorkoutKind::Running => {
                    ui.horizontal(|ui| {
                        ui.label("Cadence (spm)");
                        edited |= ui
                            .add(
                                egui::TextEdit::singleline(&mut self.form.cadence)
                                    .desired_width(60.0),
                            )
                            .changed();
                    });
                }
                WorkoutKind::Cycling => {
                    ui.horizontal(|ui| {
                        ui.label("Elev. gain (m)");
                        edited |= ui
                            .add(
                                egui::TextEdit::singleline(&mut self.form.elevation)
                                    .desired_width(60.0),
                            )
                            .changed();
                    });
                }
            }

            // Typing again clears the stale message.
            if edited {
                self.form.dismiss_error();
            }

            if self.form.error {
                ui.horizontal(|ui| {
                    ui.colored_label(egui::Color32::RED, "Inputs have to be positive numbers!");
                    if ui.small_button("\u{2715}").clicked() {
                        self.form.dismiss_error();
                    }
                });
            }

            ui.horizontal(|ui| {
                if ui.button("OK").clicked() {
                    submit = true;
                }
                if ui.button("Cancel").clicked() {
                    self.form.close();
                }
            });
        });
        submit
    }

    fn list_panel(&mut self, ctx: &egui::Context) {
        let mut action: Option<RowAction> = None;
        let mut submit = false;

        egui::SidePanel::left("workouts_panel")
            .default_width(300.0)
            .show(ctx, |ui| {
                ui.heading("Workouts");

                if self.store.is_empty() {
                    ui.label("Click the map to record a workout");
                } else {
                    ui.horizontal(|ui| {
                        ui.label("Sort:");
                        if ui.radio(self.sort_field.is_none(), "Newest").clicked() {
                            self.sort_list(None);
                        }
                        for field in ALL_SORT_FIELDS {
                            if ui
                                .radio(self.sort_field == Some(field), field.label())
                                .clicked()
                            {
                                self.sort_list(Some(field));
                            }
                        }
                    });
                    if ui.button("Delete all").clicked() {
                        self.delete_all();
                    }
                }
                ui.separator();

                egui::ScrollArea::vertical().show(ui, |ui| {
                    if self.form.visible && self.form.editing().is_none() {
                        submit |= self.form_ui(ui);
                    }
                    let ids = self.list.ids().to_vec();
                    for id in ids {
                        if self.form.visible && self.form.editing() == Some(id) {
                            // The form takes the edited row's place.
                            submit |= self.form_ui(ui);
                            continue;
                        }
                        let Some(workout) = self.store.find(id) else {
                            continue;
                        };
                        ui.horizontal(|ui| {
                            let title = egui::RichText::new(&workout.description)
                                .strong()
                                .color(kind_color(workout.kind()));
                            if ui.selectable_label(false, title).clicked() {
                                action = Some(RowAction::Recenter(id));
                            }
                            if ui.small_button("\u{2699}").clicked() {
                                action = Some(RowAction::Edit(id));
                            }
                            if ui.small_button("\u{2715}").clicked() {
                                action = Some(RowAction::Delete(id));
                            }
                        });
                        ui.label(row_details(workout));
                        ui.add_space(4.0);
                    }
                });
            });

        if submit {
            self.submit_form();
        }
        match action {
            Some(RowAction::Recenter(id)) => self.recenter_on(id),
            Some(RowAction::Edit(id)) => self.begin_edit(id),
            Some(RowAction::Delete(id)) => self.delete_workout(id),
            None => {}
        }
    }

    fn map_panel(&mut self, ctx: &egui::Context) {
        let pending = self.map.pending_center.take();
        let span = zoom_span(self.settings.zoom);

        egui::CentralPanel::default().show(ctx, |ui| {
            if !self.map.ready {
                ui.centered_and_justified(|ui| {
                    ui.label("Waiting for your location\u{2026}");
                });
                return;
            }

            let mut pointer: Option<Coords> = None;
            let resp = Plot::new("map")
                .data_aspect(1.0)
                .label_formatter(|_name, value| format!("{:.4}, {:.4}", value.y, value.x))
                .show(ui, |plot_ui| {
                    if let Some(center) = pending {
                        let half = span / 2.0;
                        plot_ui.set_plot_bounds(PlotBounds::from_min_max(
                            [center.lon - half, center.lat - half],
                            [center.lon + half, center.lat + half],
                        ));
                    }
                    let dy = plot_ui.plot_bounds().height() * 0.03;
                    for marker in self.markers.markers() {
                        plot_ui.points(
                            Points::new(vec![[marker.coords.lon, marker.coords.lat]])
                                .shape(MarkerShape::Circle)
                                .radius(6.0)
                                .color(kind_color(marker.kind))
                                .name(&marker.label),
                        );
                        if marker.open {
                            plot_ui.text(
                                Text::new(
                                    PlotPoint::new(marker.coords.lon, marker.coords.lat + dy),
                                    egui::RichText::new(marker.label.as_str()).size(13.0),
                                )
                                .anchor(egui::Align2::CENTER_BOTTOM)
                                .color(kind_color(marker.kind)),
                            );
                        }
                    }
                    if let Some(p) = plot_ui.pointer_coordinate() {
                        pointer = Some(Coords { lat: p.y, lon: p.x });
                    }
                });

            // A click that was not a pan opens the form at that point.
            if resp.response.clicked() {
                if let Some(coords) = pointer {
                    self.form.open_at(coords);
                }
            }
        });
    }

    fn settings_window(&mut self, ctx: &egui::Context) {
        if self.show_settings {
            egui::Window::new("Settings")
                .open(&mut self.show_settings)
                .show(ctx, |ui| {
                    ui.label("Map zoom");
                    if ui
                        .add(egui::Slider::new(&mut self.settings.zoom, 3.0..=18.0).step_by(1.0))
                        .changed()
                    {
                        self.settings_dirty = true;
                    }
                });
        }
    }

    fn alert_window(&mut self, ctx: &egui::Context) {
        let mut dismissed = false;
        if let Some(msg) = &self.alert {
            egui::Window::new("Waytrack")
                .collapsible(false)
                .resizable(false)
                .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
                .show(ctx, |ui| {
                    ui.label(msg);
                    if ui.button("OK").clicked() {
                        dismissed = true;
                    }
                });
        }
        if dismissed {
            self.alert = None;
        }
    }
}

impl App for WaytrackApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut Frame) {
        self.poll_location();
        if self.location_rx.is_some() {
            ctx.request_repaint_after(Duration::from_millis(200));
        }

        self.menu_bar(ctx);
        self.list_panel(ctx);
        self.map_panel(ctx);
        self.settings_window(ctx);
        self.alert_window(ctx);

        if let Some(start) = self.toast_start {
            if start.elapsed() < Duration::from_secs(3) {
                if let Some(ref msg) = self.toast_message {
                    egui::Area::new(egui::Id::new("restore_toast"))
                        .anchor(egui::Align2::RIGHT_TOP, [-10.0, 10.0])
                        .show(ctx, |ui| {
                            ui.label(msg);
                        });
                }
            } else {
                self.toast_start = None;
                self.toast_message = None;
            }
        }

        if self.settings_dirty {
            self.settings.save();
            self.settings_dirty = false;
        }
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.settings.save();
    }
}

fn main() -> eframe::Result<()> {
    env_logger::init();
    let options = NativeOptions::default();
    eframe::run_native(
        "Waytrack",
        options,
        Box::new(|_cc| Box::new(WaytrackApp::new())),
    )
}
