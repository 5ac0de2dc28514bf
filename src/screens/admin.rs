use std::collections::HashMap;
use std::time::Duration;

use eframe::egui;
use rfd::FileDialog;
use tracing::{info, warn};

use crate::models::{HOURS_PER_RECORD, Record, Roster, ThemeId, coerce_number, format_number};
use crate::screens::arena::LogoTextureCache;
use crate::screens::theme::theme_for;
use crate::services::config_loader::ArenaConfig;
use crate::services::image_import::IMAGE_EXTENSIONS;
use crate::services::import_runner::{ImportKind, ImportOutcome, ImportRunner};
use crate::services::logo;
use crate::services::site_store::SiteState;
use crate::services::tabular_import::TABULAR_EXTENSIONS;

pub enum AdminAction {
    Stay,
    Publish,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum CellField {
    Name,
    Target,
    Hour(usize),
}

#[derive(Default)]
pub struct AdminUiState {
    imports: ImportRunner,
    status: Option<String>,
    errors: Vec<String>,
    store_error: Option<String>,
    pending_delete: Option<String>,
    edit_buffers: HashMap<(String, CellField), String>,
    global_target_buffer: Option<String>,
    logo_preview: LogoTextureCache,
}

impl AdminUiState {
    pub fn set_store_error(&mut self, message: Option<String>) {
        self.store_error = message;
    }

    fn push_error(&mut self, message: String) {
        self.errors.push(message);
        if self.errors.len() > 8 {
            self.errors.remove(0);
        }
    }
}

pub fn ui(
    ui: &mut egui::Ui,
    state: &mut AdminUiState,
    site: &mut SiteState,
    config: &ArenaConfig,
) -> AdminAction {
    pump_imports(ui, state, site);

    let mut action = AdminAction::Stay;
    ui.horizontal_wrapped(|ui| {
        render_upload(ui, state, config);
        ui.separator();
        render_site_fields(ui, state, site);
        ui.separator();
        render_theme_and_publish(ui, site, &mut action);
    });
    ui.add_space(6.0);
    render_logo_row(ui, state, site);

    render_messages(ui, state);
    ui.add_space(8.0);
    ui.separator();

    render_roster_grid(ui, state, site);
    render_delete_confirmation(ui.ctx(), state, site);

    action
}

fn pump_imports(ui: &egui::Ui, state: &mut AdminUiState, site: &mut SiteState) {
    if let Some(outcome) = state.imports.poll() {
        apply_import_outcome(state, &mut site.roster, outcome);
    }

    if state.imports.is_busy() {
        ui.ctx().request_repaint_after(Duration::from_millis(100));
    }
}

/// A failed import reports its error and leaves the roster as it was.
fn apply_import_outcome(state: &mut AdminUiState, roster: &mut Roster, outcome: ImportOutcome) {
    match outcome {
        ImportOutcome::Imported(records) => {
            let count = records.len();
            roster.replace_all(records);
            state.edit_buffers.clear();
            state.pending_delete = None;
            state.errors.clear();
            state.status = Some(format!("Imported {count} contestants"));
            info!("Roster replaced by import ({} records)", count);
        }
        ImportOutcome::Failed(error) => {
            state.status = None;
            state.push_error(error.to_string());
        }
    }
}

fn render_upload(ui: &mut egui::Ui, state: &mut AdminUiState, config: &ArenaConfig) {
    let busy = state.imports.is_busy();
    let label = if busy { "Analyzing..." } else { "Upload Data" };
    let clicked = ui
        .add_enabled(!busy, egui::Button::new(label))
        .on_hover_text(".CSV, .XLSX, or image")
        .clicked();

    if busy {
        ui.add(egui::Spinner::new());
        let detail = match state.imports.pending_kind() {
            Some(ImportKind::Image) => "Extracting data",
            _ => "Reading sheet",
        };
        ui.label(detail);
    }

    if clicked
        && let Some(path) = FileDialog::new()
            .set_directory(".")
            .add_filter("Spreadsheets and images", upload_extensions().as_slice())
            .pick_file()
    {
        state.errors.clear();
        state.status = None;
        state.imports.start(path, config);
    }
}

fn upload_extensions() -> Vec<&'static str> {
    TABULAR_EXTENSIONS
        .iter()
        .chain(IMAGE_EXTENSIONS.iter())
        .copied()
        .collect()
}

fn render_site_fields(ui: &mut egui::Ui, state: &mut AdminUiState, site: &mut SiteState) {
    ui.label("Site Name:");
    ui.add_sized(
        [320.0, 28.0],
        egui::TextEdit::singleline(&mut site.site_name)
            .hint_text("Enter Site Name (e.g. Kmart Brisbane)"),
    );

    ui.label("Target:");
    let mut text = state
        .global_target_buffer
        .clone()
        .unwrap_or_else(|| format_number(site.global_target));
    let response = ui.add_sized(
        [110.0, 28.0],
        egui::TextEdit::singleline(&mut text).hint_text("0"),
    );
    if response.changed() {
        site.global_target = coerce_number(&text, 0.0);
    }
    state.global_target_buffer = response.has_focus().then_some(text);
}

fn render_theme_and_publish(ui: &mut egui::Ui, site: &mut SiteState, action: &mut AdminAction) {
    egui::ComboBox::from_label("Theme")
        .selected_text(theme_for(site.theme).label)
        .show_ui(ui, |ui| {
            for id in ThemeId::ALL {
                ui.selectable_value(&mut site.theme, id, theme_for(id).label);
            }
        });

    let publish = egui::Button::new(egui::RichText::new("PUBLISH").strong())
        .fill(egui::Color32::from_rgb(37, 99, 235));
    if ui.add(publish).clicked() {
        *action = AdminAction::Publish;
    }
}

fn render_logo_row(ui: &mut egui::Ui, state: &mut AdminUiState, site: &mut SiteState) {
    ui.horizontal(|ui| {
        if ui.button("Upload Logo").clicked()
            && let Some(path) = FileDialog::new()
                .set_directory(".")
                .add_filter("Images", &IMAGE_EXTENSIONS)
                .pick_file()
        {
            match logo::logo_data_url(&path) {
                Ok(data_url) => {
                    site.custom_logo = data_url;
                    state.status = Some("Logo set".to_string());
                }
                Err(message) => {
                    warn!("{message}");
                    state.push_error(message);
                }
            }
        }

        if site.custom_logo.is_empty() {
            ui.label(
                egui::RichText::new("No custom logo set (using theme default)")
                    .italics()
                    .color(egui::Color32::GRAY),
            );
            return;
        }

        if let Some(texture) = state
            .logo_preview
            .texture(ui.ctx(), &site.custom_logo, None, 96)
        {
            let size = texture.size_vec2();
            let height = 24.0;
            let width = size.x * height / size.y.max(1.0);
            ui.add(egui::Image::new(&texture).fit_to_exact_size(egui::vec2(width, height)));
        }
        if ui.button("Clear").clicked() {
            site.custom_logo.clear();
            info!("Custom logo cleared");
        }
        ui.colored_label(egui::Color32::LIGHT_GREEN, "Logo Set");
    });
}

fn render_messages(ui: &mut egui::Ui, state: &AdminUiState) {
    if let Some(status) = &state.status {
        ui.add_space(6.0);
        ui.colored_label(egui::Color32::LIGHT_GREEN, status);
    }

    if let Some(store_error) = &state.store_error {
        ui.add_space(6.0);
        ui.colored_label(egui::Color32::LIGHT_RED, store_error);
    }

    if !state.errors.is_empty() {
        ui.add_space(8.0);
        egui::Frame::group(ui.style())
            .fill(egui::Color32::from_rgb(58, 22, 22))
            .stroke(egui::Stroke::new(1.0, egui::Color32::from_rgb(180, 60, 60)))
            .show(ui, |ui| {
                ui.label(egui::RichText::new("Import Errors").strong());
                for err in &state.errors {
                    ui.colored_label(egui::Color32::from_rgb(255, 170, 170), err);
                }
            });
    }
}

fn render_roster_grid(ui: &mut egui::Ui, state: &mut AdminUiState, site: &mut SiteState) {
    // Edits are applied by id after the frame's snapshot has been drawn.
    let rows: Vec<Record> = site.roster.records().to_vec();
    let mut edits: Vec<(String, CellField, String)> = Vec::new();

    egui::ScrollArea::both()
        .id_salt("admin_roster_scroll")
        .auto_shrink([false, false])
        .max_height((ui.available_height() - 48.0).max(120.0))
        .show(ui, |ui| {
            egui::Grid::new("admin_roster_grid")
                .striped(true)
                .spacing([6.0, 4.0])
                .show(ui, |ui| {
                    ui.strong("#");
                    ui.strong("Contestant");
                    ui.strong("Target");
                    for hour in 0..HOURS_PER_RECORD {
                        ui.strong(format!("Hour {}", hour + 1));
                    }
                    ui.strong("Total");
                    ui.label("");
                    ui.end_row();

                    for (index, record) in rows.iter().enumerate() {
                        ui.label(format!("{}", index + 1));

                        let id = record.id().to_string();
                        if let Some(text) = cell_edit(
                            ui,
                            &mut state.edit_buffers,
                            (id.clone(), CellField::Name),
                            record.name.clone(),
                            200.0,
                            "Enter Name",
                        ) {
                            edits.push((id.clone(), CellField::Name, text));
                        }
                        if let Some(text) = cell_edit(
                            ui,
                            &mut state.edit_buffers,
                            (id.clone(), CellField::Target),
                            format_number(record.target),
                            70.0,
                            "0",
                        ) {
                            edits.push((id.clone(), CellField::Target, text));
                        }
                        for (hour, value) in record.hours().iter().enumerate() {
                            if let Some(text) = cell_edit(
                                ui,
                                &mut state.edit_buffers,
                                (id.clone(), CellField::Hour(hour)),
                                format_number(*value),
                                56.0,
                                "0",
                            ) {
                                edits.push((id.clone(), CellField::Hour(hour), text));
                            }
                        }

                        ui.label(egui::RichText::new(format_number(record.total())).strong());
                        if ui.button("Delete").clicked() {
                            state.pending_delete = Some(id);
                        }
                        ui.end_row();
                    }
                });
        });

    for (id, field, text) in edits {
        match field {
            CellField::Name => site.roster.set_name(&id, &text),
            CellField::Target => site.roster.set_target_text(&id, &text),
            CellField::Hour(hour) => site.roster.set_hour_text(&id, hour, &text),
        };
    }

    if site.roster.is_empty() {
        ui.label(
            egui::RichText::new("No contestants yet. Upload a sheet or add a row.")
                .italics()
                .color(egui::Color32::GRAY),
        );
    }

    ui.add_space(8.0);
    if ui.button("+ Add New Operator").clicked() {
        let added = site.roster.add_blank();
        info!("Added blank contestant {}", added.id());
    }
}

/// Single-line editor that keeps the raw text while focused, so partial
/// input such as "12." survives the round trip through the numeric value.
fn cell_edit(
    ui: &mut egui::Ui,
    buffers: &mut HashMap<(String, CellField), String>,
    key: (String, CellField),
    current: String,
    width: f32,
    hint: &str,
) -> Option<String> {
    let mut text = buffers.get(&key).cloned().unwrap_or(current);
    let response = ui.add_sized(
        [width, 24.0],
        egui::TextEdit::singleline(&mut text).hint_text(hint),
    );
    let changed = response.changed().then(|| text.clone());
    if response.has_focus() {
        buffers.insert(key, text);
    } else {
        buffers.remove(&key);
    }
    changed
}

fn render_delete_confirmation(ctx: &egui::Context, state: &mut AdminUiState, site: &mut SiteState) {
    let Some(id) = state.pending_delete.clone() else {
        return;
    };
    let Some(name) = site.roster.get(&id).map(|record| record.name.clone()) else {
        state.pending_delete = None;
        return;
    };

    egui::Window::new("Delete this row?")
        .collapsible(false)
        .resizable(false)
        .anchor(egui::Align2::CENTER_CENTER, egui::vec2(0.0, 0.0))
        .show(ctx, |ui| {
            ui.label(format!("Remove \"{name}\" from the roster?"));
            ui.add_space(8.0);
            ui.horizontal(|ui| {
                if ui.button("Delete").clicked() {
                    if site.roster.remove(&id) {
                        info!("Removed contestant {}", id);
                    }
                    state.edit_buffers.retain(|(buffer_id, _), _| *buffer_id != id);
                    state.pending_delete = None;
                }
                if ui.button("Cancel").clicked() {
                    state.pending_delete = None;
                }
            });
        });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::sample_records;
    use crate::services::import_error::ImportError;

    #[test]
    fn failed_import_keeps_roster() {
        let mut state = AdminUiState::default();
        let mut roster = Roster::from_records(sample_records());
        let before = roster.clone();

        apply_import_outcome(
            &mut state,
            &mut roster,
            ImportOutcome::Failed(ImportError::HeaderNotFound),
        );
        apply_import_outcome(
            &mut state,
            &mut roster,
            ImportOutcome::Failed(ImportError::MalformedResult),
        );

        assert_eq!(roster, before);
        assert_eq!(state.errors.len(), 2);
        assert!(state.status.is_none());
    }

    #[test]
    fn successful_import_replaces_roster() {
        let mut state = AdminUiState::default();
        let mut roster = Roster::from_records(sample_records());
        state.push_error("old".to_string());

        let imported = vec![Record::new("a".to_string(), "Alice".to_string(), vec![5.0], 500.0)];
        apply_import_outcome(&mut state, &mut roster, ImportOutcome::Imported(imported));

        assert_eq!(roster.len(), 1);
        assert_eq!(roster.records()[0].name, "Alice");
        assert!(state.errors.is_empty());
        assert_eq!(state.status.as_deref(), Some("Imported 1 contestants"));

        apply_import_outcome(&mut state, &mut roster, ImportOutcome::Imported(Vec::new()));
        assert!(roster.is_empty());
    }
}
