use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use eframe::egui;
use tracing::{debug, info, warn};

use crate::models::{HOURS_PER_RECORD, ThemeId, format_number};
use crate::screens::theme::{LEADER_GOLD, TARGET_MET_FILL, Theme, theme_for};
use crate::services::config_loader::PresentationConfig;
use crate::services::logo::{self, DecodedImageData, LOGO_MAX_DIMENSION};
use crate::services::ranking::{RankedEntry, RankingEngine, SortMode};
use crate::services::site_store::SiteState;
use crate::services::target_eval::{self, HourPace};

pub enum ArenaAction {
    Stay,
    Back,
}

/// One decoded logo texture, re-decoded only when its source changes.
#[derive(Default)]
pub struct LogoTextureCache {
    source_key: Option<String>,
    texture: Option<egui::TextureHandle>,
}

impl LogoTextureCache {
    /// Uploaded logo first, then the configured fallback file.
    pub fn texture(
        &mut self,
        ctx: &egui::Context,
        custom_logo: &str,
        fallback: Option<&Path>,
        max_dimension: u32,
    ) -> Option<egui::TextureHandle> {
        let key = if !custom_logo.is_empty() {
            custom_logo.to_string()
        } else if let Some(path) = fallback {
            format!("file:{}", path.display())
        } else {
            self.source_key = None;
            self.texture = None;
            return None;
        };

        if self.source_key.as_deref() != Some(key.as_str()) {
            let decoded = if custom_logo.is_empty() {
                fallback.and_then(|path| logo::decode_image_file(path, max_dimension))
            } else {
                logo::decode_data_url(custom_logo, max_dimension)
            };
            if decoded.is_none() {
                warn!("Logo could not be decoded, falling back to text banner");
            }
            self.texture = decoded.map(|image| load_texture_from_decoded(ctx, "arena_logo", &image));
            self.source_key = Some(key);
        }
        self.texture.clone()
    }
}

#[derive(Clone, Copy)]
struct RowMoveAnim {
    from_index: usize,
    to_index: usize,
    started_at: f64,
    duration_sec: f32,
}

pub struct ArenaUiState {
    engine: RankingEngine,
    previous_order: Vec<String>,
    active_row_anims: HashMap<String, RowMoveAnim>,
    logo: LogoTextureCache,
    logo_scroll_started: Option<f64>,
}

impl ArenaUiState {
    pub fn new(presentation: &PresentationConfig) -> Self {
        Self {
            engine: RankingEngine::new(presentation.auto_cycle_seconds),
            previous_order: Vec::new(),
            active_row_anims: HashMap::new(),
            logo: LogoTextureCache::default(),
            logo_scroll_started: None,
        }
    }

    /// Called when the arena is left. Stops the auto cycle and forgets the
    /// on-screen order so the next visit starts fresh.
    pub fn leave(&mut self, now: f64) {
        self.engine.select(SortMode::default(), now);
        self.previous_order.clear();
        self.active_row_anims.clear();
        self.logo_scroll_started = None;
    }
}

#[derive(Clone)]
struct FrameMetrics {
    row_height: f32,
    header_height: f32,
    outer_pad_x: f32,
    inner_pad_y: f32,
    col_gap: f32,
    rank_font: egui::FontId,
    name_font: egui::FontId,
    caption_font: egui::FontId,
    hour_font: egui::FontId,
    stat_font: egui::FontId,
    header_font: egui::FontId,
}

#[derive(Clone, Copy)]
struct RowLayout {
    rank_rect: egui::Rect,
    name_rect: egui::Rect,
    hours_rect: egui::Rect,
    total_rect: egui::Rect,
    target_rect: egui::Rect,
}

const LOGO_BAND_HEIGHT: f32 = 80.0;

pub fn ui(
    ui: &mut egui::Ui,
    ctx: &egui::Context,
    state: &mut ArenaUiState,
    site: &SiteState,
    config: &PresentationConfig,
) -> ArenaAction {
    let now = now_seconds(ctx);
    let theme = theme_for(site.theme);
    let palette = theme.palette;

    ui.painter()
        .rect_filled(ui.max_rect(), 0.0, palette.background);

    if state.engine.tick(now) {
        info!("Auto cycle moved to {:?}", state.engine.effective_order());
    }

    let records = site.roster.records();
    let view = state.engine.view(records);
    let order = view.ids();
    if order != state.previous_order {
        if !state.previous_order.is_empty() {
            spawn_row_move_animations(
                state,
                &order,
                now,
                config.row_move_animation_seconds.max(0.01),
            );
        }
        debug!("Arena order changed ({:?}, {} rows)", view.order, order.len());
        state.previous_order = order;
    }

    let mut action = ArenaAction::Stay;
    render_header(ui, ctx, state, site, &theme, now, &mut action);
    ui.add_space(8.0);

    let logo_band = if site.theme == ThemeId::YoungGuns {
        LOGO_BAND_HEIGHT + 16.0
    } else {
        0.0
    };
    let board_height = (ui.available_height() - logo_band).max(120.0);
    let metrics = compute_frame_metrics(
        board_height,
        ui.available_width(),
        config.rows_per_page.max(1),
    );

    // Board header
    let (header_rect, _) = ui.allocate_exact_size(
        egui::vec2(ui.available_width(), metrics.header_height),
        egui::Sense::hover(),
    );
    ui.painter().rect_filled(header_rect, 4.0, palette.container);
    ui.painter().rect_filled(
        egui::Rect::from_min_size(header_rect.min, egui::vec2(header_rect.width(), 4.0)),
        0.0,
        palette.container_edge,
    );
    render_board_header(ui, header_rect, &theme, &metrics);

    let scroll_height = (board_height - metrics.header_height).max(80.0);
    let row_count = view.entries.len();
    let content_height = row_count as f32 * metrics.row_height;
    let row_animating = cleanup_and_has_active_row_anims(state, now);

    egui::ScrollArea::vertical()
        .id_salt("arena_board_scroll")
        .auto_shrink([false, false])
        .max_height(scroll_height)
        .show_viewport(ui, |ui, viewport| {
            let (rect, _) = ui.allocate_exact_size(
                egui::vec2(ui.available_width(), content_height.max(viewport.height())),
                egui::Sense::hover(),
            );
            ui.painter().rect_filled(rect, 0.0, palette.container);

            if row_count == 0 {
                ui.painter().text(
                    egui::pos2(rect.center().x, rect.top() + 80.0),
                    egui::Align2::CENTER_CENTER,
                    "No active contestants found.",
                    egui::FontId::proportional(30.0),
                    palette.text_row,
                );
                ui.painter().text(
                    egui::pos2(rect.center().x, rect.top() + 120.0),
                    egui::Align2::CENTER_CENTER,
                    "Upload data or add rows in Admin Panel.",
                    egui::FontId::proportional(18.0),
                    palette.text_row.gamma_multiply(0.6),
                );
                return;
            }

            let mut draw_rows: Vec<(usize, f32, bool)> = view
                .entries
                .iter()
                .enumerate()
                .map(|(idx, entry)| {
                    let id = entry.record.id();
                    let animated_y = row_content_y(state, id, idx, metrics.row_height, now);
                    (idx, animated_y, is_rising_row_anim_active(state, id, now))
                })
                .filter(|(_, row_y, _)| {
                    let row_max = *row_y + metrics.row_height;
                    row_max >= viewport.min.y && *row_y <= viewport.max.y
                })
                .collect();
            draw_rows.sort_by(|a, b| a.1.total_cmp(&b.1));

            // Rows moving up are painted last so they pass over the others.
            for rising_pass in [false, true] {
                for &(idx, row_y, rising) in &draw_rows {
                    if rising != rising_pass {
                        continue;
                    }
                    let row_rect = egui::Rect::from_min_size(
                        egui::pos2(rect.left(), rect.top() + row_y),
                        egui::vec2(rect.width(), metrics.row_height),
                    );
                    render_row(ui, row_rect, idx, &view.entries[idx], &theme, &metrics);
                }
            }
        });

    if site.theme == ThemeId::YoungGuns {
        ui.add_space(8.0);
        render_logo_band(ui, ctx, state, site, config, now);
        ctx.request_repaint();
    } else if row_animating {
        ctx.request_repaint();
    } else if let Some(wait) = state.engine.seconds_until_next_phase(now) {
        ctx.request_repaint_after(Duration::from_secs_f64(wait));
    }

    action
}

fn render_header(
    ui: &mut egui::Ui,
    ctx: &egui::Context,
    state: &mut ArenaUiState,
    site: &SiteState,
    theme: &Theme,
    now: f64,
    action: &mut ArenaAction,
) {
    let palette = theme.palette;
    ui.horizontal(|ui| {
        ui.vertical(|ui| {
            ui.label(
                egui::RichText::new(site.site_name.to_uppercase())
                    .size(44.0)
                    .strong()
                    .color(palette.text_main),
            );
            ui.label(
                egui::RichText::new(format!("{} Arena", theme.label))
                    .size(18.0)
                    .color(palette.text_main.gamma_multiply(0.8)),
            );
        });

        ui.add_space(24.0);
        ui.vertical(|ui| {
            let displayed = target_eval::displayed_total(site.roster.records());
            let percent = target_eval::progress_percent(site.roster.records(), site.global_target);
            ui.horizontal(|ui| {
                ui.colored_label(
                    palette.text_main,
                    format!("Team Total: {}", format_number(displayed)),
                );
                ui.add_space(24.0);
                ui.colored_label(
                    palette.text_main,
                    format!("Goal: {}", format_number(site.global_target)),
                );
            });
            ui.add(
                egui::ProgressBar::new((percent / 100.0) as f32)
                    .desired_width((ui.available_width() - 220.0).clamp(160.0, 640.0))
                    .fill(palette.progress_fill)
                    .text(format!("{percent:.1}%")),
            );
        });

        ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
            if ui.button("Back").clicked() {
                *action = ArenaAction::Back;
                if ctx.input(|input| input.viewport().fullscreen.unwrap_or(false)) {
                    ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(false));
                }
            }

            let fullscreen = ctx.input(|input| input.viewport().fullscreen.unwrap_or(false));
            let label = if fullscreen { "Exit Fullscreen" } else { "Fullscreen" };
            if ui.button(label).clicked() {
                ctx.send_viewport_cmd(egui::ViewportCommand::Fullscreen(!fullscreen));
            }

            render_sort_menu(ui, state, now);
        });
    });
}

fn render_sort_menu(ui: &mut egui::Ui, state: &mut ArenaUiState, now: f64) {
    let current = state.engine.mode();
    let title = if state.engine.is_cycling() {
        "Auto Loop".to_string()
    } else {
        format!("Sort: {}", current.label())
    };

    ui.menu_button(title, |ui| {
        for mode in SortMode::ALL {
            if mode == SortMode::Auto {
                ui.separator();
            }
            if ui.selectable_label(current == mode, mode.label()).clicked() {
                state.engine.select(mode, now);
                ui.close();
            }
        }
        if current == SortMode::Random {
            ui.separator();
            if ui.button("Reshuffle").clicked() {
                state.engine.reshuffle();
                ui.close();
            }
        }
    });
}

fn now_seconds(ctx: &egui::Context) -> f64 {
    ctx.input(|input| input.time)
}

fn anim_progress(now: f64, started_at: f64, duration_sec: f32) -> f32 {
    if duration_sec <= 0.0 {
        return 1.0;
    }
    ((now - started_at) / f64::from(duration_sec)).clamp(0.0, 1.0) as f32
}

fn ease_out_cubic(t: f32) -> f32 {
    let inv = 1.0 - t;
    1.0 - inv * inv * inv
}

fn lerp_f32(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

fn spawn_row_move_animations(
    state: &mut ArenaUiState,
    after_order: &[String],
    now: f64,
    duration_sec: f32,
) {
    let before_map: HashMap<&str, usize> = state
        .previous_order
        .iter()
        .enumerate()
        .map(|(idx, id)| (id.as_str(), idx))
        .collect();

    for (new_index, id) in after_order.iter().enumerate() {
        let Some(old_index) = before_map.get(id.as_str()).copied() else {
            continue;
        };
        if old_index == new_index {
            continue;
        }
        state.active_row_anims.insert(
            id.clone(),
            RowMoveAnim {
                from_index: old_index,
                to_index: new_index,
                started_at: now,
                duration_sec,
            },
        );
    }
}

fn row_content_y(state: &ArenaUiState, id: &str, logical_index: usize, row_height: f32, now: f64) -> f32 {
    let Some(anim) = state.active_row_anims.get(id) else {
        return logical_index as f32 * row_height;
    };

    let progress = anim_progress(now, anim.started_at, anim.duration_sec);
    let from_y = anim.from_index as f32 * row_height;
    let to_y = logical_index as f32 * row_height;
    if progress >= 1.0 {
        return to_y;
    }

    lerp_f32(from_y, to_y, ease_out_cubic(progress))
}

fn is_rising_row_anim_active(state: &ArenaUiState, id: &str, now: f64) -> bool {
    let Some(anim) = state.active_row_anims.get(id) else {
        return false;
    };
    anim.to_index < anim.from_index && anim_progress(now, anim.started_at, anim.duration_sec) < 1.0
}

fn cleanup_and_has_active_row_anims(state: &mut ArenaUiState, now: f64) -> bool {
    state
        .active_row_anims
        .retain(|_, anim| anim_progress(now, anim.started_at, anim.duration_sec) < 1.0);
    !state.active_row_anims.is_empty()
}

fn compute_frame_metrics(viewport_height: f32, viewport_width: f32, rows_per_page: usize) -> FrameMetrics {
    let row_height = (viewport_height / (rows_per_page as f32 + 0.6)).max(28.0);
    let header_height = row_height * 0.6;
    FrameMetrics {
        row_height,
        header_height,
        outer_pad_x: viewport_width * 0.008,
        inner_pad_y: row_height * 0.1,
        col_gap: viewport_width * 0.006,
        rank_font: egui::FontId::proportional(row_height * 0.32),
        name_font: egui::FontId::proportional(row_height * 0.36),
        caption_font: egui::FontId::proportional(row_height * 0.18),
        hour_font: egui::FontId::proportional(row_height * 0.3),
        stat_font: egui::FontId::proportional(row_height * 0.45),
        header_font: egui::FontId::proportional(header_height * 0.42),
    }
}

/// Twelve column grid: name 3, hours 6, total 2, target 1.
fn compute_row_layout(row_rect: egui::Rect, m: &FrameMetrics) -> RowLayout {
    let inner = egui::Rect::from_min_max(
        egui::pos2(row_rect.left() + m.outer_pad_x, row_rect.top() + m.inner_pad_y),
        egui::pos2(row_rect.right() - m.outer_pad_x, row_rect.bottom() - m.inner_pad_y),
    );
    let unit = (inner.width() - m.col_gap * 3.0) / 12.0;
    let column = |left: f32, span: f32| {
        egui::Rect::from_min_size(
            egui::pos2(left, inner.top()),
            egui::vec2(unit * span, inner.height()),
        )
    };

    let name_column = column(inner.left(), 3.0);
    let hours_rect = column(name_column.right() + m.col_gap, 6.0);
    let total_rect = column(hours_rect.right() + m.col_gap, 2.0);
    let target_rect = column(total_rect.right() + m.col_gap, 1.0);

    let rank_size = inner.height().min(name_column.width() * 0.25);
    let rank_rect = egui::Rect::from_center_size(
        egui::pos2(name_column.left() + rank_size * 0.5, inner.center().y),
        egui::vec2(rank_size, rank_size),
    );
    let name_rect = egui::Rect::from_min_max(
        egui::pos2(rank_rect.right() + m.col_gap, inner.top()),
        name_column.max,
    );

    RowLayout {
        rank_rect,
        name_rect,
        hours_rect,
        total_rect,
        target_rect,
    }
}

fn hour_cell_rects(hours_rect: egui::Rect) -> Vec<egui::Rect> {
    let n = HOURS_PER_RECORD as f32;
    let gap = (hours_rect.width() * 0.01).max(2.0);
    let cell_width = (hours_rect.width() - gap * (n - 1.0)) / n;
    (0..HOURS_PER_RECORD)
        .map(|i| {
            egui::Rect::from_min_size(
                egui::pos2(hours_rect.left() + i as f32 * (cell_width + gap), hours_rect.top()),
                egui::vec2(cell_width, hours_rect.height()),
            )
        })
        .collect()
}

fn render_board_header(ui: &egui::Ui, header_rect: egui::Rect, theme: &Theme, m: &FrameMetrics) {
    let layout = compute_row_layout(header_rect, m);
    let painter = ui.painter();
    let color = theme.palette.text_header;

    painter.text(
        egui::pos2(layout.rank_rect.left(), layout.name_rect.center().y),
        egui::Align2::LEFT_CENTER,
        theme.headers.operator.to_uppercase(),
        m.header_font.clone(),
        color,
    );
    for (idx, cell) in hour_cell_rects(layout.hours_rect).into_iter().enumerate() {
        painter.text(
            cell.center(),
            egui::Align2::CENTER_CENTER,
            theme.hour_header(idx),
            m.header_font.clone(),
            color,
        );
    }
    painter.text(
        layout.total_rect.center(),
        egui::Align2::CENTER_CENTER,
        theme.headers.total.to_uppercase(),
        m.header_font.clone(),
        color,
    );
    painter.text(
        layout.target_rect.center(),
        egui::Align2::CENTER_CENTER,
        theme.headers.target.to_uppercase(),
        m.header_font.clone(),
        color,
    );
}

fn render_row(
    ui: &egui::Ui,
    row_rect: egui::Rect,
    index: usize,
    entry: &RankedEntry<'_>,
    theme: &Theme,
    m: &FrameMetrics,
) {
    let palette = theme.palette;
    let record = entry.record;
    let met = target_eval::target_met(record);
    let layout = compute_row_layout(row_rect, m);
    let painter = ui.painter();

    let bg = if index % 2 == 0 {
        palette.row_even
    } else {
        palette.row_odd
    };
    painter.rect_filled(row_rect, 0.0, bg);
    painter.hline(
        row_rect.x_range(),
        row_rect.bottom(),
        egui::Stroke::new(1.0, palette.border),
    );

    // Rank badge
    let (badge_fill, badge_text) = if entry.leader {
        (LEADER_GOLD, egui::Color32::BLACK)
    } else {
        (egui::Color32::from_black_alpha(80), egui::Color32::from_white_alpha(204))
    };
    painter.circle_filled(layout.rank_rect.center(), layout.rank_rect.width() * 0.5, badge_fill);
    painter.text(
        layout.rank_rect.center(),
        egui::Align2::CENTER_CENTER,
        format!("{}", index + 1),
        m.rank_font.clone(),
        badge_text,
    );

    let name_color = if entry.leader { LEADER_GOLD } else { palette.text_row };
    let name_painter = painter.with_clip_rect(layout.name_rect);
    if entry.leader {
        name_painter.text(
            egui::pos2(layout.name_rect.left(), layout.name_rect.center().y),
            egui::Align2::LEFT_BOTTOM,
            &record.name,
            m.name_font.clone(),
            name_color,
        );
        name_painter.text(
            egui::pos2(layout.name_rect.left(), layout.name_rect.center().y + 2.0),
            egui::Align2::LEFT_TOP,
            "LEADER",
            m.caption_font.clone(),
            LEADER_GOLD,
        );
    } else {
        name_painter.text(
            egui::pos2(layout.name_rect.left(), layout.name_rect.center().y),
            egui::Align2::LEFT_CENTER,
            &record.name,
            m.name_font.clone(),
            name_color,
        );
    }

    // Hourly heatmap
    for (cell, value) in hour_cell_rects(layout.hours_rect).into_iter().zip(record.hours()) {
        let (fill, text_color) = match target_eval::classify_hour(*value, record.target) {
            HourPace::Empty => (palette.border.gamma_multiply(0.3), egui::Color32::TRANSPARENT),
            HourPace::OnPace => (palette.on_pace_fill, palette.on_pace_text),
            HourPace::BehindPace => (palette.behind_fill, palette.behind_text),
        };
        painter.rect_filled(cell, 2.0, fill);
        if *value > 0.0 {
            painter.text(
                cell.center(),
                egui::Align2::CENTER_CENTER,
                format_number(*value),
                m.hour_font.clone(),
                text_color,
            );
        }
    }

    let (total_fill, total_text) = if met {
        (TARGET_MET_FILL, egui::Color32::BLACK)
    } else {
        (egui::Color32::from_black_alpha(77), palette.text_row)
    };
    painter.rect_filled(layout.total_rect, 6.0, total_fill);
    painter.text(
        layout.total_rect.center(),
        egui::Align2::CENTER_CENTER,
        format_number(record.total()),
        m.stat_font.clone(),
        total_text,
    );

    painter.rect_filled(layout.target_rect, 6.0, palette.target_fill);
    painter.text(
        layout.target_rect.center(),
        egui::Align2::CENTER_CENTER,
        format_number(record.target.ceil()),
        m.hour_font.clone(),
        palette.target_text,
    );
}

/// Loops the logo (or a text banner) left to right along the bottom.
fn render_logo_band(
    ui: &mut egui::Ui,
    ctx: &egui::Context,
    state: &mut ArenaUiState,
    site: &SiteState,
    config: &PresentationConfig,
    now: f64,
) {
    let (band_rect, _) = ui.allocate_exact_size(
        egui::vec2(ui.available_width(), LOGO_BAND_HEIGHT),
        egui::Sense::hover(),
    );
    let started = *state.logo_scroll_started.get_or_insert(now);
    let period = f64::from(config.logo_scroll_seconds.max(1.0));
    let progress = (((now - started) % period) / period) as f32;

    let fallback = logo::resolve_fallback_path(config.fallback_logo_path.as_deref());
    let texture = state
        .logo
        .texture(ctx, &site.custom_logo, fallback.as_deref(), LOGO_MAX_DIMENSION);

    let painter = ui.painter().with_clip_rect(band_rect);
    let height = LOGO_BAND_HEIGHT - 5.0;
    match texture {
        Some(texture) => {
            let size = texture.size_vec2();
            let width = size.x * height / size.y.max(1.0);
            let x = lerp_f32(band_rect.left() - width, band_rect.right(), progress);
            let rect = egui::Rect::from_min_size(
                egui::pos2(x, band_rect.center().y - height * 0.5),
                egui::vec2(width, height),
            );
            painter.image(
                texture.id(),
                rect,
                egui::Rect::from_min_max(egui::pos2(0.0, 0.0), egui::pos2(1.0, 1.0)),
                egui::Color32::WHITE.gamma_multiply(0.9),
            );
        }
        None => {
            let width = 400.0;
            let x = lerp_f32(band_rect.left() - width, band_rect.right(), progress);
            let center_y = band_rect.center().y;
            let orange = theme_for(ThemeId::YoungGuns).palette.container_edge;
            for offset in [20.0, 50.0] {
                painter.line_segment(
                    [egui::pos2(x + offset, center_y - 25.0), egui::pos2(x + offset + 25.0, center_y)],
                    egui::Stroke::new(8.0, orange),
                );
                painter.line_segment(
                    [egui::pos2(x + offset + 25.0, center_y), egui::pos2(x + offset, center_y + 25.0)],
                    egui::Stroke::new(8.0, orange),
                );
            }
            let rule = egui::Color32::from_rgb(212, 212, 216);
            let text_left = x + 90.0;
            painter.hline(text_left..=text_left + 280.0, center_y - 25.0, egui::Stroke::new(2.0, rule));
            painter.hline(text_left..=text_left + 280.0, center_y + 23.0, egui::Stroke::new(2.0, rule));
            painter.text(
                egui::pos2(text_left + 140.0, center_y),
                egui::Align2::CENTER_CENTER,
                "YOUNG GUNS",
                egui::FontId::proportional(36.0),
                egui::Color32::WHITE,
            );
        }
    }
}

fn load_texture_from_decoded(
    ctx: &egui::Context,
    texture_id: &str,
    image: &DecodedImageData,
) -> egui::TextureHandle {
    let color_image =
        egui::ColorImage::from_rgba_unmultiplied([image.width, image.height], &image.rgba);
    ctx.load_texture(texture_id.to_string(), color_image, egui::TextureOptions::LINEAR)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn state_with_order(ids: &[&str]) -> ArenaUiState {
        let mut state = ArenaUiState::new(&PresentationConfig::default());
        state.previous_order = ids.iter().map(|id| id.to_string()).collect();
        state
    }

    fn order(ids: &[&str]) -> Vec<String> {
        ids.iter().map(|id| id.to_string()).collect()
    }

    #[test]
    fn only_moved_rows_animate() {
        let mut state = state_with_order(&["a", "b", "c"]);
        spawn_row_move_animations(&mut state, &order(&["c", "b", "a", "new"]), 10.0, 0.5);

        assert_eq!(state.active_row_anims.len(), 2);
        assert!(!state.active_row_anims.contains_key("b"));
        assert!(!state.active_row_anims.contains_key("new"));
        assert!(is_rising_row_anim_active(&state, "c", 10.1));
        assert!(!is_rising_row_anim_active(&state, "a", 10.1));
    }

    #[test]
    fn rows_glide_to_their_new_slot() {
        let mut state = state_with_order(&["a", "b"]);
        spawn_row_move_animations(&mut state, &order(&["b", "a"]), 0.0, 1.0);

        assert_eq!(row_content_y(&state, "a", 1, 10.0, 0.0), 0.0);
        let mid = row_content_y(&state, "a", 1, 10.0, 0.5);
        assert!(mid > 5.0 && mid < 10.0);
        assert_eq!(row_content_y(&state, "a", 1, 10.0, 2.0), 10.0);

        assert!(cleanup_and_has_active_row_anims(&mut state, 0.5));
        assert!(!cleanup_and_has_active_row_anims(&mut state, 1.5));
        assert_eq!(row_content_y(&state, "b", 0, 10.0, 1.5), 0.0);
    }

    #[test]
    fn leaving_resets_sort_state() {
        let mut state = state_with_order(&["a"]);
        state.engine.select(SortMode::Auto, 0.0);
        assert!(state.engine.is_cycling());

        state.leave(5.0);
        assert!(!state.engine.is_cycling());
        assert_eq!(state.engine.mode(), SortMode::Descending);
        assert!(state.previous_order.is_empty());
    }

    #[test]
    fn easing_hits_both_ends() {
        assert_eq!(ease_out_cubic(0.0), 0.0);
        assert_eq!(ease_out_cubic(1.0), 1.0);
        assert_eq!(anim_progress(5.0, 4.0, 0.0), 1.0);
        assert_eq!(anim_progress(4.5, 4.0, 1.0), 0.5);
    }
}
