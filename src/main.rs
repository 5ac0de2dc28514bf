mod models;
mod screens;
mod services;

use std::fs;
use std::path::Path;

use anyhow::Context as _;
use eframe::egui;
use screens::admin::{AdminAction, AdminUiState};
use screens::arena::{ArenaAction, ArenaUiState};
use services::config_loader::{self, ArenaConfig};
use services::site_store::{SiteState, SiteStore};
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

enum ArenaBoardState {
    Admin,
    Arena,
}

struct ArenaBoardApp {
    state: ArenaBoardState,
    site: SiteState,
    store: SiteStore,
    config: ArenaConfig,
    admin_ui: AdminUiState,
    arena_ui: ArenaUiState,
}

impl ArenaBoardApp {
    fn new(config: ArenaConfig) -> Self {
        let store = SiteStore::open(&config.store_path);
        let site = store.load_state();
        info!(
            "Loaded site '{}' with {} contestants from {}",
            site.site_name,
            site.roster.len(),
            store.path().display()
        );
        let arena_ui = ArenaUiState::new(&config.presentation);
        Self {
            state: ArenaBoardState::Admin,
            site,
            store,
            config,
            admin_ui: AdminUiState::default(),
            arena_ui,
        }
    }

    fn persist(&mut self) {
        match self.store.sync(&self.site) {
            Ok(_) => self.admin_ui.set_store_error(None),
            Err(err) => {
                error!("Failed to persist site state: {err}");
                self.admin_ui
                    .set_store_error(Some(format!("Changes not saved: {err}")));
            }
        }
    }
}

impl eframe::App for ArenaBoardApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::CentralPanel::default().show(ctx, |ui| match self.state {
            ArenaBoardState::Admin => {
                ui.add_space(8.0);
                match screens::admin::ui(ui, &mut self.admin_ui, &mut self.site, &self.config) {
                    AdminAction::Publish => {
                        info!("Transition: Admin -> Arena");
                        self.state = ArenaBoardState::Arena;
                    }
                    AdminAction::Stay => {}
                }
            }
            ArenaBoardState::Arena => {
                match screens::arena::ui(
                    ui,
                    ctx,
                    &mut self.arena_ui,
                    &self.site,
                    &self.config.presentation,
                ) {
                    ArenaAction::Back => {
                        info!("Transition: Arena -> Admin");
                        self.arena_ui.leave(ctx.input(|input| input.time));
                        self.state = ArenaBoardState::Admin;
                    }
                    ArenaAction::Stay => {}
                }
            }
        });

        self.persist();
    }
}

fn init_tracing() -> Option<WorkerGuard> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let console_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stdout)
        .with_target(true);

    let _ = fs::create_dir_all("logs");
    let file_appender = tracing_appender::rolling::daily("logs", "arena-board.log");
    let (file_writer, file_guard) = tracing_appender::non_blocking(file_appender);
    let file_layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_writer(file_writer)
        .with_target(true);

    let init_result = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer)
        .with(file_layer)
        .try_init();

    if let Err(err) = init_result {
        eprintln!("tracing init failed: {err}");
        return None;
    }

    Some(file_guard)
}

fn load_config() -> ArenaConfig {
    match config_loader::load_arena_config(Path::new(".")) {
        Ok(config) => config,
        Err(message) => {
            warn!("{message}; using default configuration");
            ArenaConfig::default()
        }
    }
}

fn main() -> anyhow::Result<()> {
    let _log_guard = init_tracing();
    info!("Starting Arena Board");

    let config = load_config();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1600.0, 900.0])
            .with_min_inner_size([1024.0, 600.0]),
        ..Default::default()
    };

    eframe::run_native(
        "Arena Board",
        options,
        Box::new(move |cc| {
            let mut style = (*cc.egui_ctx.style()).clone();
            style
                .text_styles
                .insert(egui::TextStyle::Heading, egui::FontId::proportional(34.0));
            style
                .text_styles
                .insert(egui::TextStyle::Body, egui::FontId::proportional(18.0));
            style
                .text_styles
                .insert(egui::TextStyle::Button, egui::FontId::proportional(18.0));
            style.spacing.button_padding = egui::vec2(14.0, 9.0);
            cc.egui_ctx.set_style(style);

            Ok(Box::new(ArenaBoardApp::new(config)))
        }),
    )
    .map_err(|err| anyhow::anyhow!("{err}"))
    .context("Arena Board window exited with an error")
}
