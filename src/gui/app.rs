use std::sync::Arc;
use std::time::Instant;

use catppuccin_egui::Theme;
use eframe::egui;
use egui::{CentralPanel, CollapsingHeader, Context, Separator, SidePanel, Ui};
use egui_extras::{Column, TableBuilder};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tracing::{error, info, warn};

use crate::config::DashboardConfig;
use crate::data_aquisition::event_stream::{self, SimEvent};
use crate::data_aquisition::http::HttpBackend;
use crate::gui::canvas;
use crate::gui::dashboard::Dashboard;
use crate::gui::defaults_panel::DefaultsPanel;
use crate::topology::source::BackendError;
use crate::topology::sync::{Completion, Dispatcher, Outbound};

pub const THEME: Theme = catppuccin_egui::MOCHA;

pub fn main(rt: Arc<Runtime>, config: DashboardConfig) {
    let native_options = eframe::NativeOptions::default();
    let result = eframe::run_native(
        "meshsim dashboard",
        native_options,
        Box::new(|cc| match App::new(cc, rt.clone(), config) {
            Ok(app) => Ok(Box::new(app) as Box<dyn eframe::App>),
            Err(e) => Err(e.into()),
        }),
    );

    if let Err(e) = result {
        error!(error = %e, "Dashboard window failed");
    }
}

struct App {
    dashboard: Dashboard,
    dispatcher: Dispatcher,
    completions: UnboundedReceiver<Completion>,
    events: UnboundedReceiver<SimEvent>,
    defaults: DefaultsPanel,
    config: DashboardConfig,
    // Owns the tasks spawned for this window.
    _runtime: Arc<Runtime>,
}

impl App {
    fn new(cc: &eframe::CreationContext<'_>, runtime: Arc<Runtime>, config: DashboardConfig) -> Result<Self, BackendError> {
        catppuccin_egui::set_theme(&cc.egui_ctx, THEME);

        let _guard = runtime.enter();
        let backend = HttpBackend::new(&config.server, config.request_timeout)?;
        let (dispatcher, completions) = Dispatcher::new(Arc::new(backend), runtime.handle().clone());
        let dispatcher = dispatcher.with_repaint(cc.egui_ctx.clone());

        let (tx, events) = mpsc::unbounded_channel();
        runtime.spawn(event_stream::run(
            config.events_url.clone(),
            config.reconnect_delay,
            tx,
            Some(cc.egui_ctx.clone()),
        ));

        dispatcher.refetch();
        dispatcher.refresh_defaults();
        info!(server = %config.server, events = %config.events_url, "Dashboard started");

        Ok(Self {
            dashboard: Dashboard::new(config.message_ttl),
            dispatcher,
            completions,
            events,
            defaults: DefaultsPanel::default(),
            config,
            _runtime: runtime,
        })
    }

    /// Fold everything the background tasks posted since the last frame, in arrival order.
    fn drain(&mut self, now: Instant) {
        while let Ok(completion) = self.completions.try_recv() {
            match completion {
                Completion::Snapshot { seq, result } => {
                    self.dashboard.apply_snapshot(seq, result);
                }
                Completion::Defaults(Ok(defaults)) => self.defaults.set_from_server(defaults),
                // already logged by the dispatcher
                Completion::Defaults(Err(_)) => {}
            }
        }
        while let Ok(event) = self.events.try_recv() {
            self.dashboard.handle_event(event, now);
        }
    }

    fn render_link_section(&mut self, ui: &mut Ui) -> Option<Outbound> {
        let Some(panel) = self.dashboard.interaction.panel_mut() else {
            ui.label("Click a link to tune it.");
            return None;
        };

        ui.label(format!("Link {} - {}", panel.source, panel.target));
        let mut pressed = None;
        egui::Grid::new(("override_grid", &panel.link_id)).num_columns(3).show(ui, |ui| {
            for field in panel.fields.iter_mut() {
                ui.label(field.tunable.as_str());
                ui.add(egui::TextEdit::singleline(&mut field.text).desired_width(90.0));
                if field.pinned {
                    if ui.button("Unpin").clicked() {
                        pressed = Some((field.tunable, false));
                    }
                } else if ui.button("Pin").clicked() {
                    pressed = Some((field.tunable, true));
                }
                ui.end_row();
            }
        });

        let (tunable, pin) = pressed?;
        let result = if pin {
            self.dashboard.interaction.pin(tunable)
        } else {
            self.dashboard.interaction.unpin(tunable)
        };
        match result {
            Ok(outbound) => Some(outbound),
            Err(e) => {
                warn!(error = %e, "Override not sent");
                None
            }
        }
    }

    fn render_in_flight_section(&self, ui: &mut Ui) {
        let mut rows: Vec<_> = self
            .dashboard
            .animator
            .in_flight()
            .map(|message| {
                let hop = message
                    .current_hop()
                    .map(|(hop, duration)| {
                        format!(
                            "{}/{}: {} -> {} ({}ms)",
                            message.durations().len(),
                            message.hops().len(),
                            hop.from,
                            hop.to,
                            duration.as_millis()
                        )
                    })
                    .unwrap_or_else(|| "arrived".to_string());
                (message.key.event.clone(), message.key.destination, hop, message.category.color())
            })
            .collect();
        rows.sort_by(|this, other| this.0.cmp(&other.0));

        TableBuilder::new(ui)
            .striped(true)
            .resizable(true)
            .column(Column::auto().at_least(120.0))
            .column(Column::auto().at_least(40.0))
            .column(Column::remainder())
            .header(20.0, |mut header| {
                header.col(|ui| {
                    ui.strong("Event");
                });
                header.col(|ui| {
                    ui.strong("To");
                });
                header.col(|ui| {
                    ui.strong("Hop");
                });
            })
            .body(|mut body| {
                for (event, destination, hop, color) in rows {
                    body.row(20.0, |mut row| {
                        row.col(|ui| {
                            ui.colored_label(color, event);
                        });
                        row.col(|ui| {
                            ui.label(destination.to_string());
                        });
                        row.col(|ui| {
                            ui.label(hop);
                        });
                    });
                }
            });
    }

    fn render_side_panel(&mut self, ui: &mut Ui) -> Vec<Outbound> {
        let mut outbound = Vec::new();

        ui.heading("meshsim");
        ui.label(format!("Server: {}", self.config.server));
        ui.label(format!(
            "{} nodes, {} links",
            self.dashboard.store.nodes().len(),
            self.dashboard.store.links().len()
        ));
        ui.add(Separator::default());

        CollapsingHeader::new("Selected link").default_open(true).show(ui, |ui| {
            outbound.extend(self.render_link_section(ui));
        });

        ui.add(Separator::default());

        CollapsingHeader::new("Defaults").default_open(false).show(ui, |ui| {
            outbound.extend(self.defaults.ui(ui));
        });

        ui.add(Separator::default());

        CollapsingHeader::new("In flight").default_open(false).show(ui, |ui| {
            egui::ScrollArea::vertical().max_height(240.0).show(ui, |ui| {
                self.render_in_flight_section(ui);
            });
        });

        ui.add(Separator::default());
        ui.horizontal(|ui| {
            if ui.button("Refresh").clicked() {
                self.dispatcher.refetch();
                self.dispatcher.refresh_defaults();
            }
            if ui.button("Print store data").clicked() {
                match self.dashboard.dump_json() {
                    Ok(json) => info!("Store data:\n{json}"),
                    Err(e) => warn!(error = %e, "Error serializing store data"),
                }
            }
        });

        outbound
    }

    fn render(&mut self, ctx: &Context, now: Instant) {
        let mut outbound = Vec::new();

        SidePanel::right("right_panel").show(ctx, |ui| {
            outbound.extend(self.render_side_panel(ui));
        });

        CentralPanel::default().show(ctx, |ui| {
            outbound.extend(canvas::show(ui, &mut self.dashboard, &THEME, now));
        });

        for request in outbound {
            self.dispatcher.dispatch(request);
        }
    }
}

impl eframe::App for App {
    fn update(&mut self, ctx: &egui::Context, _: &mut eframe::Frame) {
        let now = Instant::now();
        self.drain(now);
        self.dashboard.tick(now);
        self.render(ctx, now);

        if self.dashboard.animator.is_animating() || self.dashboard.interaction.dragging().is_some() {
            ctx.request_repaint();
        }
    }
}
