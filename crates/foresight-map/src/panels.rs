use eframe::egui::{self, Align2, Color32, RichText};
use foresight_scene::node::NodePayload;
use foresight_scene::{Level, MediaItem, NodeId, NodeState, ToastLevel};

use crate::actions::Action;
use crate::state::State;
use crate::viewport::color32;

fn level_name(level: Level) -> &'static str {
    match level {
        Level::Center => "Foresight",
        Level::Pillar => "Pillar",
        Level::Methodology => "Methodology",
        Level::Media => "Resource",
    }
}

/// Returns true when the user asked to open a content file.
pub fn menu_bar(ctx: &egui::Context, state: &mut State) -> bool {
    let mut open_requested = false;
    let mut actions = Vec::new();

    egui::TopBottomPanel::top("menu_bar").show(ctx, |ui| {
        egui::MenuBar::new().ui(ui, |ui| {
            ui.menu_button("File", |ui| {
                if ui.button("Open content…").clicked() {
                    ui.close();
                    open_requested = true;
                }

                #[cfg(not(target_arch = "wasm32"))]
                if ui.button("Export content…").clicked() {
                    ui.close();
                    if let Some(path) = rfd::FileDialog::new()
                        .add_filter("JSON", &["json"])
                        .save_file()
                    {
                        actions.push(Action::ExportContent { path });
                    }
                }

                if ui.button("Reset to built-in map").clicked() {
                    ui.close();
                    actions.push(Action::ResetToBundledContent);
                }
            });

            ui.menu_button("View", |ui| {
                let mut show_labels = state.store.show_labels;
                if ui.checkbox(&mut show_labels, "Labels").changed() {
                    actions.push(Action::SetShowLabels { show: show_labels });
                }
                let mut show_stats = state.store.show_stats;
                if ui.checkbox(&mut show_stats, "Scene stats").changed() {
                    actions.push(Action::SetShowStats { show: show_stats });
                }
            });

            ui.separator();
            ui.label(RichText::new(&state.store.content.get().root.label).strong());
        });
    });

    for action in actions {
        state.dispatch(action);
    }
    open_requested
}

pub fn tour_bar(ctx: &egui::Context, state: &mut State) {
    let mut actions = Vec::new();

    egui::TopBottomPanel::bottom("tour_bar").show(ctx, |ui| {
        ui.horizontal(|ui| {
            let tour = &state.store.tour;
            if tour.is_running() {
                if ui.button("■ Stop tour").clicked() {
                    actions.push(Action::StopTour);
                }
                let (index, total) = tour.progress();
                ui.label(format!("{} / {total}", (index + 1).min(total)));
                if let Some(caption) = &state.store.tour_caption {
                    ui.label(RichText::new(caption).italics());
                }
            } else {
                let plan = state.cache.tour_plan.get(&state.store);
                let start = ui.add_enabled(
                    !plan.is_empty(),
                    egui::Button::new("▶ Guided tour"),
                );
                if start.clicked() {
                    actions.push(Action::StartTour {
                        segments: plan.clone(),
                    });
                }
                ui.label(format!("{} stops", plan.len()));
            }
        });
    });

    for action in actions {
        state.dispatch(action);
    }
}

pub fn details_panel(ctx: &egui::Context, state: &mut State) {
    let mut actions = Vec::new();

    egui::SidePanel::right("details")
        .default_width(320.0)
        .show(ctx, |ui| {
            egui::ScrollArea::vertical().show(ui, |ui| {
                let selected = state.store.scene.selected().cloned();
                match selected {
                    Some(id) => node_details(ui, state, &id, &mut actions),
                    None => legend(ui, state),
                }
            });
        });

    for action in actions {
        state.dispatch(action);
    }
}

fn node_details(
    ui: &mut egui::Ui,
    state: &State,
    id: &NodeId,
    actions: &mut Vec<Action>,
) {
    let scene = &state.store.scene;
    let Some(node) = scene.node(id) else {
        return;
    };

    ui.label(RichText::new(level_name(node.level)).small().weak());
    ui.heading(RichText::new(node.label()).color(color32(node.color, 1.0)));
    if let Some(description) = node.payload.description() {
        ui.label(description);
    }
    ui.add_space(6.0);

    ui.horizontal(|ui| {
        if ui.button("Fly here").clicked() {
            actions.push(Action::FlyTo { id: id.clone() });
        }
        if matches!(node.level, Level::Pillar | Level::Methodology) {
            let label = match scene.expansion().state_of(id) {
                NodeState::Expanded => "Collapse",
                NodeState::Collapsed => "Expand",
            };
            if ui.button(label).clicked() {
                actions.push(Action::ClickNode { id: id.clone() });
            }
        }
        if ui.button("Deselect").clicked() {
            actions.push(Action::SelectNode { id: None });
        }
    });

    if let NodePayload::Media(item) = &node.payload {
        ui.separator();
        media_row(ui, item);
        return;
    }

    let media = node.payload.media();
    if !media.is_empty() {
        ui.separator();
        ui.label(RichText::new("Resources").strong());
        for item in media {
            media_row(ui, item);
        }
    }

    let related = node.payload.related();
    if !related.is_empty() {
        ui.separator();
        ui.label(RichText::new("Related methodologies").strong());
        for other in related {
            let label = state
                .store
                .content
                .get()
                .methodology(other)
                .map(|m| m.label.as_str())
                .unwrap_or(other.as_str());
            let live = scene.node(other).is_some();
            let button = ui
                .add_enabled(live, egui::Button::new(label))
                .on_disabled_hover_text("Expand its pillar to visit it");
            if button.clicked() {
                actions.push(Action::FlyTo { id: other.clone() });
                actions.push(Action::SelectNode {
                    id: Some(other.clone()),
                });
            }
        }
    }
}

fn media_row(ui: &mut egui::Ui, item: &MediaItem) {
    ui.horizontal_wrapped(|ui| {
        ui.label(RichText::new(item.kind.label()).small().monospace());
        ui.hyperlink_to(item.title.as_str(), &item.url);
        let meta: Vec<String> = item
            .year
            .map(|y| y.to_string())
            .into_iter()
            .chain(item.source.clone())
            .collect();
        if !meta.is_empty() {
            ui.label(RichText::new(meta.join(" · ")).small().weak());
        }
    });
    if let Some(description) = &item.description {
        ui.label(RichText::new(description).small());
    }
}

fn legend(ui: &mut egui::Ui, state: &mut State) {
    ui.heading("Explore");
    ui.label("Click a node to open it. Drag to orbit, scroll to zoom.");
    ui.separator();
    for entry in state.cache.legend.get(&state.store) {
        ui.horizontal(|ui| {
            ui.label(RichText::new("●").color(color32(entry.color, 1.0)));
            ui.label(&entry.label);
            ui.label(
                RichText::new(format!("{} methodologies", entry.methodologies))
                    .small()
                    .weak(),
            );
        });
    }
}

pub fn toasts(ctx: &egui::Context, state: &mut State) {
    if state.store.toasts.is_empty() {
        return;
    }
    let mut dismissed = None;

    egui::Area::new(egui::Id::new("toasts"))
        .anchor(Align2::RIGHT_BOTTOM, [-12.0, -48.0])
        .show(ctx, |ui| {
            for (index, active) in state.store.toasts.iter().enumerate() {
                let color = match active.toast.level {
                    ToastLevel::Warning => Color32::from_rgb(240, 180, 60),
                    ToastLevel::Error => Color32::from_rgb(235, 90, 80),
                };
                egui::Frame::popup(ui.style()).show(ui, |ui| {
                    ui.set_max_width(360.0);
                    ui.horizontal(|ui| {
                        ui.colored_label(color, &active.toast.message);
                        if ui.small_button("✕").clicked() {
                            dismissed = Some(index);
                        }
                    });
                });
            }
        });

    if let Some(index) = dismissed {
        state.dispatch(Action::DismissToast { index });
    }
}

pub fn stats_window(ctx: &egui::Context, state: &mut State) {
    if !state.store.show_stats {
        return;
    }
    let stats = state.store.scene.stats();
    let mut close = false;

    egui::Window::new("Scene stats")
        .resizable(false)
        .anchor(Align2::LEFT_BOTTOM, [12.0, -48.0])
        .show(ctx, |ui| {
            egui::Grid::new("stats_grid").num_columns(2).show(ui, |ui| {
                ui.label("Live nodes");
                ui.label(format!("{} / {}", stats.live_nodes, stats.ceiling));
                ui.end_row();
                ui.label("Connections");
                ui.label(stats.structural_connections.to_string());
                ui.end_row();
                ui.label("Cross-pillar links");
                ui.label(stats.cross_pillar_links.to_string());
                ui.end_row();
                ui.label("Expanded");
                ui.label(stats.expanded.to_string());
                ui.end_row();
                ui.label("GPU resources");
                ui.label(stats.live_resources.to_string());
                ui.end_row();
                ui.label("Camera");
                ui.label(format!("{:?}", stats.flight_phase));
                ui.end_row();
            });
            if ui.button("Close").clicked() {
                close = true;
            }
        });

    if close {
        state.dispatch(Action::SetShowStats { show: false });
    }
}

pub fn error_window(ctx: &egui::Context, state: &mut State) {
    let Some(error) = state.store.error_message.clone() else {
        return;
    };
    egui::Window::new("Error")
        .collapsible(false)
        .resizable(false)
        .show(ctx, |ui| {
            ui.label(&error);
            if ui.button("OK").clicked() {
                state.dispatch(Action::ClearErrorMessage);
            }
        });
}
