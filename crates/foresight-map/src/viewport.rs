use eframe::egui::{self, Align2, Color32, FontId, Pos2, Sense, Shape, Stroke, Vec2};
use foresight_scene::camera::pick;
use foresight_scene::{Level, Pointer, Projection, Rgb, Vec3, Viewport};

use crate::actions::Action;
use crate::state::State;

const BACKGROUND: Color32 = Color32::from_rgb(7, 9, 18);
const TEXT: Color32 = Color32::from_rgb(225, 228, 240);
const ORBIT_SPEED: f32 = 0.008;
const ZOOM_SPEED: f32 = 0.0015;

pub fn color32(rgb: Rgb, alpha: f32) -> Color32 {
    Color32::from_rgba_unmultiplied(
        rgb.r,
        rgb.g,
        rgb.b,
        (alpha.clamp(0.0, 1.0) * 255.0).round() as u8,
    )
}

/// Paint the scene into all remaining space and turn mouse input into
/// actions. Returns the pointer position for the next frame step.
pub fn show(ui: &mut egui::Ui, state: &mut State) -> Option<Pointer> {
    let (response, painter) =
        ui.allocate_painter(ui.available_size(), Sense::click_and_drag());
    let rect = response.rect;
    painter.rect_filled(rect, 0.0, BACKGROUND);

    let scene = &state.store.scene;
    let rig = *scene.camera()?;
    let viewport = Viewport {
        width: rect.width(),
        height: rect.height(),
    };
    let projection = Projection::default();
    let to_screen = |p: Vec3| {
        projection
            .project(&rig, viewport, p)
            .map(|s| (rect.min + Vec2::new(s.x, s.y), s.depth))
    };

    // Edges first so nodes sit on top of them.
    for c in scene.connections().structural() {
        let (Some((a, _)), Some((b, _))) = (to_screen(c.from), to_screen(c.to)) else {
            continue;
        };
        painter.line_segment(
            [a, b],
            Stroke::new(1.0 + 2.0 * c.glow, color32(c.color, c.opacity)),
        );
        for p in c.particles.positions(c.from, c.to) {
            if let Some((at, _)) = to_screen(p) {
                painter.circle_filled(
                    at,
                    1.2 + c.glow,
                    color32(c.color.lerp(Rgb::WHITE, 0.6), c.opacity),
                );
            }
        }
    }

    for link in scene.connections().cross_pillar() {
        if let (Some((a, _)), Some((b, _))) = (to_screen(link.from), to_screen(link.to)) {
            painter.extend(Shape::dashed_line(
                &[a, b],
                Stroke::new(1.5, color32(link.color, link.opacity)),
                6.0,
                4.0,
            ));
        }
    }

    let mut visible: Vec<_> = scene
        .store()
        .iter()
        .filter_map(|node| to_screen(node.position).map(|(at, depth)| (node, at, depth)))
        .collect();
    visible.sort_by(|a, b| b.2.total_cmp(&a.2));

    let selected = scene.selected();
    let hovered = scene.hovered();
    for (node, at, depth) in visible {
        let radius = projection.pixels_per_unit(viewport, depth) * node.pick_radius();
        painter.circle_filled(at, radius, color32(node.color, 1.0));

        let is_selected = selected == Some(&node.id);
        let is_hovered = hovered == Some(&node.id);
        if is_selected {
            painter.circle_stroke(at, radius + 3.0, Stroke::new(2.0, Color32::WHITE));
        }
        let labelled = is_selected
            || is_hovered
            || (state.store.show_labels && node.level != Level::Media);
        if labelled {
            draw_label(&painter, at, radius, node.label(), node.level);
        }
    }

    // Input
    let mut actions = Vec::new();
    if response.dragged() {
        let delta = response.drag_delta();
        actions.push(Action::Orbit {
            yaw: -delta.x * ORBIT_SPEED,
            pitch: -delta.y * ORBIT_SPEED,
        });
    }
    if response.hovered() {
        let scroll = ui.input(|i| i.smooth_scroll_delta.y);
        if scroll != 0.0 {
            actions.push(Action::Zoom {
                factor: (-scroll * ZOOM_SPEED).exp(),
            });
        }
    }

    let pointer = response
        .hover_pos()
        .map(|pos| screen_pointer(projection, viewport, rect.min, pos));
    if response.clicked()
        && let Some(ray) = pointer.and_then(|p| p.resolve(Some(&rig)))
        && let Some(node) = pick(&ray, scene.store().iter())
    {
        actions.push(Action::ClickNode {
            id: node.id.clone(),
        });
    }
    if hovered.is_some() {
        ui.ctx().set_cursor_icon(egui::CursorIcon::PointingHand);
    }

    for action in actions {
        state.dispatch(action);
    }
    pointer
}

fn screen_pointer(
    projection: Projection,
    viewport: Viewport,
    origin: Pos2,
    pos: Pos2,
) -> Pointer {
    Pointer::Screen {
        x: pos.x - origin.x,
        y: pos.y - origin.y,
        viewport,
        projection,
    }
}

fn draw_label(painter: &egui::Painter, at: Pos2, radius: f32, text: &str, level: Level) {
    let size = match level {
        Level::Center => 18.0,
        Level::Pillar => 15.0,
        Level::Methodology => 13.0,
        Level::Media => 11.0,
    };
    painter.text(
        at + Vec2::new(0.0, radius + 4.0),
        Align2::CENTER_TOP,
        text,
        FontId::proportional(size),
        TEXT,
    );
}
