use eframe::egui::{Color32, Painter, Pos2, Rect, Stroke, Vec2};

pub(super) fn blend_color(base: Color32, overlay: Color32, amount: f32) -> Color32 {
    let amount = amount.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * amount) as u8;

    Color32::from_rgba_unmultiplied(
        mix(base.r(), overlay.r()),
        mix(base.g(), overlay.g()),
        mix(base.b(), overlay.b()),
        mix(base.a(), overlay.a()),
    )
}

pub(super) fn dim_color(color: Color32, factor: f32) -> Color32 {
    let factor = factor.clamp(0.0, 1.0);
    Color32::from_rgba_unmultiplied(
        (color.r() as f32 * factor) as u8,
        (color.g() as f32 * factor) as u8,
        (color.b() as f32 * factor) as u8,
        color.a(),
    )
}

pub(super) fn draw_background(painter: &Painter, rect: Rect) {
    painter.rect_filled(rect, 0.0, Color32::from_rgb(17, 20, 27));
}

/// Concentric guides at every multiple of the ring spacing around the origin.
pub(super) fn draw_rings(
    painter: &Painter,
    rect: Rect,
    pan: Vec2,
    zoom: f32,
    radius_step: f32,
    rings: usize,
) {
    let center = world_to_screen(rect, pan, zoom, Vec2::ZERO);
    for ring in 1..=rings {
        let radius = ring as f32 * radius_step * zoom;
        let alpha = (70 - (ring as i32 * 12)).max(24) as u8;
        painter.circle_stroke(
            center,
            radius,
            Stroke::new(1.0, Color32::from_rgba_unmultiplied(90, 110, 130, alpha)),
        );
    }
}

pub(super) fn circle_visible(rect: Rect, position: Pos2, radius: f32) -> bool {
    rect.expand(radius).contains(position)
}

pub(super) fn segment_visible(rect: Rect, start: Pos2, end: Pos2) -> bool {
    Rect::from_two_pos(start, end).intersects(rect)
}

pub(super) fn world_to_screen(rect: Rect, pan: Vec2, zoom: f32, world: Vec2) -> Pos2 {
    rect.center() + pan + world * zoom
}

pub(super) fn screen_to_world(rect: Rect, pan: Vec2, zoom: f32, screen: Pos2) -> Vec2 {
    (screen - rect.center() - pan) / zoom
}

fn normalize_log(value: f64, min: f64, max: f64) -> f32 {
    let min = (min.max(0.0) + 1.0).ln();
    let max = (max.max(0.0) + 1.0).ln();
    let value = (value.max(0.0) + 1.0).ln();

    let span = max - min;
    if span.abs() < f64::EPSILON {
        return 0.5;
    }
    ((value - min) / span).clamp(0.0, 1.0) as f32
}

pub(super) fn node_radius(traffic: f64, min: f64, max: f64) -> f32 {
    5.0 + normalize_log(traffic, min, max) * 18.0
}

pub(super) fn traffic_color(traffic: f64, min: f64, max: f64) -> Color32 {
    let t = normalize_log(traffic, min, max);
    Color32::from_rgb(
        (70.0 + 150.0 * t) as u8,
        (140.0 - 40.0 * t) as u8,
        (210.0 - 140.0 * t) as u8,
    )
}

pub(super) fn link_width(total: f64, min: f64, max: f64) -> f32 {
    0.8 + normalize_log(total, min, max) * 4.2
}

/// `ratio` 1 is all upstream, 0 all downstream.
pub(super) fn ratio_color(ratio: f64) -> Color32 {
    let up = Color32::from_rgb(96, 200, 140);
    let down = Color32::from_rgb(226, 110, 96);
    blend_color(down, up, ratio as f32)
}

#[cfg(test)]
mod tests {
    use eframe::egui::{pos2, vec2};

    use super::*;

    #[test]
    fn screen_and_world_are_inverse() {
        let rect = Rect::from_min_size(pos2(0.0, 0.0), vec2(800.0, 600.0));
        let pan = vec2(30.0, -12.0);
        let world = vec2(120.0, -45.0);

        let screen = world_to_screen(rect, pan, 1.7, world);
        let back = screen_to_world(rect, pan, 1.7, screen);
        assert!((back - world).length() < 1e-3);
    }

    #[test]
    fn flat_range_maps_to_middle_size() {
        assert_eq!(node_radius(10.0, 10.0, 10.0), 5.0 + 0.5 * 18.0);
        assert_eq!(node_radius(0.0, 0.0, 1000.0), 5.0);
        assert_eq!(node_radius(1000.0, 0.0, 1000.0), 23.0);
    }

    #[test]
    fn ratio_color_ends() {
        assert_eq!(ratio_color(1.0), Color32::from_rgb(96, 200, 140));
        assert_eq!(ratio_color(0.0), Color32::from_rgb(226, 110, 96));
    }
}
