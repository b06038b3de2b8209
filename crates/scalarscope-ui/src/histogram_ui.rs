//! Histogram widget with draggable display-range handles.

use egui::{pos2, vec2, Color32, Rect, Sense, Stroke, Ui};
use scalarscope_core::{DataType, DisplayRange, Histogram};
use scalarscope_render::ColorMap;

const HISTOGRAM_HEIGHT: f32 = 60.0;
const HANDLE_GRAB_RADIUS: f32 = 6.0;

/// What a drag on the histogram is moving.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DragTarget {
    Lower,
    Upper,
    Window,
}

/// Outcome of one frame of [`histogram_range_widget`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum HistogramEdit {
    None,
    /// The user moved the range.
    Range(DisplayRange),
    /// The user asked for the default range back (double click).
    Reset,
}

/// Value span shown on the horizontal axis: the data and the current range together.
fn view_span(histogram: &Histogram, range: DisplayRange) -> (f32, f32) {
    let data = histogram.data_range();
    let lo = data.lo.min(range.lo);
    let hi = data.hi.max(range.hi);
    if hi - lo > 0.0 && (hi - lo).is_finite() {
        (lo, hi)
    } else {
        (lo - 0.5, lo + 0.5)
    }
}

fn to_color32(c: scalarscope_core::Vec3) -> Color32 {
    let channel = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
    Color32::from_rgb(channel(c.x), channel(c.y), channel(c.z))
}

/// Draws the density histogram with the display range overlaid.
///
/// Dragging near a range edge moves that edge; dragging elsewhere slides the window.
/// Symmetric data moves both edges together and magnitude data only exposes the upper
/// edge, so the returned range already satisfies `data_type`. Every drag is clamped to
/// the data extent.
pub fn histogram_range_widget(
    ui: &mut Ui,
    histogram: &Histogram,
    range: DisplayRange,
    data_type: DataType,
    color_map: Option<&ColorMap>,
) -> HistogramEdit {
    let width = ui.available_width().max(100.0);
    let (rect, response) =
        ui.allocate_exact_size(vec2(width, HISTOGRAM_HEIGHT), Sense::click_and_drag());
    let (view_lo, view_hi) = view_span(histogram, range);
    let to_x = |v: f32| rect.left() + (v - view_lo) / (view_hi - view_lo) * rect.width();
    let to_value = |x: f32| view_lo + (x - rect.left()) / rect.width() * (view_hi - view_lo);

    if ui.is_rect_visible(rect) {
        let painter = ui.painter_at(rect);
        painter.rect_filled(rect, 2.0, ui.visuals().extreme_bg_color);

        // Buckets, colored by where their center lands in the current range
        let data = histogram.data_range();
        let bucket_width = data.width() / histogram.buckets().len() as f32;
        for [center, height] in histogram.curve() {
            let x0 = to_x(center - bucket_width * 0.5);
            let x1 = to_x(center + bucket_width * 0.5).max(x0 + 1.0);
            let top = rect.bottom() - height * (rect.height() - 4.0);
            let t = scalarscope_core::normalize(center, range, data_type);
            let color = color_map.map_or(Color32::GRAY, |map| to_color32(map.sample(t)));
            painter.rect_filled(
                Rect::from_min_max(pos2(x0, top), pos2(x1, rect.bottom())),
                0.0,
                color,
            );
        }

        if let Some(highlight) = histogram.highlight() {
            painter.rect_filled(
                Rect::from_min_max(
                    pos2(to_x(highlight.lo), rect.top()),
                    pos2(to_x(highlight.hi), rect.bottom()),
                ),
                0.0,
                Color32::from_rgba_unmultiplied(255, 255, 255, 40),
            );
        }

        // Shade what lies outside the range
        let shade = Color32::from_black_alpha(110);
        let lo_x = to_x(range.lo).clamp(rect.left(), rect.right());
        let hi_x = to_x(range.hi).clamp(rect.left(), rect.right());
        painter.rect_filled(
            Rect::from_min_max(rect.left_top(), pos2(lo_x, rect.bottom())),
            0.0,
            shade,
        );
        painter.rect_filled(
            Rect::from_min_max(pos2(hi_x, rect.top()), rect.right_bottom()),
            0.0,
            shade,
        );
        let stroke = Stroke::new(2.0, ui.visuals().strong_text_color());
        for x in [lo_x, hi_x] {
            painter.line_segment([pos2(x, rect.top()), pos2(x, rect.bottom())], stroke);
        }
    }

    if response.double_clicked() {
        return HistogramEdit::Reset;
    }

    let id = response.id;
    if response.drag_started() {
        let grab = ui
            .input(|i| i.pointer.press_origin())
            .or_else(|| response.interact_pointer_pos());
        if let Some(pointer) = grab {
            let near = |v: f32| (to_x(v) - pointer.x).abs() <= HANDLE_GRAB_RADIUS;
            let target = match data_type {
                DataType::Magnitude if near(range.hi) => DragTarget::Upper,
                DataType::Magnitude => DragTarget::Window,
                _ if near(range.lo) => DragTarget::Lower,
                _ if near(range.hi) => DragTarget::Upper,
                _ => DragTarget::Window,
            };
            ui.memory_mut(|m| m.data.insert_temp(id, target));
        }
    }

    if !response.dragged() {
        return HistogramEdit::None;
    }
    let target = ui
        .memory(|m| m.data.get_temp::<DragTarget>(id))
        .unwrap_or(DragTarget::Window);
    let Some(pointer) = response.interact_pointer_pos() else {
        return HistogramEdit::None;
    };
    let value = to_value(pointer.x);

    let updated = match (data_type, target) {
        (DataType::Symmetric, DragTarget::Lower | DragTarget::Upper) => {
            histogram.drag_symmetric(value)
        }
        (DataType::Magnitude, DragTarget::Upper) => histogram.drag_magnitude(value),
        (DataType::Magnitude | DataType::Symmetric, DragTarget::Window) => return HistogramEdit::None,
        (DataType::Standard, DragTarget::Lower) => histogram.drag_lower(range, value),
        (DataType::Standard, DragTarget::Upper) => histogram.drag_upper(range, value),
        (DataType::Standard, DragTarget::Window) => {
            let units_per_px = (view_hi - view_lo) / rect.width();
            histogram.drag_window(range, response.drag_delta().x * units_per_px)
        }
        (DataType::Magnitude, DragTarget::Lower) => return HistogramEdit::None,
    };

    if updated == range {
        HistogramEdit::None
    } else {
        HistogramEdit::Range(updated)
    }
}
