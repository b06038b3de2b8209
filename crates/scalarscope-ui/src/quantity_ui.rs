//! Quantity-specific UI builders.

use egui::Ui;
use scalarscope_core::{DataType, DisplayRange, ImageOrigin, MeshElement, ScalarMapping};
use scalarscope_render::{ColorMapRegistry, TextureFilter};

use crate::histogram_ui::{histogram_range_widget, HistogramEdit};

/// Which parts of a scalar quantity's state the UI changed this frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScalarUiChanges {
    pub enabled: bool,
    pub color_map: bool,
    pub data_type: bool,
    pub range: bool,
    pub isolines: bool,
}

impl ScalarUiChanges {
    pub fn any(&self) -> bool {
        self.enabled || self.color_map || self.data_type || self.range || self.isolines
    }

    /// True when the shader program has to be rebuilt.
    pub fn program_stale(&self) -> bool {
        self.color_map || self.data_type
    }
}

/// Builds the enable checkbox and, when enabled, the full option panel of a scalar quantity.
pub fn build_scalar_quantity_ui(
    ui: &mut Ui,
    label: &str,
    enabled: &mut bool,
    mapping: &mut ScalarMapping,
    color_maps: &ColorMapRegistry,
) -> ScalarUiChanges {
    let mut changes = ScalarUiChanges::default();

    ui.horizontal(|ui| {
        if ui.checkbox(enabled, label).changed() {
            changes.enabled = true;
        }
    });

    if *enabled {
        ui.indent(label, |ui| {
            let options = build_scalar_options_ui(ui, label, mapping, color_maps);
            changes = ScalarUiChanges {
                enabled: changes.enabled,
                ..options
            };
        });
    }

    changes
}

/// Builds the colormap, data type, range and isoline controls.
pub fn build_scalar_options_ui(
    ui: &mut Ui,
    id_salt: &str,
    mapping: &mut ScalarMapping,
    color_maps: &ColorMapRegistry,
) -> ScalarUiChanges {
    let mut changes = ScalarUiChanges::default();

    ui.horizontal(|ui| {
        let mut color_map = mapping.color_map().to_string();
        egui::ComboBox::new((id_salt, "colormap"), "Colormap")
            .selected_text(color_map.as_str())
            .show_ui(ui, |ui| {
                for name in color_maps.names() {
                    ui.selectable_value(&mut color_map, name.to_string(), name);
                }
            });
        if color_map != mapping.color_map() {
            log::debug!("{id_salt}: colormap {} -> {color_map}", mapping.color_map());
            mapping.set_color_map(color_map);
            changes.color_map = true;
        }

        let mut data_type = mapping.data_type();
        egui::ComboBox::new((id_salt, "data_type"), "Data")
            .selected_text(data_type.label())
            .show_ui(ui, |ui| {
                for option in DataType::ALL {
                    ui.selectable_value(&mut data_type, option, option.label());
                }
            });
        if data_type != mapping.data_type() {
            log::debug!("{id_salt}: data type set to {}", data_type.label());
            mapping.set_data_type(data_type);
            changes.data_type = true;
            changes.color_map = true;
            changes.range = true;
        }
    });

    let edit = histogram_range_widget(
        ui,
        mapping.histogram(),
        mapping.map_range(),
        mapping.data_type(),
        color_maps.get(mapping.color_map()),
    );
    match edit {
        HistogramEdit::Range(range) => {
            mapping.set_map_range(range);
            changes.range = true;
        }
        HistogramEdit::Reset => {
            mapping.reset_map_range();
            changes.range = true;
        }
        HistogramEdit::None => {}
    }

    ui.horizontal(|ui| {
        let range = mapping.map_range();
        let (mut lo, mut hi) = (range.lo, range.hi);
        let speed = (range.width().abs() * 0.005).max(1e-6);
        let lo_changed = ui
            .add_enabled(
                mapping.data_type() == DataType::Standard,
                egui::DragValue::new(&mut lo).speed(speed),
            )
            .changed();
        ui.label("–");
        let hi_changed = ui.add(egui::DragValue::new(&mut hi).speed(speed)).changed();
        if lo_changed || hi_changed {
            let requested = match mapping.data_type() {
                DataType::Symmetric => DisplayRange { lo: -hi.abs(), hi: hi.abs() },
                _ => DisplayRange::new(lo, hi),
            };
            mapping.set_map_range(requested);
            changes.range = true;
        }
        if ui.button("Reset").clicked() {
            mapping.reset_map_range();
            changes.range = true;
        }
    });

    ui.horizontal(|ui| {
        let mut isolines = mapping.isolines_enabled();
        if ui.checkbox(&mut isolines, "Isolines").changed() {
            mapping.set_isolines_enabled(isolines);
            changes.isolines = true;
        }
        if isolines {
            let mut width = mapping.isoline_width();
            let speed = (width * 0.01).max(1e-6);
            if ui
                .add(
                    egui::DragValue::new(&mut width)
                        .speed(speed)
                        .range(1e-6..=f32::MAX)
                        .prefix("width "),
                )
                .changed()
            {
                mapping.set_isoline_width(width);
                changes.isolines = true;
            }
            let mut darkness = mapping.isoline_darkness();
            if ui
                .add(egui::Slider::new(&mut darkness, 0.0..=1.0).text("darkness"))
                .changed()
            {
                mapping.set_isoline_darkness(darkness);
                changes.isolines = true;
            }
        }
    });

    changes
}

/// Builds the sampling controls of a texture-backed scalar. Returns true if anything changed.
pub fn build_texture_options_ui(
    ui: &mut Ui,
    id_salt: &str,
    origin: &mut ImageOrigin,
    filter: &mut TextureFilter,
) -> bool {
    let mut changed = false;

    ui.horizontal(|ui| {
        let origin_label = |o: ImageOrigin| match o {
            ImageOrigin::UpperLeft => "upper left",
            ImageOrigin::LowerLeft => "lower left",
        };
        egui::ComboBox::new((id_salt, "origin"), "Origin")
            .selected_text(origin_label(*origin))
            .show_ui(ui, |ui| {
                for option in [ImageOrigin::UpperLeft, ImageOrigin::LowerLeft] {
                    if ui
                        .selectable_value(origin, option, origin_label(option))
                        .changed()
                    {
                        changed = true;
                    }
                }
            });

        let filter_label = |f: TextureFilter| match f {
            TextureFilter::Linear => "linear",
            TextureFilter::Nearest => "nearest",
        };
        egui::ComboBox::new((id_salt, "filter"), "Filter")
            .selected_text(filter_label(*filter))
            .show_ui(ui, |ui| {
                for option in [TextureFilter::Linear, TextureFilter::Nearest] {
                    if ui
                        .selectable_value(filter, option, filter_label(option))
                        .changed()
                    {
                        changed = true;
                    }
                }
            });
    });

    changed
}

/// Shows the value a quantity holds at a picked element.
pub fn build_element_info_ui(ui: &mut Ui, nice_name: &str, element: MeshElement, value: Option<f32>) {
    ui.horizontal(|ui| {
        ui.label(nice_name);
        match value {
            Some(v) => ui.label(format!("{v:.6}")),
            None => ui.weak(format!("no value at {} {}", element.kind(), element.index())),
        };
    });
}
