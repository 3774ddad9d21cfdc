//! Text labels drawn as camera-facing sprites.

use glam::Vec2;
use stagecraft_common::Color;

/// Padding around the label text, in canvas pixels.
pub const BORDER_SIZE: f32 = 2.0;

/// World units per canvas pixel, before the sprite's 2x enlargement.
pub const LABEL_BASE_SCALE: f32 = 0.01;

/// Measures rendered text width in pixels.
pub trait MeasureText {
    fn text_width(&self, text: &str, font_size: f32) -> f32;
}

/// Monospace approximation: every glyph advances `ratio * font_size`.
#[derive(Debug, Clone, Copy)]
pub struct FixedAdvance(pub f32);

impl Default for FixedAdvance {
    fn default() -> Self {
        Self(0.6)
    }
}

impl MeasureText for FixedAdvance {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * self.0
    }
}

/// Pixel size of a label canvas and the horizontal squeeze applied to its text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LabelCanvas {
    pub width: f32,
    pub height: f32,
    /// In `(0, 1]`: text wider than the base width is squeezed, never stretched.
    pub scale_factor: f32,
}

/// Size a label canvas for text of the given measured width.
pub fn make_label_canvas(base_width: f32, size: f32, text_width: f32) -> LabelCanvas {
    let double_border = BORDER_SIZE * 2.0;
    let scale_factor = if text_width > 0.0 {
        (base_width / text_width).min(1.0)
    } else {
        1.0
    };
    LabelCanvas {
        width: base_width + double_border,
        height: size + double_border,
        scale_factor,
    }
}

/// A text label: blue plate with white text by default.
#[derive(Debug, Clone, PartialEq)]
pub struct Label {
    pub text: String,
    pub base_width: f32,
    pub font_size: f32,
    pub background: Color,
    pub text_color: Color,
}

impl Label {
    pub fn new(text: impl Into<String>, base_width: f32, font_size: f32) -> Self {
        Self {
            text: text.into(),
            base_width,
            font_size,
            background: Color::BLUE,
            text_color: Color::WHITE,
        }
    }

    pub fn canvas(&self, measure: &dyn MeasureText) -> LabelCanvas {
        let text_width = measure.text_width(&self.text, self.font_size);
        make_label_canvas(self.base_width, self.font_size, text_width)
    }

    /// World-space sprite size. Independent of the text, only the canvas box matters.
    pub fn sprite_scale(&self) -> Vec2 {
        let canvas = make_label_canvas(self.base_width, self.font_size, 0.0);
        Vec2::new(canvas.width, canvas.height) * LABEL_BASE_SCALE * 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Exact(f32);

    impl MeasureText for Exact {
        fn text_width(&self, _text: &str, _font_size: f32) -> f32 {
            self.0
        }
    }

    #[test]
    fn canvas_adds_border() {
        let canvas = make_label_canvas(150.0, 32.0, 100.0);
        assert_eq!(canvas.width, 154.0);
        assert_eq!(canvas.height, 36.0);
        assert_eq!(canvas.scale_factor, 1.0);
    }

    #[test]
    fn wide_text_is_squeezed_not_stretched() {
        let label = Label::new("a very long label that will not fit", 150.0, 32.0);
        let canvas = label.canvas(&Exact(300.0));
        assert_eq!(canvas.scale_factor, 0.5);
        let narrow = label.canvas(&Exact(10.0));
        assert_eq!(narrow.scale_factor, 1.0);
    }

    #[test]
    fn empty_text_keeps_unit_scale() {
        let label = Label::new("", 150.0, 32.0);
        assert_eq!(label.canvas(&FixedAdvance::default()).scale_factor, 1.0);
    }

    #[test]
    fn sprite_scale_from_canvas() {
        let label = Label::new("MegaCube", 150.0, 32.0);
        let s = label.sprite_scale();
        assert!((s.x - 3.08).abs() < 1e-5);
        assert!((s.y - 0.72).abs() < 1e-5);
        assert_eq!(label.background, Color::BLUE);
        assert_eq!(label.text_color, Color::WHITE);
    }

    #[test]
    fn fixed_advance_counts_chars() {
        let m = FixedAdvance(0.5);
        assert_eq!(m.text_width("Bowling", 32.0), 7.0 * 16.0);
    }
}
