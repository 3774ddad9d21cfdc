use stagecraft_common::{Color, ColorError};

/// Exposes a color as a `#rrggbb` string for color-picker widgets.
pub struct ColorBinding<'a> {
    color: &'a mut Color,
}

impl<'a> ColorBinding<'a> {
    pub fn new(color: &'a mut Color) -> Self {
        Self { color }
    }

    pub fn value(&self) -> String {
        format!("#{}", self.color.hex_string())
    }

    /// Parse and store. On error the bound color is left untouched.
    pub fn set_value(&mut self, value: &str) -> Result<(), ColorError> {
        *self.color = Color::parse(value)?;
        Ok(())
    }
}

/// Edits a (min, max) pair while keeping `max >= min + min_dif`.
///
/// Raising `min` drags `max` along; lowering `max` below the gap pushes it
/// back up rather than moving `min`.
pub struct MinMaxBinding<'a> {
    min: &'a mut f32,
    max: &'a mut f32,
    min_dif: f32,
}

impl<'a> MinMaxBinding<'a> {
    pub fn new(min: &'a mut f32, max: &'a mut f32, min_dif: f32) -> Self {
        Self { min, max, min_dif }
    }

    pub fn min(&self) -> f32 {
        *self.min
    }

    pub fn max(&self) -> f32 {
        *self.max
    }

    pub fn set_min(&mut self, v: f32) {
        *self.min = v;
        *self.max = self.max.max(v + self.min_dif);
    }

    pub fn set_max(&mut self, v: f32) {
        *self.max = v;
        self.set_min(self.min());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_value_round_trips_hex() {
        let mut c = Color::from_hex(0x404040);
        let mut binding = ColorBinding::new(&mut c);
        assert_eq!(binding.value(), "#404040");
        binding.set_value("#ff8000").unwrap();
        assert_eq!(binding.value(), "#ff8000");
        assert_eq!(c.to_hex(), 0xff8000);
    }

    #[test]
    fn bad_color_keeps_previous() {
        let mut c = Color::WHITE;
        let mut binding = ColorBinding::new(&mut c);
        assert!(binding.set_value("#nothex").is_err());
        assert_eq!(c, Color::WHITE);
    }

    #[test]
    fn raising_min_pushes_max() {
        let (mut near, mut far) = (0.1, 5.0);
        let mut b = MinMaxBinding::new(&mut near, &mut far, 0.1);
        b.set_min(10.0);
        assert_eq!(b.min(), 10.0);
        assert!((b.max() - 10.1).abs() < 1e-6);
    }

    #[test]
    fn lowering_min_keeps_max() {
        let (mut near, mut far) = (5.0, 100.0);
        let mut b = MinMaxBinding::new(&mut near, &mut far, 0.1);
        b.set_min(1.0);
        assert_eq!((near, far), (1.0, 100.0));
    }

    #[test]
    fn max_below_gap_is_pushed_back() {
        let (mut near, mut far) = (20.0, 100.0);
        let mut b = MinMaxBinding::new(&mut near, &mut far, 0.1);
        b.set_max(5.0);
        assert_eq!(b.min(), 20.0);
        assert!((b.max() - 20.1).abs() < 1e-5);
    }

    #[test]
    fn max_above_gap_is_kept() {
        let (mut near, mut far) = (0.1, 100.0);
        let mut b = MinMaxBinding::new(&mut near, &mut far, 0.1);
        b.set_max(30.0);
        assert_eq!((b.min(), b.max()), (0.1, 30.0));
    }
}
