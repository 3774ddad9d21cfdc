use glam::Vec2;

/// A camera action produced from pointer input.
///
/// Window backends emit actions; the orbit controls consume them and never
/// see raw events.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Orbit by a pointer delta in pixels.
    Rotate(Vec2),
    /// Pan by a pointer delta in pixels.
    Pan(Vec2),
    /// Dolly by wheel steps. Positive moves towards the target.
    Dolly(f32),
    Noop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Middle,
}

/// Tracks button state and the last cursor position.
#[derive(Debug, Clone, Default)]
pub struct PointerTracker {
    rotating: bool,
    panning: bool,
    last: Option<Vec2>,
    /// Set while another consumer (the GUI) owns the pointer.
    captured: bool,
}

impl PointerTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_captured(&mut self, captured: bool) {
        self.captured = captured;
        if captured {
            self.rotating = false;
            self.panning = false;
        }
    }

    pub fn is_captured(&self) -> bool {
        self.captured
    }

    pub fn is_dragging(&self) -> bool {
        self.rotating || self.panning
    }

    pub fn button(&mut self, button: PointerButton, pressed: bool) {
        if pressed && self.captured {
            return;
        }
        match button {
            PointerButton::Primary => self.rotating = pressed,
            PointerButton::Secondary | PointerButton::Middle => self.panning = pressed,
        }
    }

    /// Feed a cursor position; returns the action the drag produces.
    pub fn moved(&mut self, position: Vec2) -> Action {
        let delta = self.last.map(|last| position - last).unwrap_or(Vec2::ZERO);
        self.last = Some(position);
        if self.captured || delta == Vec2::ZERO {
            return Action::Noop;
        }
        if self.rotating {
            Action::Rotate(delta)
        } else if self.panning {
            Action::Pan(delta)
        } else {
            Action::Noop
        }
    }

    pub fn left(&mut self) {
        self.last = None;
        self.rotating = false;
        self.panning = false;
    }

    pub fn scroll(&self, lines: f32) -> Action {
        if self.captured || lines == 0.0 {
            Action::Noop
        } else {
            Action::Dolly(lines)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primary_drag_rotates() {
        let mut p = PointerTracker::new();
        assert_eq!(p.moved(Vec2::new(10.0, 10.0)), Action::Noop);
        p.button(PointerButton::Primary, true);
        assert_eq!(p.moved(Vec2::new(15.0, 8.0)), Action::Rotate(Vec2::new(5.0, -2.0)));
        p.button(PointerButton::Primary, false);
        assert_eq!(p.moved(Vec2::new(20.0, 8.0)), Action::Noop);
    }

    #[test]
    fn secondary_drag_pans() {
        let mut p = PointerTracker::new();
        p.moved(Vec2::ZERO);
        p.button(PointerButton::Secondary, true);
        assert_eq!(p.moved(Vec2::new(3.0, 4.0)), Action::Pan(Vec2::new(3.0, 4.0)));
        assert!(p.is_dragging());
    }

    #[test]
    fn captured_pointer_produces_nothing() {
        let mut p = PointerTracker::new();
        p.moved(Vec2::ZERO);
        p.set_captured(true);
        p.button(PointerButton::Primary, true);
        assert_eq!(p.moved(Vec2::new(5.0, 5.0)), Action::Noop);
        assert_eq!(p.scroll(1.0), Action::Noop);
        p.set_captured(false);
        assert_eq!(p.scroll(-1.0), Action::Dolly(-1.0));
    }

    #[test]
    fn leaving_window_resets_drag() {
        let mut p = PointerTracker::new();
        p.moved(Vec2::ZERO);
        p.button(PointerButton::Primary, true);
        p.left();
        assert!(!p.is_dragging());
        // first move after re-entry only records the position
        assert_eq!(p.moved(Vec2::new(50.0, 50.0)), Action::Noop);
    }
}
