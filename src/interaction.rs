use egui::{Rect, Vec2};

/// Limits a drag/resize driver must respect.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InteractionConstraints {
    pub min_size: Vec2,
    /// Width and height move together at the artwork's aspect ratio.
    pub preserve_aspect: bool,
    pub aspect: f32,
}

impl InteractionConstraints {
    /// Applies the size floor and, if enabled, the aspect lock. The dominant
    /// axis is the one that changed the most relative to `current`.
    pub fn constrain(&self, current: Vec2, requested: Vec2) -> Vec2 {
        let mut size = requested;
        if self.preserve_aspect && self.aspect > 0.0 {
            let rel_w = relative_change(current.x, requested.x);
            let rel_h = relative_change(current.y, requested.y);
            if rel_h > rel_w {
                size.x = size.y * self.aspect;
            } else {
                size.y = size.x / self.aspect;
            }
            if size.x < self.min_size.x || size.y < self.min_size.y {
                let scale = (self.min_size.x / size.x.max(f32::EPSILON))
                    .max(self.min_size.y / size.y.max(f32::EPSILON));
                size *= scale;
            }
        } else {
            size = size.max(self.min_size);
        }
        size
    }
}

fn relative_change(from: f32, to: f32) -> f32 {
    if from <= 0.0 {
        return f32::INFINITY;
    }
    (to / from - 1.0).abs()
}

/// A resize gesture in the shape drag/resize libraries report it: the new
/// size plus how far the left and top edges moved.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ResizeEvent {
    pub new_size: Vec2,
    pub delta_left: f32,
    pub delta_top: f32,
}

/// Anything that can be dragged and resized by a pointer. The overlay
/// engine implements this; UI code only drives it through this trait.
pub trait DraggableResizable {
    fn constraints(&self) -> InteractionConstraints;

    fn on_move(&mut self, delta: Vec2);

    fn on_resize(&mut self, event: ResizeEvent);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ResizeHandle {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl ResizeHandle {
    pub const ALL: [ResizeHandle; 4] = [
        ResizeHandle::TopLeft,
        ResizeHandle::TopRight,
        ResizeHandle::BottomLeft,
        ResizeHandle::BottomRight,
    ];

    pub fn moves_left(self) -> bool {
        matches!(self, ResizeHandle::TopLeft | ResizeHandle::BottomLeft)
    }

    pub fn moves_top(self) -> bool {
        matches!(self, ResizeHandle::TopLeft | ResizeHandle::TopRight)
    }

    pub fn position(self, rect: Rect) -> egui::Pos2 {
        match self {
            ResizeHandle::TopLeft => rect.left_top(),
            ResizeHandle::TopRight => rect.right_top(),
            ResizeHandle::BottomLeft => rect.left_bottom(),
            ResizeHandle::BottomRight => rect.right_bottom(),
        }
    }

    /// Turns a pointer drag of this corner into a constrained resize event.
    /// The corner opposite the handle stays put.
    pub fn resize_event(
        self,
        rect: Rect,
        drag: Vec2,
        constraints: &InteractionConstraints,
    ) -> ResizeEvent {
        let grow = Vec2::new(
            if self.moves_left() { -drag.x } else { drag.x },
            if self.moves_top() { -drag.y } else { drag.y },
        );
        let size = constraints.constrain(rect.size(), rect.size() + grow);
        ResizeEvent {
            new_size: size,
            delta_left: if self.moves_left() { rect.width() - size.x } else { 0.0 },
            delta_top: if self.moves_top() { rect.height() - size.y } else { 0.0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use egui::Pos2;

    fn constraints(preserve_aspect: bool) -> InteractionConstraints {
        InteractionConstraints {
            min_size: Vec2::splat(50.0),
            preserve_aspect,
            aspect: 2.0,
        }
    }

    #[test]
    fn test_aspect_lock_follows_dominant_axis() {
        let c = constraints(true);
        let current = Vec2::new(200.0, 100.0);
        assert_eq!(c.constrain(current, Vec2::new(300.0, 110.0)), Vec2::new(300.0, 150.0));
        assert_eq!(c.constrain(current, Vec2::new(210.0, 200.0)), Vec2::new(400.0, 200.0));
    }

    #[test]
    fn test_floor_keeps_ratio() {
        let c = constraints(true);
        let size = c.constrain(Vec2::new(200.0, 100.0), Vec2::new(60.0, 30.0));
        assert!((size.x - 100.0).abs() < 1e-3);
        assert!((size.y - 50.0).abs() < 1e-3);

        let free = constraints(false).constrain(Vec2::new(200.0, 100.0), Vec2::new(10.0, 80.0));
        assert_eq!(free, Vec2::new(50.0, 80.0));
    }

    #[test]
    fn test_top_left_handle_anchors_bottom_right() {
        let rect = Rect::from_min_size(Pos2::new(100.0, 100.0), Vec2::new(200.0, 100.0));
        let event = ResizeHandle::TopLeft.resize_event(rect, Vec2::new(-100.0, 0.0), &constraints(true));
        assert_eq!(event.new_size, Vec2::new(300.0, 150.0));
        assert_eq!(event.delta_left, -100.0);
        assert_eq!(event.delta_top, -50.0);
    }

    #[test]
    fn test_bottom_right_handle_keeps_origin() {
        let rect = Rect::from_min_size(Pos2::ZERO, Vec2::new(200.0, 100.0));
        let event = ResizeHandle::BottomRight.resize_event(rect, Vec2::new(20.0, 0.0), &constraints(true));
        assert_eq!(event.new_size, Vec2::new(220.0, 110.0));
        assert_eq!(event.delta_left, 0.0);
        assert_eq!(event.delta_top, 0.0);
    }
}
