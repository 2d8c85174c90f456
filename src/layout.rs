use egui::{Pos2, Rect, Vec2};

use crate::debounce::Debouncer;
use crate::interaction::{DraggableResizable, InteractionConstraints, ResizeEvent};

/// Used until the artwork's real dimensions are known.
pub const FALLBACK_ASPECT: f32 = 4.0 / 3.0;

/// Where the artwork sits on the room image, in room-image display pixels.
/// `width`/`height` are `None` until the first layout.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct OverlayState {
    pub x: f32,
    pub y: f32,
    pub width: Option<f32>,
    pub height: Option<f32>,
    pub user_customized: bool,
}

impl OverlayState {
    pub fn rect(&self) -> Option<Rect> {
        Some(Rect::from_min_size(
            Pos2::new(self.x, self.y),
            Vec2::new(self.width?, self.height?),
        ))
    }

    fn set_rect(&mut self, rect: Rect) {
        self.x = rect.min.x;
        self.y = rect.min.y;
        self.width = Some(rect.width());
        self.height = Some(rect.height());
    }
}

fn sanitize_aspect(aspect: f32) -> f32 {
    if aspect.is_finite() && aspect > 0.0 {
        aspect
    } else {
        FALLBACK_ASPECT
    }
}

pub fn aspect_of(natural: Vec2) -> f32 {
    if natural.x > 0.0 && natural.y > 0.0 {
        natural.x / natural.y
    } else {
        FALLBACK_ASPECT
    }
}

/// Sizes and positions the artwork overlay on top of the room image.
///
/// Until the user drags or resizes the overlay it is auto-fitted: centred,
/// a fixed fraction of the room width. Once customized, the user's box is
/// kept across artwork switches and viewport changes and only adjusted as
/// far as needed to keep the artwork undistorted.
#[derive(Clone, Debug)]
pub struct OverlayLayoutEngine {
    fraction: f32,
    min_size: f32,
    preserve_aspect: bool,
    container: Vec2,
    aspect: f32,
    state: OverlayState,
    /// The box as the user last placed it. Ratio changes are derived from
    /// this, not from the displayed box, so switching back and forth between
    /// artworks never drifts.
    anchor: Option<Rect>,
    visible: bool,
}

impl OverlayLayoutEngine {
    pub fn new(fraction: f32, min_size: f32) -> Self {
        Self {
            fraction,
            min_size,
            preserve_aspect: true,
            container: Vec2::ZERO,
            aspect: FALLBACK_ASPECT,
            state: OverlayState::default(),
            anchor: None,
            visible: false,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn rect(&self) -> Option<Rect> {
        self.state.rect()
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_customized(&self) -> bool {
        self.state.user_customized
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn container(&self) -> Vec2 {
        self.container
    }

    pub fn set_preserve_aspect(&mut self, preserve_aspect: bool) {
        self.preserve_aspect = preserve_aspect;
    }

    pub fn set_fraction(&mut self, fraction: f32) {
        self.fraction = fraction;
    }

    /// Centred box `fraction` of the container width at `aspect`, never
    /// smaller than the size floor and never larger than the container.
    pub fn compute_default_layout(&self, container: Vec2, aspect: f32) -> Rect {
        let aspect = sanitize_aspect(aspect);
        let mut size = Vec2::new(container.x * self.fraction, container.x * self.fraction / aspect);
        if size.y > container.y && container.y > 0.0 {
            size *= container.y / size.y;
        }
        if size.x < self.min_size || size.y < self.min_size {
            size *= (self.min_size / size.x.max(f32::EPSILON))
                .max(self.min_size / size.y.max(f32::EPSILON));
        }
        if size.x > container.x || size.y > container.y {
            let fit = (container.x / size.x).min(container.y / size.y);
            if fit > 0.0 {
                size *= fit;
            }
        }
        Rect::from_min_size(((container - size) / 2.0).to_pos2(), size)
    }

    fn apply_default(&mut self) {
        let rect = self.compute_default_layout(self.container, self.aspect);
        self.state.set_rect(rect);
    }

    /// The room image got its first size, or the user returned to results.
    pub fn set_container(&mut self, container: Vec2) {
        if self.container == Vec2::ZERO || self.state.width.is_none() {
            self.container = container;
            if !self.state.user_customized {
                self.apply_default();
            }
        } else if self.container != container {
            self.on_viewport_resize(container);
        }
    }

    /// A different artwork is about to be shown. `aspect_hint` comes from
    /// catalog metadata when available; the real ratio arrives with
    /// [`Self::on_image_loaded`]. Without a hint a customized box is left
    /// untouched until then.
    pub fn begin_artwork(&mut self, aspect_hint: Option<f32>) {
        self.visible = false;
        match aspect_hint {
            Some(aspect) => self.apply_aspect(sanitize_aspect(aspect)),
            None if self.state.user_customized => {}
            None => self.apply_aspect(FALLBACK_ASPECT),
        }
    }

    pub fn on_image_loaded(&mut self, natural: Vec2) {
        self.apply_aspect(aspect_of(natural));
        self.visible = true;
    }

    /// A broken image must not leave the overlay hidden forever; show it at
    /// whatever ratio is current.
    pub fn on_image_failed(&mut self) {
        self.visible = true;
    }

    pub fn on_artwork_switch(&mut self, aspect: f32) {
        self.apply_aspect(sanitize_aspect(aspect));
    }

    fn apply_aspect(&mut self, aspect: f32) {
        self.aspect = aspect;
        if self.container == Vec2::ZERO {
            return;
        }
        let placed = self.anchor.or_else(|| self.rect());
        let Some(old) = placed.filter(|_| self.state.user_customized) else {
            self.apply_default();
            return;
        };

        // Keep the user's width, let the height follow the new artwork and
        // hold the centre where the user left it.
        let mut size = Vec2::new(old.width(), old.width() / aspect);
        if size.x < self.min_size || size.y < self.min_size {
            size *= (self.min_size / size.x).max(self.min_size / size.y);
        }
        let rect = Rect::from_center_size(old.center(), size);
        self.state.set_rect(self.keep_inside(rect));
    }

    pub fn on_user_drag(&mut self, delta: Vec2) {
        let Some(rect) = self.rect() else {
            return;
        };
        self.place(rect.translate(delta));
    }

    /// Applies a resize. An edge that moved (non-zero delta) is the dragged
    /// one, so the opposite edge stays anchored once constraints have been
    /// applied to the requested size.
    pub fn on_user_resize(&mut self, new_size: Vec2, delta_left: f32, delta_top: f32) {
        let Some(old) = self.rect() else {
            return;
        };
        let size = self.constraints().constrain(old.size(), new_size);
        let x = if delta_left != 0.0 { old.right() - size.x } else { old.left() };
        let y = if delta_top != 0.0 { old.bottom() - size.y } else { old.top() };
        self.place(Rect::from_min_size(Pos2::new(x, y), size));
    }

    fn place(&mut self, rect: Rect) {
        let rect = self.keep_inside(rect);
        self.state.set_rect(rect);
        self.anchor = Some(rect);
        self.state.user_customized = true;
    }

    pub fn on_viewport_resize(&mut self, container: Vec2) {
        if container.x <= 0.0 || container.y <= 0.0 {
            return;
        }
        let old_container = self.container;
        self.container = container;
        let customized = self.rect().filter(|_| self.state.user_customized);
        let (Some(old), true) = (customized, old_container.x > 0.0 && old_container.y > 0.0)
        else {
            self.apply_default();
            return;
        };

        let scale = Vec2::new(
            container.x / old_container.x,
            container.y / old_container.y,
        );
        self.anchor = self.anchor.map(|anchor| self.scale_box(anchor, scale));
        let rect = self.scale_box(old, scale);
        self.state.set_rect(self.keep_inside(rect));
    }

    // Position follows both axes, size follows the width so the ratio holds.
    fn scale_box(&self, rect: Rect, scale: Vec2) -> Rect {
        let width = (rect.width() * scale.x).max(self.min_size);
        let height = width * rect.height() / rect.width();
        Rect::from_min_size(
            Pos2::new(rect.left() * scale.x, rect.top() * scale.y),
            Vec2::new(width, height),
        )
    }

    /// Back to the pristine auto-fit state, e.g. when leaving the results.
    pub fn reset(&mut self) {
        self.state = OverlayState::default();
        self.anchor = None;
        self.aspect = FALLBACK_ASPECT;
        self.container = Vec2::ZERO;
        self.visible = false;
    }

    // Shifts the box back into the container; a box larger than the container
    // is pinned to the top-left.
    fn keep_inside(&self, rect: Rect) -> Rect {
        let max = (self.container - rect.size()).max(Vec2::ZERO);
        let min = Pos2::new(rect.min.x.clamp(0.0, max.x), rect.min.y.clamp(0.0, max.y));
        Rect::from_min_size(min, rect.size())
    }
}

impl DraggableResizable for OverlayLayoutEngine {
    fn constraints(&self) -> InteractionConstraints {
        InteractionConstraints {
            min_size: Vec2::splat(self.min_size),
            preserve_aspect: self.preserve_aspect,
            aspect: self.aspect,
        }
    }

    fn on_move(&mut self, delta: Vec2) {
        self.on_user_drag(delta);
    }

    fn on_resize(&mut self, event: ResizeEvent) {
        self.on_user_resize(event.new_size, event.delta_left, event.delta_top);
    }
}

/// Feeds the room image's displayed size to an overlay. The first size lays
/// the overlay out at once; later changes are debounced so a window drag
/// relayouts only after it settles.
#[derive(Clone, Debug)]
pub struct ViewportSync {
    debouncer: Debouncer<Vec2>,
    last: Vec2,
}

impl ViewportSync {
    pub fn new(delay: f64) -> Self {
        Self {
            debouncer: Debouncer::new(delay),
            last: Vec2::ZERO,
        }
    }

    /// Call once per frame with the current display size. Returns the
    /// seconds until a pending resize is applied, for scheduling a repaint.
    pub fn observe(
        &mut self,
        overlay: &mut OverlayLayoutEngine,
        display: Vec2,
        now: f64,
    ) -> Option<f64> {
        if overlay.container() == Vec2::ZERO {
            self.debouncer.cancel();
            self.last = display;
            overlay.set_container(display);
            return None;
        }
        if display != self.last {
            self.last = display;
            self.debouncer.trigger(now, display);
        }
        if let Some(size) = self.debouncer.poll(now) {
            log::debug!("Viewport settled at {}x{}", size.x, size.y);
            overlay.on_viewport_resize(size);
        }
        self.debouncer.remaining(now)
    }

    pub fn reset(&mut self) {
        self.debouncer.cancel();
        self.last = Vec2::ZERO;
    }
}
