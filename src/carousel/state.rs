use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use tracing::trace;

use crate::sync::CarouselView;

use super::subscription::{Listeners, OffsetSubscription, ScrollEvent};

/// Offsets closer than this are considered equal and not re-published.
const OFFSET_EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy)]
struct Animation {
    from: f64,
    to: f64,
    elapsed: Duration,
}

#[derive(Debug, Clone, Copy)]
struct Drag {
    anchor_column: f64,
    anchor_offset: f64,
}

pub struct Carousel {
    page_count: usize,
    viewport_width: f64,
    offset: f64,
    animation_duration: Duration,
    animation: Option<Animation>,
    drag: Option<Drag>,
    listeners: Rc<RefCell<Listeners>>,
}

impl Carousel {
    pub fn new(page_count: usize, viewport_width: f64, animation_duration: Duration) -> Self {
        let viewport_width = if viewport_width.is_finite() && viewport_width > 0.0 {
            viewport_width
        } else {
            1.0
        };

        Self {
            page_count,
            viewport_width,
            offset: 0.0,
            animation_duration,
            animation: None,
            drag: None,
            listeners: Rc::new(RefCell::new(Listeners::default())),
        }
    }

    /// Register `handler` for scroll events until the returned guard is dropped.
    pub fn subscribe(&self, handler: impl FnMut(ScrollEvent) + 'static) -> OffsetSubscription {
        let id = self.listeners.borrow_mut().add(Box::new(handler));
        OffsetSubscription::new(id, &self.listeners)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    pub fn offset(&self) -> f64 {
        self.offset
    }

    pub fn viewport_width(&self) -> f64 {
        self.viewport_width
    }

    pub fn page_count(&self) -> usize {
        self.page_count
    }

    pub fn max_offset(&self) -> f64 {
        self.page_count.saturating_sub(1) as f64 * self.viewport_width
    }

    /// The page closest to the current offset.
    pub fn visible_page(&self) -> usize {
        self.page_for(self.offset)
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn is_animating(&self) -> bool {
        self.animation.is_some()
    }

    /// Neither dragged nor animating.
    pub fn is_settled(&self) -> bool {
        self.drag.is_none() && self.animation.is_none()
    }

    /// Start a drag with the pointer at `column`. Cancels any running animation.
    pub fn begin_drag(&mut self, column: u16) {
        self.animation = None;
        self.drag = Some(Drag {
            anchor_column: f64::from(column),
            anchor_offset: self.offset,
        });
        self.emit(ScrollEvent::DragStarted);
    }

    /// Move the pointer of an active drag; content follows the pointer.
    pub fn drag_to(&mut self, column: u16) {
        let Some(drag) = self.drag else {
            return;
        };
        let target = drag.anchor_offset + (drag.anchor_column - f64::from(column));
        self.set_offset(target.clamp(0.0, self.max_offset()));
    }

    /// Release an active drag and settle on the nearest page.
    pub fn end_drag(&mut self) {
        if !self.release_drag() {
            return;
        }
        let page = self.visible_page();
        self.animate_to(page as f64 * self.viewport_width);
    }

    /// Advance a running animation by `dt`. Returns true if the offset moved.
    pub fn tick(&mut self, dt: Duration) -> bool {
        let Some(mut anim) = self.animation else {
            return false;
        };

        anim.elapsed += dt;
        let before = self.offset;
        if anim.elapsed >= self.animation_duration {
            self.animation = None;
            self.set_offset(anim.to);
        } else {
            let t = anim.elapsed.as_secs_f64() / self.animation_duration.as_secs_f64();
            let eased = ease_out_cubic(t);
            self.animation = Some(anim);
            self.set_offset(anim.from + (anim.to - anim.from) * eased);
        }
        (self.offset - before).abs() > OFFSET_EPSILON
    }

    /// Change the page width, keeping the same page in view.
    pub fn set_viewport_width(&mut self, width: f64) {
        if !width.is_finite() || width <= 0.0 {
            return;
        }
        if (width - self.viewport_width).abs() < OFFSET_EPSILON {
            return;
        }

        let page = match self.animation {
            Some(anim) => self.page_for(anim.to),
            None => self.visible_page(),
        };
        trace!(old = self.viewport_width, new = width, page, "carousel resized");

        self.viewport_width = width;
        self.animation = None;
        self.release_drag();
        self.set_offset(page as f64 * width);
    }

    fn page_for(&self, offset: f64) -> usize {
        if self.page_count == 0 {
            return 0;
        }
        let last = (self.page_count - 1) as f64;
        (offset / self.viewport_width).round().clamp(0.0, last) as usize
    }

    fn animate_to(&mut self, target: f64) {
        let target = target.clamp(0.0, self.max_offset());
        self.release_drag();

        if self.animation_duration.is_zero() {
            self.animation = None;
            self.set_offset(target);
            return;
        }
        if (target - self.offset).abs() <= OFFSET_EPSILON {
            self.animation = None;
            return;
        }

        self.animation = Some(Animation {
            from: self.offset,
            to: target,
            elapsed: Duration::ZERO,
        });
    }

    fn release_drag(&mut self) -> bool {
        if self.drag.take().is_some() {
            self.emit(ScrollEvent::DragEnded);
            true
        } else {
            false
        }
    }

    fn set_offset(&mut self, offset: f64) {
        if (offset - self.offset).abs() <= OFFSET_EPSILON {
            return;
        }
        self.offset = offset;
        self.emit(ScrollEvent::Offset(offset));
    }

    fn emit(&self, event: ScrollEvent) {
        self.listeners.borrow_mut().emit(event);
    }
}

impl CarouselView for Carousel {
    fn scroll_to_offset(&mut self, offset: f64) {
        if !offset.is_finite() {
            return;
        }
        self.animate_to(offset);
    }

    fn target_offset(&self) -> f64 {
        self.animation.map_or(self.offset, |anim| anim.to)
    }
}

fn ease_out_cubic(t: f64) -> f64 {
    let inv = 1.0 - t.clamp(0.0, 1.0);
    1.0 - inv * inv * inv
}
