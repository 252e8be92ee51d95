use glam::Vec2;
use winit::event::MouseButton;

use crate::app::input::PointerInput;

/// Where a drag may begin.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CaptureTarget {
    /// Only over the controlled node.
    #[default]
    Node,
    /// Anywhere on the rendering surface.
    Surface,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HoverEvent {
    pub hovering: bool,
    /// Pointer just entered.
    pub first: bool,
    /// Pointer just left.
    pub last: bool,
}

/// One step of a drag gesture.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragEvent<M> {
    /// Primary button still held.
    pub down: bool,
    pub first: bool,
    pub last: bool,
    /// Pointer movement since the previous event, in pixels.
    pub delta: Vec2,
    /// Total movement since the drag started.
    pub movement: Vec2,
    /// Value returned by the handler for the previous event of this drag.
    /// `None` on the first event.
    pub memo: Option<M>,
}

/// Receives recognized gestures.
pub trait GestureHandler<M> {
    fn on_hover(&mut self, event: HoverEvent);

    /// Returns the memo handed back on the next event of the same drag.
    fn on_drag(&mut self, event: DragEvent<M>) -> M;
}

/// Turns per-frame [`PointerInput`] into hover and drag events.
#[derive(Debug, Clone)]
pub struct GestureRecognizer<M> {
    pub capture: CaptureTarget,
    pub button: MouseButton,
    hovering: bool,
    dragging: bool,
    movement: Vec2,
    memo: Option<M>,
}

impl<M> Default for GestureRecognizer<M> {
    fn default() -> Self {
        Self::new(CaptureTarget::default())
    }
}

impl<M> GestureRecognizer<M> {
    #[must_use]
    pub fn new(capture: CaptureTarget) -> Self {
        Self {
            capture,
            button: MouseButton::Left,
            hovering: false,
            dragging: false,
            movement: Vec2::ZERO,
            memo: None,
        }
    }

    #[must_use]
    pub fn is_dragging(&self) -> bool {
        self.dragging
    }

    #[must_use]
    pub fn is_hovering(&self) -> bool {
        self.hovering
    }

    fn accepts_start(&self, input: &PointerInput) -> bool {
        match self.capture {
            CaptureTarget::Surface => true,
            CaptureTarget::Node => input.hovered,
        }
    }
}

impl<M: Clone> GestureRecognizer<M> {
    /// Processes one frame of input.
    pub fn update<H>(&mut self, input: &PointerInput, handler: &mut H)
    where
        H: GestureHandler<M> + ?Sized,
    {
        if input.hovered != self.hovering {
            self.hovering = input.hovered;
            handler.on_hover(HoverEvent {
                hovering: self.hovering,
                first: self.hovering,
                last: !self.hovering,
            });
        }

        if !self.dragging {
            if input.just_pressed(self.button) && self.accepts_start(input) {
                self.dragging = true;
                self.movement = input.cursor_delta;
                let memo = handler.on_drag(DragEvent {
                    down: true,
                    first: true,
                    last: false,
                    delta: input.cursor_delta,
                    movement: self.movement,
                    memo: None,
                });
                self.memo = Some(memo);
            }
            return;
        }

        if input.is_button_pressed(self.button) {
            if input.cursor_delta != Vec2::ZERO {
                self.movement += input.cursor_delta;
                let memo = handler.on_drag(DragEvent {
                    down: true,
                    first: false,
                    last: false,
                    delta: input.cursor_delta,
                    movement: self.movement,
                    memo: self.memo.clone(),
                });
                self.memo = Some(memo);
            }
            return;
        }

        // Button went up (possibly outside the window).
        self.dragging = false;
        let memo = self.memo.take();
        handler.on_drag(DragEvent {
            down: false,
            first: false,
            last: true,
            delta: Vec2::ZERO,
            movement: self.movement,
            memo,
        });
        self.movement = Vec2::ZERO;
    }
}
