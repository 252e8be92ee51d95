pub mod gesture;
pub mod presentation;

pub use gesture::{CaptureTarget, DragEvent, GestureHandler, GestureRecognizer, HoverEvent};
pub use presentation::{
    Channel, ChannelConfig, CursorCallback, PresentationControls, PresentationOptions, Snap,
    SpringUpdate,
};
