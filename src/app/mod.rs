pub mod input;
pub mod input_adapter;

pub use input::PointerInput;
pub use input_adapter::process_window_event;
