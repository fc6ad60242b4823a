//! Input seams: window events and directional key state, independent of any
//! windowing library.
//!
//! # Invariants
//! - Events are consumed in FIFO order and polling never blocks.
//! - A key press is a trigger to re-sample held keys, not a delta.

pub mod direction;
pub mod event;

pub use direction::{Direction, DirectionSet, KeyState};
pub use event::{EventQueue, EventSource, ViewerEvent};
