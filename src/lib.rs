pub mod error;
pub mod format;
pub mod value;
pub mod wire;
pub mod engine;

pub use error::{PackError, Result};
pub use format::{balanced, Directive, Kind, LvWidth, Scanner};
pub use value::Value;
pub use wire::{ReadCursor, WriteCursor};
pub use engine::{pack, pack_into, unpack, unpack_from};
