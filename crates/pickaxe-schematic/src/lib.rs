pub mod schematic;

pub use schematic::*;
