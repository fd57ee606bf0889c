pub mod boolean;
pub mod command;
pub mod components;
pub mod morphology;

pub use boolean::*;
pub use command::MaskCommand;
pub use components::*;
pub use morphology::*;
