pub mod extractor;
pub mod loader;
pub mod locale_system;

pub use extractor::*;
pub use loader::*;
pub use locale_system::*;
