pub mod reader;
pub mod types;
pub mod writer;

// Re-export the parse/emit entry points for easier access
pub use reader::{ClassParseError, parse_class};
pub use types::ClassRecord;
pub use writer::{ClassWriteError, write_class};
