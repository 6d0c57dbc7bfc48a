pub mod closure;
pub mod transformer;
pub mod visibility;

// Re-export from submodules
pub use closure::InclusionClosure;
pub use transformer::strip_class;
pub use visibility::is_visible;
