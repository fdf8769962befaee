pub mod alignment;
pub mod feature;
pub mod peak;

// re-export for cleaner imports
pub use self::alignment::{AlignmentRecord, Flags};
pub use self::feature::Feature;
pub use self::peak::Peak;
