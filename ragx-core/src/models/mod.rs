pub mod record;
pub mod region;

// re-export for cleaner imports
pub use self::record::{FieldValue, IntervalRecord};
pub use self::region::Region;
