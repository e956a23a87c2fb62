pub mod locator;
pub mod search;

pub use locator::LocatorFilter;
pub use search::{AvailabilitySource, SlotFetcher};
