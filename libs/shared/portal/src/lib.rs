pub mod luxmed;

pub use luxmed::LuxmedClient;
