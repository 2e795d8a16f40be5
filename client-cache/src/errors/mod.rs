mod invalidation_error;

pub use invalidation_error::*;
