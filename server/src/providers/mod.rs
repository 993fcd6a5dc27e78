pub mod base;
pub mod navlungo;

pub use base::CarrierProvider;
pub use navlungo::NavlungoProvider;
