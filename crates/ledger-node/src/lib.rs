pub mod shared;

pub use shared::SharedLedger;
