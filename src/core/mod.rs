pub mod tx;
pub mod units;

pub use tx::{RawAmount, TxRecord};
