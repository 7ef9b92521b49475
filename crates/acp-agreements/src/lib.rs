pub mod hashing;
pub mod signing;
pub mod store;

pub use hashing::compute_hash;
pub use store::{AgreementStore, AmendChanges};
