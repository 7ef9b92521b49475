pub mod ledger;

pub use ledger::PredictionLedger;
