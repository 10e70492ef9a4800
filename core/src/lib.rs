pub mod analysis;
pub mod determinism;
pub mod history;
pub mod procurement;
pub mod report;

pub mod error;
