pub mod engine;
pub mod model;
pub mod recommendations;
pub mod risk_profile;
pub mod rules;
pub mod similarity;
