pub mod daymet;
pub mod error;
pub mod power;
pub mod provider;
