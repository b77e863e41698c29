pub mod configuration;
pub mod rendering;
