pub mod app_config;
pub mod amadeus;
mod dto;

pub use amadeus::AmadeusApi;
pub use app_config::Config;
