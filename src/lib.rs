pub mod configuration;
pub mod cookies;
pub mod logout;
pub mod logout_client;
pub mod page;
pub mod storage;
pub mod telemetry;
