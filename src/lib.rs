pub mod db;
pub mod interchange;
pub mod quiz;
pub mod server;
pub mod settings;
pub mod telemetry;
