pub mod cron;
pub mod logging;
pub mod signature;
