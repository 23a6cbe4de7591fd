// Library root: the auction engine, its data model, configuration and the
// player-pool provider. The operator console lives in gavel-app.

pub mod config;
pub mod draft;
pub mod pool;
