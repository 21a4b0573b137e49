pub mod config;
pub mod credentials;
pub mod pipeline;
pub mod record;
pub mod script;
pub mod terminal;
