pub mod config;
pub mod detector;
pub mod effects;
pub mod fetch;
pub mod http_client;
pub mod poller;
pub mod ranking;
pub mod sim_feed;
pub mod source;
pub mod state;
pub mod status_watch;
pub mod victory;
