pub mod browsers;
pub mod config;
pub mod run;
