pub mod config;
pub mod game_loop;
pub mod host;
pub mod operator;
pub mod state;
