pub mod config;
pub mod engine;
pub mod error;
pub mod game;
pub mod models;
pub mod peer;
pub mod routes;
pub mod websocket;
