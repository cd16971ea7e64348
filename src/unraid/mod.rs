pub mod client;
pub mod types;
pub mod websocket;

pub use client::UnraidClient;
pub use websocket::PushListener;
