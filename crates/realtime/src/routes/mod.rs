pub mod health;
pub mod messages;
pub mod notifications;
pub mod users;
pub mod websocket;
