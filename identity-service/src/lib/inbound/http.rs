pub mod cookies;
pub mod handlers;
pub mod middleware;
pub mod multipart;
pub mod router;
