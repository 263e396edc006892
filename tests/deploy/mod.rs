//! Deployment endpoint tests against a fake HTTP server.

mod client_test;
mod server;
mod session_test;
