mod async_server;
pub mod connection;

pub use async_server::{ ServerOptions, bind_listener, run_async_server };
pub use connection::handle_connection;
