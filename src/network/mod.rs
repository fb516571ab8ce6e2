pub mod server;

pub use server::StaticServer;
