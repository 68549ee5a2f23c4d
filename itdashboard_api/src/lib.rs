mod client;
mod errors;
mod page;
pub mod types;
pub use self::client::Client;
pub use self::errors::Error;
pub use self::page::Page;
