// Public API
pub use connector::{connect, connect_with};
pub use driver::Driver;
pub use socket::{Transport, TransportError};

// Internal modules
mod connector;
mod driver;
mod socket;
