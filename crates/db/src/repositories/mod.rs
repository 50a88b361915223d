pub mod memory;
pub mod registration;

pub use memory::InMemoryRegistrationStore;
pub use registration::SqlRegistrationStore;
