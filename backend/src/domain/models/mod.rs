pub mod account;
pub mod resident;

pub use account::*;
pub use resident::*;
