//! Safe SQL builder: identifiers from table descriptors only, values as parameters.

mod builder;
pub mod criteria;
pub mod params;
pub mod table;
pub use builder::*;
pub use criteria::*;
pub use params::*;
pub use table::*;
