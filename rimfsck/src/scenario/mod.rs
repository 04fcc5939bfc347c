mod check;
mod error;
#[allow(clippy::module_inception)]
mod scenario;

pub use error::*;
pub use scenario::*;
