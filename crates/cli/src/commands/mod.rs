pub mod binaries;
pub mod functions;
pub mod members;
pub mod scan;
pub mod util;

pub use binaries::*;
pub use functions::*;
pub use members::*;
pub use scan::*;
pub use util::*;
