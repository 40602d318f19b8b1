pub mod anomaly;
pub mod error;
pub mod kpi;
pub mod message;
pub mod narrative;
pub mod report;
pub mod transaction;
mod util;

pub use anomaly::*;
pub use error::{Error, Result};
pub use kpi::*;
pub use message::*;
pub use narrative::*;
pub use report::*;
pub use transaction::*;
pub use util::*;
