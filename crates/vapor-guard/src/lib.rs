#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::similar_names)]

pub mod device;
pub mod guard;
pub mod secrets;
pub mod signing;
pub mod time;

pub use crate::device::*;
pub use crate::guard::*;
pub use crate::secrets::*;
pub use crate::signing::*;
pub use crate::time::*;
