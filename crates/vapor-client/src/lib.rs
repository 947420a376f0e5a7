#![allow(clippy::pedantic)]
#![allow(clippy::nursery)]
#![deny(clippy::unwrap_used)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::similar_names)]

pub mod authenticator;
pub mod confirmations;
pub mod endpoints;
pub mod error;
pub mod login;
pub mod parser;
pub mod session;

pub use crate::authenticator::*;
pub use crate::confirmations::*;
pub use crate::endpoints::*;
pub use crate::error::*;
pub use crate::login::*;
pub use crate::parser::*;
pub use crate::session::*;
