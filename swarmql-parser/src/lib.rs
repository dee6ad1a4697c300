//! # swarmql-parser
//!
//! swarmql-parser converts a token sequence into the swarmql AST.

#![deny(missing_docs)]
#![deny(unused_imports)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod error;
mod parser;

pub use self::{
    error::ParserError,
    parser::{parse_query, Parser},
};
