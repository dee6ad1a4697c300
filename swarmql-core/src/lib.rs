//! # swarmql-core
//!
//! swarmql-core holds the token and keyword types shared by the swarmql
//! lexer, parser and engine.

#![deny(missing_docs)]
#![deny(unused_imports)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod keyword;
mod tokens;

pub use self::{
    keyword::Keyword,
    tokens::{CompareOp, Token, Word},
};
