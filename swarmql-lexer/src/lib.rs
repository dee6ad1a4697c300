//! # swarmql-lexer
//!
//! swarmql-lexer converts a SQL string into a sequence of tokens.
//!
//! The dialect is forgiving by construction — an unterminated string
//! literal is accepted up to end of input — so tokenizing never fails.

#![deny(missing_docs)]
#![deny(unused_imports)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod lexer;

pub use self::lexer::{tokenize, Lexer};
