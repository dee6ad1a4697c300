//! # swarmql-ast
//!
//! swarmql-ast holds the query and predicate tree types produced by the
//! swarmql parser.
//!
//! Subqueries, CTE bodies and `CASE … END` arms are carried as raw
//! token-joined strings and re-parsed when they are evaluated; the tree
//! types here only shape what the executor walks per row.

#![deny(missing_docs)]
#![deny(unused_imports)]
#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(not(feature = "std"))]
extern crate alloc;

mod expression;
mod query;

pub use self::{expression::*, query::*};
