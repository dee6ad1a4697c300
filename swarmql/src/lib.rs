//! # swarmql
//!
//! swarmql is a read/write SQL query engine over an in-memory, schemaless
//! world store.
//!
//! The layers are published as separate crates and re-exported here:
//! [`lexer`] tokenizes, [`parser`] builds the [`ast`] types, and [`engine`]
//! executes against a [`engine::World`] store — table scans with an
//! optional focus disc, delta/tombstone overlay, joins, grouping and
//! aggregates, CTEs and `UNION`, plus the `SET LIMIT` session command and
//! delegated DML.

#![deny(missing_docs)]
#![deny(unused_imports)]

pub use swarmql_ast as ast;
pub use swarmql_core as core;
pub use swarmql_engine as engine;
pub use swarmql_lexer as lexer;
pub use swarmql_parser as parser;

pub use swarmql_engine::{execute_sql, EngineError, Focus, MemoryWorld, Payload, SqlResult, World};
