//! # nb2er
//!
//! A library for recovering the entity-relationship structure expressed by
//! the pandas join statements of a Jupyter notebook and rendering it as a
//! Graphviz ER diagram.
//!
//! # Features
//!
//! - Interpret single-line `safe_join`/`pd.merge` statements into structured
//!   join records: left table, right table, resulting table and the join
//!   key(s) used on each side.
//! - Two recognition profiles: a constrained single-shared-key form and a
//!   general multi-pass parameter parser supporting keyword arguments,
//!   asymmetric `left_on`/`right_on` keys, chained calls on arguments and
//!   `[[...]]` projections.
//! - Accumulate nodes and edges across statements with exactly-once,
//!   first-seen-order semantics, so repeated joins never duplicate visual
//!   elements.
//! - Render the accumulated graph as a left-to-right DOT layout, or dump it
//!   as JSON.
//!
//! # Example
//!
//! ```rust
//! use nb2er::{graph::ErGraph, interpret::interpret};
//!
//! fn main() -> anyhow::Result<()> {
//!     let stmts = [
//!         "table_c = safe_join(table_a, table_b, 'num_contrat')",
//!         "table_d = pd.merge(table_c, table_b, left_on='SIREN', right_index=True)",
//!     ];
//!
//!     let mut graph = ErGraph::default();
//!     for stmt in stmts {
//!         if let Some(join) = interpret(stmt)? {
//!             graph.add_node(&join.left);
//!             graph.add_node(&join.right);
//!             graph.add_node(&join.result);
//!             graph.add_edge(&join.left, &join.result, join.left_key.as_deref());
//!             graph.add_edge(&join.right, &join.result, join.right_key.as_deref());
//!         }
//!     }
//!
//!     println!("{}", graph.to_dot());
//!     Ok(())
//! }
//! ```
pub mod diagram;
pub mod graph;
pub mod interpret;
pub mod notebook;
