//! Fully dynamic graph connectivity with per-component aggregates.
//!
//! [`DynamicConnectivity`] keeps an undirected graph under edge insertions
//! and deletions and answers whether two vertices are connected, plus the
//! fold of caller-supplied vertex values over a whole component. It follows
//! Holm, de Lichtenberg and Thorup: a hierarchy of spanning forests, each
//! kept as Euler tours in the [`rb_tree`] crate.

mod adjacency;
mod config;
mod error;
mod euler_tour;
mod graph;
mod maintenance;

pub use config::{Config, MAX_VERTEX_COUNT};
pub use error::{ConnectivityError, ValidationError};
pub use graph::DynamicConnectivity;
