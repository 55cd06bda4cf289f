//! Formation-based container reconciliation for docker hosts.
//!
//! A [`Formation`](formation::Formation) holds the set of container
//! instances that should be running on one host. Every command rebuilds the
//! observed formation through the
//! [`FormationIntrospector`](introspect::FormationIntrospector), mutates it,
//! and hands observed and target state to the
//! [`FormationRunner`](runner::FormationRunner), which stops and starts
//! containers in link-dependency order through a [`Gateway`](gateway::Gateway).

pub mod cli;
pub mod commands;
pub mod config;
pub mod container;
pub mod error;
pub mod formation;
pub mod gateway;
pub mod introspect;
pub mod runner;
