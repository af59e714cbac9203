//! Pure landscape logic for Threshold.
//!
//! This crate contains everything that is independent of the ECS engine and
//! of any movement or rendering host. Functions take plain data and return
//! results, making them unit-testable and reusable from the engine crate, the
//! headless harness, and any future front end.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | Simulation configuration (serde), defaults and validation |
//! | [`geometry`] | World-space vector math |
//! | [`grid`] | Road/room cell classification, cell centers, neighborhoods |
//! | [`population`] | Actor labels, spawn ratios, bias draws |
//! | [`satisfaction`] | Neighbor tallies and band-based satisfaction |
//! | [`schelling`] | Classic round-based Schelling board |
//! | [`zone`] | Zone layout, occupant statistics and closure latch |

pub mod config;
pub mod geometry;
pub mod grid;
pub mod population;
pub mod satisfaction;
pub mod schelling;
pub mod zone;
