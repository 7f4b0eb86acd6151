//! Drayage: freight shipment lifecycle orchestration.
//!
//! This crate implements the core engine that moves a customer's container
//! from origin to delivery: the interlocking state machines for shipping
//! requests, candidate routes, and truck legs; admission control for truck
//! assignment; distance/cost/time estimation; deposit dwell accounting; and
//! the final cost/time consolidation.
//!
//! # Architecture
//!
//! The crate follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//!   (persistence, fleet registry, deposit registry, geocoding)
//! - **Adapters**: Concrete implementations of ports (in-memory, PostgreSQL)
//!
//! Transport concerns (HTTP routing, validation annotations, authentication)
//! live outside this crate; services take typed inputs and return domain
//! objects or typed errors.

pub mod shipment;
