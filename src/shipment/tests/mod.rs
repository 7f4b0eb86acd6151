//! Unit tests for the shipment lifecycle engine.

mod admission_tests;
mod domain_tests;
mod planning_tests;
mod support;
