//! # Sistema de Métricas
//! src/metrics/mod.rs
//!
//! Observabilidad básica del servidor: contadores de requests, bytes
//! enviados y latencias, con un resumen JSON al apagar.

pub mod collector;

pub use collector::MetricsCollector;
