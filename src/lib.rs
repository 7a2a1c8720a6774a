// src/lib.rs

// Les modules sont publics pour le binaire (pool_analyzer) et les tests d'intégration.
pub mod config;
pub mod decoders;
pub mod error;
pub mod filtering;
pub mod math;
pub mod monitoring;
pub mod rpc;
