// src/chain/services/mod.rs

pub mod contract;
pub mod insight;
pub mod magic_eden;
pub mod zerion;
