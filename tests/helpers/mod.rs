#![allow(dead_code)]

pub mod connectors;
pub mod resolver_mock;

pub use connectors::{GatedConnect, MemoryConnect, MemoryPeer};
pub use resolver_mock::{answer_a, MockResolver};
