#![allow(dead_code)]

pub mod fixtures;
pub mod tools;

#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use tools::*;
