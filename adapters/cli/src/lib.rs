#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless adapter that loads scenario files and drives Anchor Defence
//! sessions without a camera or renderer.

pub mod scenario;
pub mod session;
