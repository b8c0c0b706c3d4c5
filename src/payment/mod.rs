#[cfg(test)]
pub mod fake;
pub mod gateway;
pub mod service;
pub mod stripe;
