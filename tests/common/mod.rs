// Common test utilities

#[cfg(test)]
#[allow(dead_code)]
pub mod fake_transport;
#[cfg(test)]
#[allow(dead_code)]
pub mod harness;
