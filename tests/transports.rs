//! Transport integration tests.

#[path = "transports/logger_test.rs"]
mod logger_test;
#[path = "transports/memory_test.rs"]
mod memory_test;
#[path = "transports/smtp_test.rs"]
mod smtp_test;
