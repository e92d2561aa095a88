//! Unit tests for the qtest-harness crate.
