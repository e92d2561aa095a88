//! Unit tests for the qmock crate.

mod stub_tests;
