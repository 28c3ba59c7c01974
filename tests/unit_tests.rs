//! Unit tests for rust-sqldiff
//!
//! This file serves as the entry point for all unit tests.

#[path = "unit/name_tests.rs"]
mod name_tests;

#[path = "unit/token_tests.rs"]
mod token_tests;

#[path = "unit/parser_tests.rs"]
mod parser_tests;

#[path = "unit/script_set_tests.rs"]
mod script_set_tests;
