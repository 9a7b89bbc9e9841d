//! CLI command integration tests
//!
//! Every test runs the compiled `repo-index` binary inside a temp repository
//! and checks stdout, exit status and the store it leaves behind.

pub mod backup_tests;
pub mod query_tests;
pub mod scan_tests;
