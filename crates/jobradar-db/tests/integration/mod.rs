pub mod common;

mod reconcile_tests;
mod run_log_tests;
