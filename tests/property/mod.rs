//! Property-based tests for the status fold

mod state_fold;
