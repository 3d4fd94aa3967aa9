//! Integration tests for rewind status synchronization

mod lifecycle;
