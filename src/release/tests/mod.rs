//! Unit tests for the release lifecycle.

mod support;
