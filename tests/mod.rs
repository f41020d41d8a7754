//! Test suite for kanban-sync
//!
//! This module organizes all integration and property tests
