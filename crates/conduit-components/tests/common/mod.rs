//! Common test utilities for conduit-components
//!
//! This module provides shared test infrastructure including:
//! - Constants shared across scenarios
//! - Candidate builders and a wired-up manager fixture
//! - Mock collaborators that record how they were called

#![allow(dead_code)]
#![allow(unused_imports)]

pub mod builders;
pub mod constants;
pub mod mocks;

pub use builders::*;
pub use constants::*;
pub use mocks::*;
