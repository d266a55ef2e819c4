//! Shared test utilities for wordtally integration tests.
//!
//! This module provides:
//! - In-memory fakes for the content, attachment and extractor seams
//! - `TestHarness` for directory-backed runs in a temp directory

pub mod fakes;
pub mod harness;

pub use fakes::*;
pub use harness::{pdf_with_pages, TestHarness};
