//! Backend contract tests.
//!
//! `documents` runs against whichever backend TEST_BACKEND selects;
//! `persistence` covers the on-disk formats of specific backends.

mod documents;
mod persistence;
