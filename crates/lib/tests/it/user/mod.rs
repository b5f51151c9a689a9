//! User system tests: repository semantics, login flow and concurrent sign-ups.

mod auth;
mod concurrency;
mod repository;
