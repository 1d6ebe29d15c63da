//! HTTP-level tests for the admin login API.

mod auth_test;
mod enrollment_test;
mod helpers;
