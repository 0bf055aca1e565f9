pub mod db;
pub mod file_utils;
pub mod payments;
pub mod tokens;

// Mock implementations only available with e2e-testing feature or debug builds
#[cfg(any(feature = "e2e-testing", debug_assertions))]
pub mod payments_mock;
