pub mod actions;
pub mod assertions;
pub mod setup;

// Re-export main utilities for use by test files
#[allow(unused_imports)]
pub use assertions::{assert_forbidden, assert_redirect, json_body};
#[allow(unused_imports)]
pub use setup::{TestClient, TestSetup, TestSetupBuilder, TEST_PASSWORD};
