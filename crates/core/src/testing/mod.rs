//! Mock implementations for testing.

mod mock_library;

pub use mock_library::MockLibrary;
