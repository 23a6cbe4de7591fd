// Library root for the gavel auction console.
//
// Re-exports all modules so that integration tests and the binary
// entry point can access them.

pub mod app;
pub mod console;
pub mod input;
pub mod protocol;
pub mod view;
