//! Test doubles for the engine's external seams.

mod mock_gateway;

pub use mock_gateway::{MockFailure, MockGateway};
