//! Library side of the cgml binary, shared with its integration tests.

pub mod transforms;
