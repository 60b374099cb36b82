//! Import tests: model contents and fatal errors

mod errors;
mod model;
