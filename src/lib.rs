//! Schema compiler for a JSON-RPC message protocol.
//!
//! Takes one parsed RPC interface model (enums, structs, functions, bounded
//! types) and emits two deterministic source artifacts: `<base>.h` with the
//! generated declarations and `<base>_schema.h` with the factory constructor
//! body that builds and registers one validation schema per function,
//! including synthesized error-response schemas the model never declares.
//!
//! Pipeline: deserialize ([`model`]) → [`validate`] → preprocess the
//! message-kind enum ([`preprocess`]) → emit ([`emit`]) → assemble and write
//! ([`assemble`]).

pub mod assemble;
pub mod cli;
pub mod emit;
pub mod error;
pub mod model;
pub mod preprocess;
pub mod validate;

pub use assemble::{generate, generate_with, FileSystem, OsFileSystem};
pub use error::GenError;
pub use model::Interface;
