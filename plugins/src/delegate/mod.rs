pub mod athena;
mod convert;

pub use athena::AthenaDelegate;
