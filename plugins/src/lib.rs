pub mod delegate;
pub mod factory;
pub mod mothership;
