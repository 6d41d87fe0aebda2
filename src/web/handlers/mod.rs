// Request handlers, one module per endpoint.

pub mod status;
pub mod train;
pub mod visualize;
