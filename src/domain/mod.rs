// Domain layer: source discriminator, test case model and the ports gateways implement.

pub mod model;
pub mod ports;
pub mod source;
