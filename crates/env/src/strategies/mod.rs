//! Individual provisioning strategies

mod conda;
mod docker;
mod node;
mod venv;
