//! The virtual device and its host entry points

pub mod controller;

#[cfg(test)]
mod tests;

pub use controller::DeviceController;
