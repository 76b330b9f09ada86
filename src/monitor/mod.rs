pub mod controller;
mod worker;

pub use controller::ResourceMonitor;
