pub mod fake_device;
pub use fake_device::FakeSymnetDevice;
