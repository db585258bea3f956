// Maker API surface
//
// `MakerClient` owns transport mechanics; each endpoint family lives in its
// own file as inherent methods on the client.

pub mod client;
pub mod devices;
pub mod hsm;
pub mod models;
pub mod modes;

pub use client::MakerClient;
