// Library crate: exposes the testable viewer core for integration tests and
// headless use. GUI-specific modules (app, ui, GL rendering) remain in the
// binary crate.

pub mod asset;
pub mod capture;
pub mod composite;
pub mod export;
pub mod fixtures;
pub mod framing;
pub mod harness;
pub mod interaction;
pub mod loader;
pub mod session;
pub mod state;

/// Scene-side viewport types (meshes, bounds, camera, indicator).
/// The GL renderer and overlays stay in the binary crate.
pub mod viewport {
    pub mod bounds;
    pub mod camera;
    pub mod indicator;
    pub mod mesh;
}
