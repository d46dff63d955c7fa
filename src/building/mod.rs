//! Image building for the probe, used by the `hostdir-e2e` binary and the
//! Docker end-to-end test.

pub mod probe_image;
