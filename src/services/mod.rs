//! Service layer
//!
//! Services orchestrate the cache, origin collaborators, selector and
//! manifest writers so HTTP handlers stay thin and the flow can be tested
//! with fake collaborators.

pub mod playback;

pub use playback::PlaybackService;
