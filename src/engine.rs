//! Interfaces to the libraries that actually move video.
//!
//! Two kinds of engine are supported. A [`DecodeEngine`] hands out sources that
//! a session pulls frames from on its own reader thread. A [`PlaybackEngine`]
//! hands out players that decode, buffer and draw by themselves; the session
//! only drives them. Releasing a source or player is done by dropping it.

use crate::common::{Frame, RenderTarget};
use crate::error::Result;



pub trait DecodeEngine: Send + Sync {
	/// Prepares a source for `url`. Fails if the stream cannot be opened at all.
	fn open(&self, url: &str) -> Result<Box<dyn FrameSource>>;
}

pub trait FrameSource: Send {
	/// Blocks until the next frame. `Ok(None)` means the stream ended.
	fn pull(&mut self) -> Result<Option<Frame>>;
}



pub trait PlaybackEngine: Send + Sync {
	fn create(&self, url: &str) -> Result<Box<dyn Player>>;
}

pub trait Player: Send {
	fn bind(&mut self, target: RenderTarget) -> Result<()>;
	fn play(&mut self) -> Result<()>;
	fn stop(&mut self);
	fn set_muted(&mut self, muted: bool);
	fn is_playing(&self) -> bool;
}
