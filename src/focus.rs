use log::debug;

use crate::common::CameraIndex;
use crate::pagination::{wrap_next, wrap_prev};
use crate::pool::SessionPool;



#[derive(Clone, Copy)]
#[derive(Debug)]
#[derive(PartialEq, Eq)]
pub enum Focus {
	Grid,
	Fullscreen(CameraIndex),
}

#[derive(Clone, Copy)]
#[derive(Debug)]
#[derive(PartialEq, Eq)]
pub enum Direction {
	Next,
	Prev,
}

#[derive(Clone, Copy)]
#[derive(Debug)]
#[derive(PartialEq, Eq)]
pub enum EscapeAction {
	LeftTrueFullscreen,
	LeftFullscreen(CameraIndex),
	Nothing,
}

/// Tracks the single enlarged camera and the single camera allowed to play sound.
/// The two are independent.
#[derive(Clone)]
#[derive(Debug)]
pub struct FocusAudio {
	focus: Focus,
	true_fullscreen: bool,
	audio_source: Option<CameraIndex>,
}

impl Default for FocusAudio {
	fn default() -> Self {
		FocusAudio {
			focus: Focus::Grid,
			true_fullscreen: false,
			audio_source: None,
		}
	}
}

impl FocusAudio {
	pub fn new() -> FocusAudio {
		FocusAudio::default()
	}

	pub fn focus(&self) -> Focus {
		self.focus
	}

	pub fn fullscreen_index(&self) -> Option<CameraIndex> {
		match self.focus {
			Focus::Fullscreen(index) => Some(index),
			Focus::Grid => None,
		}
	}

	pub fn is_true_fullscreen(&self) -> bool {
		self.true_fullscreen
	}

	pub fn audio_source(&self) -> Option<CameraIndex> {
		self.audio_source
	}

	/// Returns the camera that was enlarged before, if any.
	pub fn enter_fullscreen(&mut self, index: CameraIndex) -> Option<CameraIndex> {
		let previous = self.fullscreen_index();
		self.focus = Focus::Fullscreen(index);
		previous
	}

	/// Back to the grid. Also leaves true fullscreen.
	pub fn leave_fullscreen(&mut self) -> Option<CameraIndex> {
		let previous = self.fullscreen_index();
		self.focus = Focus::Grid;
		self.true_fullscreen = false;
		previous
	}

	/// True fullscreen is only meaningful while a camera is enlarged.
	pub fn set_true_fullscreen(&mut self, enabled: bool) -> bool {
		if enabled && self.focus == Focus::Grid {
			return false;
		}
		let changed = self.true_fullscreen != enabled;
		self.true_fullscreen = enabled;
		changed
	}

	pub fn escape(&mut self) -> EscapeAction {
		if self.true_fullscreen {
			self.true_fullscreen = false;
			return EscapeAction::LeftTrueFullscreen;
		}
		match self.leave_fullscreen() {
			Some(index) => EscapeAction::LeftFullscreen(index),
			None => EscapeAction::Nothing,
		}
	}

	/// Steps the enlarged camera, wrapping around. Returns `(from, to)` when it moved.
	pub fn navigate(&mut self, direction: Direction, camera_count: usize) -> Option<(CameraIndex, CameraIndex)> {
		let from = self.fullscreen_index()?;
		if camera_count < 2 {
			return None;
		}
		let to = match direction {
			Direction::Next => wrap_next(from, camera_count),
			Direction::Prev => wrap_prev(from, camera_count),
		};
		self.focus = Focus::Fullscreen(to);
		Some((from, to))
	}

	/// Gives `index` the audio, or takes it away if it already had it.
	/// Returns whether `index` holds the audio afterwards.
	pub fn toggle_audio(&mut self, index: CameraIndex, pool: &mut SessionPool) -> bool {
		if self.audio_source == Some(index) {
			if let Some(session) = pool.get_mut(index) {
				session.set_muted(true);
			}
			self.audio_source = None;
			return false;
		}

		if !pool.is_live(index) {
			debug!("Camera {} has no live session; audio unchanged", index);
			return false;
		}

		// Mute even a stalled player; it can resume on its own.
		if let Some(previous) = self.audio_source.take() {
			if let Some(session) = pool.get_mut(previous) {
				session.set_muted(true);
			}
		}
		if let Some(session) = pool.get_mut(index) {
			session.set_muted(false);
		}
		self.audio_source = Some(index);
		true
	}

	pub fn clear_audio(&mut self) {
		self.audio_source = None;
	}

	/// Re-applies mute state to every session. Drops the audio source if its session is gone.
	pub fn sync_audio(&mut self, pool: &mut SessionPool) {
		if let Some(index) = self.audio_source {
			if !pool.is_live(index) {
				debug!("Audio camera {} is no longer live", index);
				self.audio_source = None;
			}
		}

		let audio_source = self.audio_source;
		for (index, session) in pool.sessions_mut() {
			let muted = audio_source != Some(index);
			if session.is_muted() != muted {
				session.set_muted(muted);
			}
		}
	}
}
