use std::collections::HashMap;

use log::{debug, warn};

use crate::common::{CameraIndex, RenderTarget, SessionOptions, StreamProfile};
use crate::registry::redact_credentials;
use crate::session::{SessionFactory, StreamSession};



#[derive(Clone, Copy)]
#[derive(Debug)]
#[derive(PartialEq, Eq)]
pub enum StartOutcome {
	Started,
	AlreadyRunning,
	/// The stream could not be opened. The camera shows "no signal" until reloaded.
	Failed,
}

struct PoolEntry {
	session: Box<dyn StreamSession>,
	profile: StreamProfile,
}

/// Live sessions keyed by camera position. At most one session per camera.
///
/// Only the UI thread touches the pool, so it holds no locks of its own.
pub struct SessionPool {
	factory: Box<dyn SessionFactory>,
	sessions: HashMap<CameraIndex, PoolEntry>,
}

impl SessionPool {
	pub fn new(factory: Box<dyn SessionFactory>) -> SessionPool {
		SessionPool {
			factory,
			sessions: HashMap::new(),
		}
	}

	pub fn start(&mut self, index: CameraIndex, url: &str, target: RenderTarget, options: SessionOptions) -> StartOutcome {
		if self.sessions.contains_key(&index) {
			return StartOutcome::AlreadyRunning;
		}

		match self.factory.open(url, target, options) {
			Ok(session) => {
				debug!("Camera {} started on {:?}", index, target);
				self.sessions.insert(index, PoolEntry { session, profile: options.profile });
				StartOutcome::Started
			},
			Err(err) => {
				warn!("Failed to open camera {} ({}); error was {}", index, redact_credentials(url), err);
				StartOutcome::Failed
			}
		}
	}

	/// Tears down the session for `index`. Returns false if there was none.
	pub fn stop(&mut self, index: CameraIndex) -> bool {
		match self.sessions.remove(&index) {
			Some(mut entry) => {
				entry.session.stop();
				debug!("Camera {} stopped", index);
				true
			},
			None => false,
		}
	}

	pub fn stop_all(&mut self) {
		for (_, mut entry) in self.sessions.drain() {
			entry.session.stop();
		}
	}

	pub fn reload(&mut self, index: CameraIndex, url: &str, target: RenderTarget, options: SessionOptions) -> StartOutcome {
		self.stop(index);
		self.start(index, url, target, options)
	}

	/// Moves an existing session to another render target.
	pub fn rebind(&mut self, index: CameraIndex, target: RenderTarget) -> bool {
		let entry = match self.sessions.get_mut(&index) {
			Some(entry) => entry,
			None => return false,
		};
		match entry.session.rebind(target) {
			Ok(_) => true,
			Err(err) => {
				warn!("Failed to move camera {} to {:?}; error was {}", index, target, err);
				false
			}
		}
	}

	pub fn get(&self, index: CameraIndex) -> Option<&dyn StreamSession> {
		self.sessions.get(&index).map(|entry| entry.session.as_ref())
	}

	pub fn get_mut(&mut self, index: CameraIndex) -> Option<&mut (dyn StreamSession + 'static)> {
		self.sessions.get_mut(&index).map(|entry| entry.session.as_mut())
	}

	pub fn profile(&self, index: CameraIndex) -> Option<StreamProfile> {
		self.sessions.get(&index).map(|entry| entry.profile)
	}

	pub fn contains(&self, index: CameraIndex) -> bool {
		self.sessions.contains_key(&index)
	}

	pub fn is_live(&self, index: CameraIndex) -> bool {
		self.get(index).map_or(false, |session| session.is_live())
	}

	pub fn indices(&self) -> Vec<CameraIndex> {
		let mut indices: Vec<CameraIndex> = self.sessions.keys().copied().collect();
		indices.sort_unstable();
		indices
	}

	pub fn sessions_mut(&mut self) -> impl Iterator<Item = (CameraIndex, &mut (dyn StreamSession + 'static))> {
		self.sessions.iter_mut().map(|(index, entry)| (*index, entry.session.as_mut()))
	}

	pub fn len(&self) -> usize {
		self.sessions.len()
	}

	pub fn is_empty(&self) -> bool {
		self.sessions.is_empty()
	}
}

impl Drop for SessionPool {
	fn drop(&mut self) {
		self.stop_all();
	}
}
