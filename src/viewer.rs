use std::sync::Arc;

use log::{debug, info};

use crate::common::{CameraIndex, Frame, RenderTarget, SessionOptions, StreamProfile};
use crate::error::{Error, Result};
use crate::focus::{Direction, EscapeAction, Focus, FocusAudio};
use crate::pagination::Paginator;
use crate::pool::{SessionPool, StartOutcome};
use crate::registry::{CameraRegistry, RegistryEdit};
use crate::session::{SessionFactory, SessionView};
use crate::settings::{FullscreenExit, ViewerSettings};



/// What a render target should display on this poll.
#[derive(Clone)]
#[derive(Debug)]
pub enum FrameView {
	Frame(Arc<Frame>),
	/// A playback engine is drawing into the target itself.
	Rendering,
	NoSignal,
	/// Grid cell past the end of the camera list.
	Empty,
}

impl FrameView {
	pub fn has_signal(&self) -> bool {
		matches!(self, FrameView::Frame(_) | FrameView::Rendering)
	}
}

#[derive(Clone)]
#[derive(Debug)]
pub struct Tile {
	pub target: RenderTarget,
	pub index: Option<CameraIndex>,
	pub name: Option<String>,
	pub audio: bool,
	pub view: FrameView,
}

#[derive(Clone)]
#[derive(Debug)]
#[derive(Serialize)]
pub struct CameraStatus {
	pub index: CameraIndex,
	pub name: String,
	pub visible: bool,
	pub live: bool,
	pub muted: Option<bool>,
	pub target: Option<RenderTarget>,
}

#[derive(Clone)]
#[derive(Debug)]
#[derive(Serialize)]
pub struct ViewerStatus {
	pub current_page: usize,
	pub total_pages: usize,
	pub can_prev: bool,
	pub can_next: bool,
	pub fullscreen: Option<CameraIndex>,
	pub true_fullscreen: bool,
	pub audio_source: Option<CameraIndex>,
	pub live_sessions: usize,
	pub cameras: Vec<CameraStatus>,
}



/// Ties the camera list, the live sessions, paging and focus together.
/// Every method is meant to be called from the UI thread.
pub struct Viewer {
	registry: CameraRegistry,
	pool: SessionPool,
	pages: Paginator,
	focus: FocusAudio,
	settings: ViewerSettings,
}

impl Viewer {
	pub fn new(registry: CameraRegistry, factory: Box<dyn SessionFactory>, settings: ViewerSettings) -> Viewer {
		let pages = Paginator::new(settings.page_size, registry.len());
		Viewer {
			registry,
			pool: SessionPool::new(factory),
			pages,
			focus: FocusAudio::new(),
			settings,
		}
	}

	/// Starts the sessions of the first page.
	pub fn open(&mut self) {
		info!("Showing {} cameras, {} per page", self.registry.len(), self.pages.page_size());
		self.show_page();
	}

	pub fn registry(&self) -> &CameraRegistry {
		&self.registry
	}

	pub fn pages(&self) -> &Paginator {
		&self.pages
	}

	pub fn focus(&self) -> &FocusAudio {
		&self.focus
	}

	pub fn pool(&self) -> &SessionPool {
		&self.pool
	}

	pub fn settings(&self) -> &ViewerSettings {
		&self.settings
	}

	fn camera_url(&self, index: CameraIndex) -> Result<String> {
		self.registry.get(index)
			.map(|camera| camera.url.clone())
			.ok_or(Error::UnknownCamera(index))
	}

	/// Restarts every session for the current page. Cameras off the page get no session.
	fn show_page(&mut self) {
		self.pool.stop_all();
		for index in self.pages.visible() {
			self.start_grid(index);
		}
		self.focus.sync_audio(&mut self.pool);
		debug!("Page {} of {} showing cameras {:?}", self.pages.current_page() + 1, self.pages.total_pages(), self.pages.visible());
	}

	fn start_grid(&mut self, index: CameraIndex) -> StartOutcome {
		let slot = match self.pages.slot_of(index) {
			Some(slot) => slot,
			None => return StartOutcome::Failed,
		};
		let url = match self.camera_url(index) {
			Ok(url) => url,
			Err(_) => return StartOutcome::Failed,
		};
		let profile = self.settings.grid_stream;
		let url = self.settings.stream_url(&url, profile);
		self.pool.start(index, &url, RenderTarget::Cell(slot), SessionOptions { profile, muted: true })
	}

	pub fn next_page(&mut self) -> bool {
		if self.focus.focus() != Focus::Grid || !self.pages.next() {
			return false;
		}
		self.show_page();
		true
	}

	pub fn prev_page(&mut self) -> bool {
		if self.focus.focus() != Focus::Grid || !self.pages.prev() {
			return false;
		}
		self.show_page();
		true
	}

	pub fn enter_fullscreen(&mut self, index: CameraIndex) -> Result<()> {
		if index >= self.registry.len() {
			return Err(Error::UnknownCamera(index));
		}
		if let Some(previous) = self.focus.enter_fullscreen(index) {
			if previous == index {
				return Ok(());
			}
			self.release_fullscreen(previous);
		}
		self.bind_fullscreen(index);
		self.focus.sync_audio(&mut self.pool);
		Ok(())
	}

	/// Back to the grid. Returns false if no camera was enlarged.
	pub fn exit_fullscreen(&mut self) -> bool {
		match self.focus.leave_fullscreen() {
			Some(index) => {
				self.restore_grid(index);
				true
			},
			None => false,
		}
	}

	pub fn fullscreen_next(&mut self) -> Option<CameraIndex> {
		self.navigate(Direction::Next)
	}

	pub fn fullscreen_prev(&mut self) -> Option<CameraIndex> {
		self.navigate(Direction::Prev)
	}

	fn navigate(&mut self, direction: Direction) -> Option<CameraIndex> {
		let (from, to) = self.focus.navigate(direction, self.registry.len())?;
		self.release_fullscreen(from);
		self.bind_fullscreen(to);
		self.focus.sync_audio(&mut self.pool);
		Some(to)
	}

	pub fn set_true_fullscreen(&mut self, enabled: bool) -> bool {
		self.focus.set_true_fullscreen(enabled)
	}

	pub fn toggle_true_fullscreen(&mut self) -> bool {
		let enabled = !self.focus.is_true_fullscreen();
		self.focus.set_true_fullscreen(enabled)
	}

	/// Leaves true fullscreen if active, else returns to the grid.
	pub fn escape(&mut self) -> EscapeAction {
		let action = self.focus.escape();
		if let EscapeAction::LeftFullscreen(index) = action {
			self.restore_grid(index);
		}
		action
	}

	fn restore_grid(&mut self, index: CameraIndex) {
		self.release_fullscreen(index);
		// Cameras that failed to open earlier get another chance when the grid comes back.
		for visible in self.pages.visible() {
			self.start_grid(visible);
		}
		self.focus.sync_audio(&mut self.pool);
	}

	/// Puts the full-resolution stream of `index` on the fullscreen target.
	fn bind_fullscreen(&mut self, index: CameraIndex) {
		let url = match self.camera_url(index) {
			Ok(url) => url,
			Err(_) => return,
		};
		let options = SessionOptions { profile: StreamProfile::Main, muted: true };

		match self.pool.profile(index) {
			Some(StreamProfile::Main) => {
				if !self.pool.rebind(index, RenderTarget::Fullscreen) {
					self.pool.reload(index, &url, RenderTarget::Fullscreen, options);
				}
			},
			Some(StreamProfile::Sub) => {
				self.pool.reload(index, &url, RenderTarget::Fullscreen, options);
			},
			None => {
				self.pool.start(index, &url, RenderTarget::Fullscreen, options);
			}
		}
	}

	/// Moves `index` off the fullscreen target: back into its cell if it is on
	/// the current page, otherwise its session is stopped.
	fn release_fullscreen(&mut self, index: CameraIndex) {
		let slot = match self.pages.slot_of(index) {
			Some(slot) => slot,
			None => {
				self.pool.stop(index);
				return;
			}
		};

		let keep_session = match self.pool.profile(index) {
			Some(profile) if profile == self.settings.grid_stream => true,
			Some(StreamProfile::Main) => self.settings.fullscreen_exit == FullscreenExit::KeepFullResolution,
			_ => false,
		};
		if keep_session && self.pool.rebind(index, RenderTarget::Cell(slot)) {
			return;
		}
		self.pool.stop(index);
		self.start_grid(index);
	}

	/// Gives `index` the audio or takes it away. Returns whether `index` has audio now.
	pub fn toggle_audio(&mut self, index: CameraIndex) -> bool {
		self.focus.toggle_audio(index, &mut self.pool)
	}

	/// Restarts the session of one on-screen camera.
	pub fn reload(&mut self, index: CameraIndex) -> Result<StartOutcome> {
		let url = self.camera_url(index)?;

		let outcome = if self.focus.fullscreen_index() == Some(index) {
			let options = SessionOptions { profile: StreamProfile::Main, muted: true };
			self.pool.reload(index, &url, RenderTarget::Fullscreen, options)
		} else {
			let slot = self.pages.slot_of(index).ok_or(Error::NotVisible(index))?;
			let profile = self.pool.profile(index).unwrap_or(self.settings.grid_stream);
			let url = self.settings.stream_url(&url, profile);
			self.pool.reload(index, &url, RenderTarget::Cell(slot), SessionOptions { profile, muted: true })
		};
		info!("Reloaded camera {}: {:?}", index, outcome);

		self.focus.sync_audio(&mut self.pool);
		Ok(outcome)
	}

	pub fn begin_edit(&self) -> RegistryEdit {
		self.registry.begin_edit()
	}

	/// Replaces the camera list with the edited one and writes it to disk.
	///
	/// The new list is live even if writing fails; the error is returned so the
	/// front end can tell the user.
	pub async fn commit_edit(&mut self, edit: RegistryEdit) -> Result<()> {
		self.focus.leave_fullscreen();
		self.pool.stop_all();
		// Positions may now refer to different cameras.
		self.focus.clear_audio();

		self.registry.replace(edit.into_urls());
		self.pages.set_camera_count(self.registry.len());
		self.show_page();

		self.registry.save().await
	}

	/// Stops every session. Used on application close.
	pub fn close(&mut self) {
		self.focus.leave_fullscreen();
		self.focus.clear_audio();
		self.pool.stop_all();
		info!("Closed all camera sessions");
	}

	fn view_of(&self, index: CameraIndex) -> FrameView {
		match self.pool.get(index).map(|session| session.view()) {
			Some(SessionView::Frame(frame)) => FrameView::Frame(frame),
			Some(SessionView::Rendering) => FrameView::Rendering,
			Some(SessionView::NoFrame) | None => FrameView::NoSignal,
		}
	}

	fn tile_for(&self, target: RenderTarget, index: CameraIndex) -> Tile {
		Tile {
			target,
			index: Some(index),
			name: self.registry.get(index).map(|camera| camera.name.clone()),
			audio: self.focus.audio_source() == Some(index),
			view: self.view_of(index),
		}
	}

	/// One tile per grid cell of the current page, including empty cells.
	pub fn tiles(&self) -> Vec<Tile> {
		(0..self.pages.page_size())
			.map(|slot| {
				let target = RenderTarget::Cell(slot);
				match self.pages.index_at(slot) {
					Some(index) => self.tile_for(target, index),
					None => Tile {
						target,
						index: None,
						name: None,
						audio: false,
						view: FrameView::Empty,
					},
				}
			})
			.collect()
	}

	pub fn fullscreen_tile(&self) -> Option<Tile> {
		self.focus.fullscreen_index()
			.map(|index| self.tile_for(RenderTarget::Fullscreen, index))
	}

	/// The tiles that are actually on screen right now.
	pub fn visible_tiles(&self) -> Vec<Tile> {
		match self.fullscreen_tile() {
			Some(tile) => vec![tile],
			None => self.tiles(),
		}
	}

	pub fn status(&self) -> ViewerStatus {
		let cameras = self.registry.cameras()
			.iter()
			.enumerate()
			.map(|(index, camera)| {
				let session = self.pool.get(index);
				CameraStatus {
					index,
					name: camera.name.clone(),
					visible: self.pages.slot_of(index).is_some() || self.focus.fullscreen_index() == Some(index),
					live: session.map_or(false, |session| session.is_live()),
					muted: session.map(|session| session.is_muted()),
					target: session.map(|session| session.target()),
				}
			})
			.collect();

		ViewerStatus {
			current_page: self.pages.current_page(),
			total_pages: self.pages.total_pages(),
			can_prev: self.focus.focus() == Focus::Grid && self.pages.has_prev(),
			can_next: self.focus.focus() == Focus::Grid && self.pages.has_next(),
			fullscreen: self.focus.fullscreen_index(),
			true_fullscreen: self.focus.is_true_fullscreen(),
			audio_source: self.focus.audio_source(),
			live_sessions: self.pool.len(),
			cameras,
		}
	}
}
