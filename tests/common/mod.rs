#![allow(dead_code)]

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use clustervms_camera_viewer::common::{Frame, RenderTarget};
use clustervms_camera_viewer::engine::{DecodeEngine, FrameSource, PlaybackEngine, Player};
use clustervms_camera_viewer::registry::CameraRegistry;
use clustervms_camera_viewer::session::{PlayerSessionFactory, PullSessionFactory, PullTiming};
use clustervms_camera_viewer::settings::ViewerSettings;
use clustervms_camera_viewer::viewer::Viewer;
use clustervms_camera_viewer::Error;



static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

pub fn temp_camera_file() -> PathBuf {
	let n = NEXT_FILE.fetch_add(1, Ordering::SeqCst);
	std::env::temp_dir().join(format!("camera-viewer-it-{}-{}.txt", std::process::id(), n))
}

pub fn camera_urls(count: usize) -> Vec<String> {
	(0..count)
		.map(|i| format!("rtsp://cam{}@10.0.0.{}/stream?subtype=0", i, i + 1))
		.collect()
}

pub fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
	let deadline = Instant::now() + timeout;
	while Instant::now() < deadline {
		if condition() {
			return true;
		}
		thread::sleep(Duration::from_millis(5));
	}
	condition()
}



#[derive(Clone)]
#[derive(Debug)]
pub struct PlayerState {
	pub url: String,
	pub target: Option<RenderTarget>,
	pub muted: bool,
	pub playing: bool,
}

/// Playback engine that records what every open player is doing.
#[derive(Default)]
pub struct FakePlayback {
	players: Mutex<HashMap<usize, PlayerState>>,
	next_id: AtomicUsize,
	pub opens: AtomicUsize,
	pub releases: AtomicUsize,
}

impl FakePlayback {
	pub fn open_players(&self) -> Vec<PlayerState> {
		self.players.lock().values().cloned().collect()
	}

	pub fn on_target(&self, target: RenderTarget) -> Option<PlayerState> {
		self.players.lock().values().find(|p| p.target == Some(target)).cloned()
	}

	pub fn audible(&self) -> Vec<String> {
		self.players.lock()
			.values()
			.filter(|p| p.playing && !p.muted)
			.map(|p| p.url.clone())
			.collect()
	}

	pub fn opens(&self) -> usize {
		self.opens.load(Ordering::SeqCst)
	}

	pub fn releases(&self) -> usize {
		self.releases.load(Ordering::SeqCst)
	}
}

struct FakePlayer {
	id: usize,
	engine: Arc<FakePlayback>,
}

impl FakePlayer {
	fn update(&self, change: impl FnOnce(&mut PlayerState)) {
		if let Some(state) = self.engine.players.lock().get_mut(&self.id) {
			change(state);
		}
	}
}

impl Player for FakePlayer {
	fn bind(&mut self, target: RenderTarget) -> clustervms_camera_viewer::Result<()> {
		self.update(|state| state.target = Some(target));
		Ok(())
	}

	fn play(&mut self) -> clustervms_camera_viewer::Result<()> {
		self.update(|state| state.playing = true);
		Ok(())
	}

	fn stop(&mut self) {
		self.update(|state| state.playing = false);
	}

	fn set_muted(&mut self, muted: bool) {
		self.update(|state| state.muted = muted);
	}

	fn is_playing(&self) -> bool {
		self.engine.players.lock().get(&self.id).map_or(false, |state| state.playing)
	}
}

impl Drop for FakePlayer {
	fn drop(&mut self) {
		self.engine.players.lock().remove(&self.id);
		self.engine.releases.fetch_add(1, Ordering::SeqCst);
	}
}

/// Handle so the test and the viewer share one fake engine.
#[derive(Clone)]
#[derive(Default)]
pub struct SharedPlayback(pub Arc<FakePlayback>);

impl PlaybackEngine for SharedPlayback {
	fn create(&self, url: &str) -> clustervms_camera_viewer::Result<Box<dyn Player>> {
		if url.contains("offline") {
			return Err(Error::engine(url, "connection refused"));
		}
		let id = self.0.next_id.fetch_add(1, Ordering::SeqCst);
		self.0.opens.fetch_add(1, Ordering::SeqCst);
		self.0.players.lock().insert(id, PlayerState {
			url: url.to_string(),
			target: None,
			muted: false,
			playing: false,
		});
		Ok(Box::new(FakePlayer { id, engine: self.0.clone() }))
	}
}

pub fn player_viewer(urls: Vec<String>, settings: ViewerSettings) -> (Arc<FakePlayback>, Viewer) {
	let engine = SharedPlayback::default();
	let fake = engine.0.clone();
	let registry = CameraRegistry::with_urls(temp_camera_file(), urls);
	let viewer = Viewer::new(registry, Box::new(PlayerSessionFactory::new(Arc::new(engine))), settings);
	(fake, viewer)
}



/// Decode engine producing a steady trickle of small frames.
#[derive(Default)]
pub struct FakeDecode {
	pub opens: AtomicUsize,
	pub releases: Arc<AtomicUsize>,
}

struct FakeSource {
	seq: u64,
	releases: Arc<AtomicUsize>,
}

impl FrameSource for FakeSource {
	fn pull(&mut self) -> clustervms_camera_viewer::Result<Option<Frame>> {
		thread::sleep(Duration::from_millis(3));
		self.seq += 1;
		Ok(Some(Frame::new(self.seq, vec![7; 32], self.seq % 30 == 1)))
	}
}

impl Drop for FakeSource {
	fn drop(&mut self) {
		self.releases.fetch_add(1, Ordering::SeqCst);
	}
}

impl DecodeEngine for FakeDecode {
	fn open(&self, url: &str) -> clustervms_camera_viewer::Result<Box<dyn FrameSource>> {
		if url.contains("offline") {
			return Err(Error::engine(url, "connection refused"));
		}
		self.opens.fetch_add(1, Ordering::SeqCst);
		Ok(Box::new(FakeSource { seq: 0, releases: self.releases.clone() }))
	}
}

pub fn pull_viewer(urls: Vec<String>, settings: ViewerSettings) -> (Arc<FakeDecode>, Viewer) {
	let engine = Arc::new(FakeDecode::default());
	let timing = PullTiming {
		retry_delay: Duration::from_millis(20),
		stop_timeout: Duration::from_millis(500),
	};
	let registry = CameraRegistry::with_urls(temp_camera_file(), urls);
	let viewer = Viewer::new(registry, Box::new(PullSessionFactory::new(engine.clone(), timing)), settings);
	(engine, viewer)
}
