//! Engines that stand in for real decoders in unit tests.
//!
//! URLs steer the mocks: `unreachable` fails to open, `flaky` fails every read,
//! `hang` blocks inside a read, `unplayable` opens but refuses to play.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::common::{Frame, RenderTarget};
use crate::engine::{DecodeEngine, FrameSource, PlaybackEngine, Player};
use crate::error::{Error, Result};



pub(crate) fn wait_until(timeout: Duration, mut condition: impl FnMut() -> bool) -> bool {
	let deadline = Instant::now() + timeout;
	while Instant::now() < deadline {
		if condition() {
			return true;
		}
		thread::sleep(Duration::from_millis(5));
	}
	condition()
}

#[derive(Default)]
pub(crate) struct Counters {
	opens: AtomicUsize,
	releases: AtomicUsize,
	pulls: AtomicUsize,
}

impl Counters {
	pub(crate) fn opens(&self) -> usize {
		self.opens.load(Ordering::SeqCst)
	}

	pub(crate) fn releases(&self) -> usize {
		self.releases.load(Ordering::SeqCst)
	}

	pub(crate) fn pulls(&self) -> usize {
		self.pulls.load(Ordering::SeqCst)
	}
}



pub(crate) struct MockDecodeEngine {
	counters: Arc<Counters>,
}

impl MockDecodeEngine {
	pub(crate) fn new() -> MockDecodeEngine {
		MockDecodeEngine { counters: Arc::new(Counters::default()) }
	}

	pub(crate) fn counters(&self) -> &Counters {
		&self.counters
	}
}

impl DecodeEngine for MockDecodeEngine {
	fn open(&self, url: &str) -> Result<Box<dyn FrameSource>> {
		if url.contains("unreachable") {
			return Err(Error::engine(url, "connection refused"));
		}
		self.counters.opens.fetch_add(1, Ordering::SeqCst);
		Ok(Box::new(MockSource {
			url: url.to_string(),
			seq: 0,
			counters: self.counters.clone(),
		}))
	}
}

struct MockSource {
	url: String,
	seq: u64,
	counters: Arc<Counters>,
}

impl FrameSource for MockSource {
	fn pull(&mut self) -> Result<Option<Frame>> {
		self.counters.pulls.fetch_add(1, Ordering::SeqCst);
		if self.url.contains("flaky") {
			return Err(Error::engine(&self.url, "read timed out"));
		}
		if self.url.contains("hang") {
			thread::sleep(Duration::from_secs(3));
			return Ok(None);
		}
		thread::sleep(Duration::from_millis(2));
		self.seq += 1;
		Ok(Some(Frame::new(self.seq, vec![0; 16], self.seq == 1)))
	}
}

impl Drop for MockSource {
	fn drop(&mut self) {
		self.counters.releases.fetch_add(1, Ordering::SeqCst);
	}
}



struct PlayerRecord {
	url: String,
	target: Option<RenderTarget>,
	muted: bool,
	playing: bool,
}

/// Shared view of every player the mock engine currently has open.
#[derive(Default)]
pub(crate) struct PlayerBook {
	records: Mutex<HashMap<u64, PlayerRecord>>,
}

impl PlayerBook {
	pub(crate) fn target_of(&self, url: &str) -> Option<RenderTarget> {
		self.records.lock()
			.values()
			.find(|record| record.url == url)
			.and_then(|record| record.target)
	}

	/// Players currently playing with sound.
	pub(crate) fn unmuted(&self) -> usize {
		self.records.lock()
			.values()
			.filter(|record| record.playing && !record.muted)
			.count()
	}

	pub(crate) fn unmuted_url(&self) -> Option<String> {
		self.records.lock()
			.values()
			.find(|record| record.playing && !record.muted)
			.map(|record| record.url.clone())
	}

	/// Simulates a player stalling or resuming on its own.
	pub(crate) fn set_playing(&self, url: &str, playing: bool) {
		for record in self.records.lock().values_mut().filter(|record| record.url == url) {
			record.playing = playing;
		}
	}

	pub(crate) fn open(&self) -> usize {
		self.records.lock().len()
	}
}

pub(crate) struct MockPlaybackEngine {
	counters: Arc<Counters>,
	players: Arc<PlayerBook>,
	next_id: AtomicU64,
}

impl MockPlaybackEngine {
	pub(crate) fn new() -> MockPlaybackEngine {
		MockPlaybackEngine {
			counters: Arc::new(Counters::default()),
			players: Arc::new(PlayerBook::default()),
			next_id: AtomicU64::new(0),
		}
	}

	pub(crate) fn counters(&self) -> &Counters {
		&self.counters
	}

	pub(crate) fn players(&self) -> &PlayerBook {
		&self.players
	}
}

impl PlaybackEngine for MockPlaybackEngine {
	fn create(&self, url: &str) -> Result<Box<dyn Player>> {
		if url.contains("unreachable") {
			return Err(Error::engine(url, "connection refused"));
		}
		self.counters.opens.fetch_add(1, Ordering::SeqCst);
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		self.players.records.lock().insert(id, PlayerRecord {
			url: url.to_string(),
			target: None,
			muted: false,
			playing: false,
		});
		Ok(Box::new(MockPlayer {
			id,
			url: url.to_string(),
			counters: self.counters.clone(),
			players: self.players.clone(),
		}))
	}
}

struct MockPlayer {
	id: u64,
	url: String,
	counters: Arc<Counters>,
	players: Arc<PlayerBook>,
}

impl MockPlayer {
	fn update(&self, change: impl FnOnce(&mut PlayerRecord)) {
		if let Some(record) = self.players.records.lock().get_mut(&self.id) {
			change(record);
		}
	}
}

impl Player for MockPlayer {
	fn bind(&mut self, target: RenderTarget) -> Result<()> {
		self.update(|record| record.target = Some(target));
		Ok(())
	}

	fn play(&mut self) -> Result<()> {
		if self.url.contains("unplayable") {
			return Err(Error::engine(&self.url, "no playable stream"));
		}
		self.update(|record| record.playing = true);
		Ok(())
	}

	fn stop(&mut self) {
		self.update(|record| record.playing = false);
	}

	fn set_muted(&mut self, muted: bool) {
		self.update(|record| record.muted = muted);
	}

	fn is_playing(&self) -> bool {
		self.players.records.lock()
			.get(&self.id)
			.map(|record| record.playing)
			.unwrap_or(false)
	}
}

impl Drop for MockPlayer {
	fn drop(&mut self) {
		self.players.records.lock().remove(&self.id);
		self.counters.releases.fetch_add(1, Ordering::SeqCst);
	}
}
