use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};
use parking_lot::Mutex;

use log::{debug, info, warn};

use crate::common::{Frame, RenderTarget, SessionOptions};
use crate::engine::{DecodeEngine, FrameSource, PlaybackEngine, Player};
use crate::error::Result;
use crate::registry::redact_credentials;



/// What the renderer should show for a session right now.
#[derive(Clone)]
#[derive(Debug)]
pub enum SessionView {
	Frame(Arc<Frame>),
	/// The engine draws into the render target by itself.
	Rendering,
	NoFrame,
}

/// One live pipeline bound to one camera and one render target.
pub trait StreamSession: Send {
	fn target(&self) -> RenderTarget;
	fn rebind(&mut self, target: RenderTarget) -> Result<()>;
	fn set_muted(&mut self, muted: bool);
	fn is_muted(&self) -> bool;
	fn is_live(&self) -> bool;
	fn view(&self) -> SessionView;
	/// Releases everything the session holds. Must be safe to call more than once.
	fn stop(&mut self);
}

pub trait SessionFactory {
	fn open(&self, url: &str, target: RenderTarget, options: SessionOptions) -> Result<Box<dyn StreamSession>>;
}



/// Single-slot mailbox between a reader thread and the UI. Newer frames overwrite older ones.
#[derive(Clone)]
#[derive(Default)]
pub struct FrameSlot {
	latest: Arc<Mutex<Option<Arc<Frame>>>>,
}

impl FrameSlot {
	pub fn publish(&self, frame: Frame) {
		*self.latest.lock() = Some(Arc::new(frame));
	}

	pub fn clear(&self) {
		*self.latest.lock() = None;
	}

	pub fn latest(&self) -> Option<Arc<Frame>> {
		self.latest.lock().clone()
	}
}



#[derive(Clone, Copy)]
#[derive(Debug)]
pub struct PullTiming {
	/// Pause after a failed or ended read before trying again.
	pub retry_delay: Duration,
	/// Longest `stop()` waits for the reader thread.
	pub stop_timeout: Duration,
}

impl Default for PullTiming {
	fn default() -> Self {
		PullTiming {
			retry_delay: Duration::from_secs(1),
			stop_timeout: Duration::from_secs(1),
		}
	}
}

/// Session that owns a reader thread pulling from a [`FrameSource`].
pub struct PullSession {
	label: String,
	target: RenderTarget,
	muted: bool,
	slot: FrameSlot,
	running: Arc<AtomicBool>,
	// Dropping this wakes the reader out of its retry pause.
	stop_tx: Option<Sender<()>>,
	// Disconnects once the reader has released its source.
	done_rx: Receiver<()>,
	worker: Option<JoinHandle<()>>,
	stop_timeout: Duration,
}

impl PullSession {
	pub fn start(engine: &dyn DecodeEngine, url: &str, target: RenderTarget, options: SessionOptions, timing: PullTiming) -> Result<PullSession> {
		let label = redact_credentials(url);
		let source = engine.open(url)?;

		let slot = FrameSlot::default();
		let running = Arc::new(AtomicBool::new(true));
		let (stop_tx, stop_rx) = bounded::<()>(0);
		let (done_tx, done_rx) = bounded::<()>(0);

		let worker = {
			let slot = slot.clone();
			let running = running.clone();
			let label = label.clone();
			thread::Builder::new()
				.name("camera-reader".to_string())
				.spawn(move || {
					read_frames(source, &slot, &running, &stop_rx, timing.retry_delay, &label);
					drop(done_tx);
				})?
		};
		debug!("Started reader for {}", label);

		Ok(PullSession {
			label,
			target,
			muted: options.muted,
			slot,
			running,
			stop_tx: Some(stop_tx),
			done_rx,
			worker: Some(worker),
			stop_timeout: timing.stop_timeout,
		})
	}

	pub fn latest_frame(&self) -> Option<Arc<Frame>> {
		self.slot.latest()
	}
}

fn read_frames(mut source: Box<dyn FrameSource>, slot: &FrameSlot, running: &AtomicBool, stop_rx: &Receiver<()>, retry_delay: Duration, label: &str) {
	let mut signal = true;

	while running.load(Ordering::Acquire) {
		let failure = match source.pull() {
			Ok(Some(frame)) => {
				if !signal {
					info!("Signal restored on {}", label);
					signal = true;
				}
				slot.publish(frame);
				continue;
			},
			Ok(None) => "end of stream".to_string(),
			Err(err) => err.to_string(),
		};

		slot.clear();
		if signal {
			info!("Lost signal on {} ({}); retrying every {:?}", label, failure, retry_delay);
			signal = false;
		}
		match stop_rx.recv_timeout(retry_delay) {
			Err(RecvTimeoutError::Timeout) => {},
			_ => break,
		}
	}

	drop(source);
}

impl StreamSession for PullSession {
	fn target(&self) -> RenderTarget {
		self.target
	}

	fn rebind(&mut self, target: RenderTarget) -> Result<()> {
		// The renderer polls by camera, so moving the session is only bookkeeping.
		self.target = target;
		Ok(())
	}

	fn set_muted(&mut self, muted: bool) {
		self.muted = muted;
	}

	fn is_muted(&self) -> bool {
		self.muted
	}

	fn is_live(&self) -> bool {
		match &self.worker {
			Some(worker) => self.running.load(Ordering::Acquire) && !worker.is_finished(),
			None => false,
		}
	}

	fn view(&self) -> SessionView {
		match self.slot.latest() {
			Some(frame) => SessionView::Frame(frame),
			None => SessionView::NoFrame,
		}
	}

	fn stop(&mut self) {
		let worker = match self.worker.take() {
			Some(worker) => worker,
			None => return,
		};

		self.running.store(false, Ordering::Release);
		self.stop_tx.take();

		match self.done_rx.recv_timeout(self.stop_timeout) {
			Err(RecvTimeoutError::Timeout) => {
				// A read is stuck in the source. The thread releases it whenever the read returns.
				warn!("Reader for {} did not stop within {:?}; detaching it", self.label, self.stop_timeout);
			},
			_ => {
				if worker.join().is_err() {
					warn!("Reader for {} panicked", self.label);
				}
			}
		}
		self.slot.clear();
		debug!("Stopped reader for {}", self.label);
	}
}

impl Drop for PullSession {
	fn drop(&mut self) {
		self.stop();
	}
}



/// Session driving a [`Player`] that renders on its own.
pub struct PlayerSession {
	player: Box<dyn Player>,
	target: RenderTarget,
	muted: bool,
	stopped: bool,
}

impl PlayerSession {
	pub fn start(engine: &dyn PlaybackEngine, url: &str, target: RenderTarget, options: SessionOptions) -> Result<PlayerSession> {
		let mut player = engine.create(url)?;
		player.bind(target)?;
		player.set_muted(options.muted);
		player.play()?;

		Ok(PlayerSession {
			player,
			target,
			muted: options.muted,
			stopped: false,
		})
	}
}

impl StreamSession for PlayerSession {
	fn target(&self) -> RenderTarget {
		self.target
	}

	fn rebind(&mut self, target: RenderTarget) -> Result<()> {
		self.player.bind(target)?;
		self.target = target;
		Ok(())
	}

	fn set_muted(&mut self, muted: bool) {
		self.player.set_muted(muted);
		self.muted = muted;
	}

	fn is_muted(&self) -> bool {
		self.muted
	}

	fn is_live(&self) -> bool {
		!self.stopped && self.player.is_playing()
	}

	fn view(&self) -> SessionView {
		if self.is_live() {
			SessionView::Rendering
		} else {
			SessionView::NoFrame
		}
	}

	fn stop(&mut self) {
		if !self.stopped {
			self.player.stop();
			self.stopped = true;
		}
	}
}

impl Drop for PlayerSession {
	fn drop(&mut self) {
		self.stop();
	}
}



pub struct PullSessionFactory {
	engine: Arc<dyn DecodeEngine>,
	timing: PullTiming,
}

impl PullSessionFactory {
	pub fn new(engine: Arc<dyn DecodeEngine>, timing: PullTiming) -> PullSessionFactory {
		PullSessionFactory { engine, timing }
	}
}

impl SessionFactory for PullSessionFactory {
	fn open(&self, url: &str, target: RenderTarget, options: SessionOptions) -> Result<Box<dyn StreamSession>> {
		let session = PullSession::start(self.engine.as_ref(), url, target, options, self.timing)?;
		Ok(Box::new(session))
	}
}

pub struct PlayerSessionFactory {
	engine: Arc<dyn PlaybackEngine>,
}

impl PlayerSessionFactory {
	pub fn new(engine: Arc<dyn PlaybackEngine>) -> PlayerSessionFactory {
		PlayerSessionFactory { engine }
	}
}

impl SessionFactory for PlayerSessionFactory {
	fn open(&self, url: &str, target: RenderTarget, options: SessionOptions) -> Result<Box<dyn StreamSession>> {
		let session = PlayerSession::start(self.engine.as_ref(), url, target, options)?;
		Ok(Box::new(session))
	}
}
