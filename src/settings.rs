use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::common::StreamProfile;
use crate::error::{Error, Result};
use crate::session::PullTiming;

/// Largest page the grid will lay out.
pub const MAX_PAGE_SIZE: usize = 64;


/// What leaving single-camera view does to the enlarged camera's session.
#[derive(Clone, Copy)]
#[derive(Debug)]
#[derive(PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FullscreenExit {
	/// Go back to whatever stream the grid uses (possibly the sub-stream).
	RestoreGridStream,
	/// Keep the full-resolution session and move it back into its cell.
	KeepFullResolution,
}

#[derive(Clone, Copy)]
#[derive(Debug)]
#[derive(PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RtspTransport {
	Tcp,
	Udp,
}

/// How a sub-stream URL is derived from a main-stream URL: the first occurrence
/// of `main` is replaced by `sub`.
#[derive(Clone)]
#[derive(Debug)]
#[derive(PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct SubStreamRule {
	pub main: String,
	pub sub: String,
}

impl Default for SubStreamRule {
	fn default() -> Self {
		SubStreamRule {
			main: "subtype=0".to_string(),
			sub: "subtype=1".to_string(),
		}
	}
}

impl SubStreamRule {
	/// URLs that do not contain the main-stream marker are used as they are.
	pub fn sub_stream_url(&self, url: &str) -> String {
		if self.main.is_empty() {
			return url.to_string();
		}
		url.replacen(&self.main, &self.sub, 1)
	}
}

#[derive(Clone)]
#[derive(Debug)]
#[derive(Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerSettings {
	pub cameras_file: PathBuf,
	pub page_size: usize,
	pub grid_columns: usize,
	pub poll_interval_ms: u64,
	pub retry_delay_ms: u64,
	pub stop_timeout_ms: u64,
	pub grid_stream: StreamProfile,
	pub fullscreen_exit: FullscreenExit,
	pub sub_stream: SubStreamRule,
	pub rtsp_transport: RtspTransport,
	pub connect_timeout_ms: u64,
	pub read_timeout_ms: u64,
}

impl Default for ViewerSettings {
	fn default() -> Self {
		ViewerSettings {
			cameras_file: PathBuf::from("cameras.txt"),
			page_size: 6,
			grid_columns: 3,
			poll_interval_ms: 33,
			retry_delay_ms: 1000,
			stop_timeout_ms: 1000,
			grid_stream: StreamProfile::Main,
			fullscreen_exit: FullscreenExit::RestoreGridStream,
			sub_stream: SubStreamRule::default(),
			rtsp_transport: RtspTransport::Tcp,
			connect_timeout_ms: 5000,
			read_timeout_ms: 10000,
		}
	}
}

impl ViewerSettings {
	/// Reads settings from a JSON file. Missing fields take their defaults.
	pub fn load(path: &Path) -> Result<ViewerSettings> {
		let file = File::open(path)
			.map_err(|err| Error::Settings(format!("cannot open {}: {}", path.display(), err)))?;
		let settings: ViewerSettings = serde_json::from_reader(BufReader::new(file))
			.map_err(|err| Error::Settings(format!("{}: {}", path.display(), err)))?;
		settings.validate()?;
		Ok(settings)
	}

	pub fn validate(&self) -> Result<()> {
		if self.page_size == 0 || self.page_size > MAX_PAGE_SIZE {
			return Err(Error::Settings(format!("page_size must be between 1 and {}", MAX_PAGE_SIZE)));
		}
		if self.grid_columns == 0 {
			return Err(Error::Settings("grid_columns must be at least 1".to_string()));
		}
		if self.poll_interval_ms == 0 {
			return Err(Error::Settings("poll_interval_ms must be at least 1".to_string()));
		}
		Ok(())
	}

	pub fn grid_rows(&self) -> usize {
		let columns = self.grid_columns.max(1);
		self.page_size.div_ceil(columns)
	}

	pub fn poll_interval(&self) -> Duration {
		Duration::from_millis(self.poll_interval_ms)
	}

	pub fn pull_timing(&self) -> PullTiming {
		PullTiming {
			retry_delay: Duration::from_millis(self.retry_delay_ms),
			stop_timeout: Duration::from_millis(self.stop_timeout_ms),
		}
	}

	/// The URL to open for a camera in the given profile.
	pub fn stream_url(&self, url: &str, profile: StreamProfile) -> String {
		match profile {
			StreamProfile::Main => url.to_string(),
			StreamProfile::Sub => self.sub_stream.sub_stream_url(url),
		}
	}
}
