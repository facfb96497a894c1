use std::time::Instant;



/// Position of a camera in the registry. This is the camera's only identity.
pub type CameraIndex = usize;
pub type CameraList = Vec<CameraEntry>;

#[derive(Clone)]
#[derive(Debug)]
#[derive(PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
pub struct CameraEntry {
	pub url: String,
	pub name: String,
}

impl CameraEntry {
	/// Builds an entry for the camera at `index`, naming it from the URL or "Camera N".
	pub fn new(index: CameraIndex, url: String) -> CameraEntry {
		let fallback = format!("Camera {}", index + 1);
		let name = crate::registry::extract_display_name(&url, &fallback);
		CameraEntry { url, name }
	}
}

/// A surface a session draws into. The toolkit maps these onto its own window handles.
#[derive(Clone, Copy)]
#[derive(Debug)]
#[derive(PartialEq, Eq, Hash)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderTarget {
	/// Grid cell, numbered from 0 within the current page.
	Cell(usize),
	Fullscreen,
}

#[derive(Clone, Copy)]
#[derive(Debug)]
#[derive(PartialEq, Eq)]
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamProfile {
	Main,
	Sub,
}

impl Default for StreamProfile {
	fn default() -> Self {
		StreamProfile::Main
	}
}

#[derive(Clone, Copy)]
#[derive(Debug)]
#[derive(PartialEq, Eq)]
pub struct SessionOptions {
	pub profile: StreamProfile,
	pub muted: bool,
}

impl Default for SessionOptions {
	fn default() -> Self {
		SessionOptions {
			profile: StreamProfile::Main,
			muted: true,
		}
	}
}

/// One unit of video pulled from a source.
#[derive(Clone)]
#[derive(Debug)]
pub struct Frame {
	pub seq: u64,
	pub data: Vec<u8>,
	pub keyframe: bool,
	pub received_at: Instant,
}

impl Frame {
	pub fn new(seq: u64, data: Vec<u8>, keyframe: bool) -> Frame {
		Frame {
			seq,
			data,
			keyframe,
			received_at: Instant::now(),
		}
	}
}
