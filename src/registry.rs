use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use tokio::io::AsyncWriteExt;
use url::Url;

use log::{info, warn, error};

use crate::common::{CameraEntry, CameraIndex, CameraList};
use crate::error::Result;



/// Ordered list of cameras backed by a flat file with one stream URL per line.
#[derive(Debug)]
pub struct CameraRegistry {
	path: PathBuf,
	cameras: CameraList,
}

impl CameraRegistry {
	/// Reads the camera file. A missing or unreadable file yields an empty registry.
	pub fn load(path: impl Into<PathBuf>) -> CameraRegistry {
		let path = path.into();
		let urls = read_camera_urls(&path);
		CameraRegistry::with_urls(path, urls)
	}

	pub fn with_urls(path: impl Into<PathBuf>, urls: Vec<String>) -> CameraRegistry {
		CameraRegistry {
			path: path.into(),
			cameras: to_entries(urls),
		}
	}

	pub fn path(&self) -> &Path {
		&self.path
	}

	pub fn cameras(&self) -> &[CameraEntry] {
		&self.cameras
	}

	pub fn get(&self, index: CameraIndex) -> Option<&CameraEntry> {
		self.cameras.get(index)
	}

	pub fn len(&self) -> usize {
		self.cameras.len()
	}

	pub fn is_empty(&self) -> bool {
		self.cameras.is_empty()
	}

	pub fn urls(&self) -> Vec<String> {
		self.cameras.iter().map(|camera| camera.url.clone()).collect()
	}

	/// Starts an edit session over a copy of the current URLs.
	pub fn begin_edit(&self) -> RegistryEdit {
		RegistryEdit { urls: self.urls() }
	}

	/// Replaces the whole list. Display names are recomputed since positions may have shifted.
	pub fn replace(&mut self, urls: Vec<String>) {
		self.cameras = to_entries(urls);
	}

	/// Overwrites the camera file with the current list.
	pub async fn save(&self) -> Result<()> {
		match write_camera_urls(&self.path, &self.urls()).await {
			Ok(_) => {
				info!("Wrote camera file {}", self.path.display());
				Ok(())
			},
			Err(err) => {
				error!("Failed to write camera file {}; error was {}", self.path.display(), err);
				Err(err.into())
			}
		}
	}
}

fn to_entries(urls: Vec<String>) -> CameraList {
	urls.into_iter()
		.enumerate()
		.map(|(index, url)| CameraEntry::new(index, url))
		.collect()
}



/// Working copy of the camera list. Committing hands the list back to the viewer;
/// dropping the edit discards it.
#[derive(Clone)]
#[derive(Debug)]
pub struct RegistryEdit {
	urls: Vec<String>,
}

impl RegistryEdit {
	pub fn urls(&self) -> &[String] {
		&self.urls
	}

	pub fn add(&mut self, url: &str) -> bool {
		let url = url.trim();
		if url.is_empty() {
			return false;
		}
		self.urls.push(url.to_string());
		true
	}

	pub fn edit(&mut self, position: usize, url: &str) -> bool {
		let url = url.trim();
		match self.urls.get_mut(position) {
			Some(existing) if !url.is_empty() => {
				*existing = url.to_string();
				true
			},
			_ => false,
		}
	}

	pub fn remove(&mut self, position: usize) -> Option<String> {
		if position < self.urls.len() {
			Some(self.urls.remove(position))
		} else {
			None
		}
	}

	pub fn into_urls(self) -> Vec<String> {
		self.urls
	}
}



pub fn parse_camera_urls<R: BufRead>(reader: R) -> io::Result<Vec<String>> {
	let mut urls = Vec::new();
	for line in reader.lines() {
		let line = line?;
		let url = line.trim();
		if !url.is_empty() {
			urls.push(url.to_string());
		}
	}
	Ok(urls)
}

pub fn read_camera_urls(path: &Path) -> Vec<String> {
	let file_result = File::open(path);

	match file_result {
		Ok(file) => {
			match parse_camera_urls(BufReader::new(file)) {
				Ok(urls) => urls,
				Err(err) => {
					error!("Failed to read camera file {}; error was {}", path.display(), err);
					Vec::new()
				}
			}
		},
		Err(err) => {
			// First time running (before the file is created) we should encounter this, so not necessarily an error
			warn!("Failed to open camera file {} for reading; error was {}", path.display(), err);
			Vec::new()
		}
	}
}

pub async fn write_camera_urls(path: &Path, urls: &[String]) -> io::Result<()> {
	let file = tokio::fs::File::create(path).await?;

	let mut writer = tokio::io::BufWriter::new(file);
	for url in urls {
		writer.write_all(url.as_bytes()).await?;
		writer.write_all(b"\n").await?;
	}
	writer.flush().await?;
	Ok(())
}

/// Name to show for a stream URL: the user-info name if present, else the host, else `fallback`.
pub fn extract_display_name(url: &str, fallback: &str) -> String {
	let parsed = match Url::parse(url.trim()) {
		Ok(parsed) => parsed,
		Err(_) => return fallback.to_string(),
	};

	if !parsed.username().is_empty() {
		return parsed.username().to_string();
	}
	match parsed.host_str() {
		Some(host) if !host.is_empty() => host.to_string(),
		_ => fallback.to_string(),
	}
}

/// The URL with its password removed, for log lines.
pub fn redact_credentials(url: &str) -> String {
	match Url::parse(url) {
		Ok(mut parsed) => {
			if parsed.password().is_some() && parsed.set_password(None).is_err() {
				return "<unprintable url>".to_string();
			}
			parsed.to_string()
		},
		Err(_) => url.to_string(),
	}
}



#[cfg(test)]
mod tests {
	use super::*;

	use std::sync::atomic::{AtomicUsize, Ordering};

	static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

	fn temp_camera_file() -> PathBuf {
		let n = NEXT_FILE.fetch_add(1, Ordering::SeqCst);
		std::env::temp_dir().join(format!("camera-viewer-registry-{}-{}.txt", std::process::id(), n))
	}

	#[test]
	fn display_name_prefers_user_info() {
		assert_eq!(extract_display_name("rtsp://alice:pw@10.0.0.5:554/s1", "Camera 1"), "alice");
	}

	#[test]
	fn display_name_falls_back_to_host() {
		assert_eq!(extract_display_name("rtsp://10.0.0.5/s1", "Camera 1"), "10.0.0.5");
		assert_eq!(extract_display_name("rtsp://cam-lobby.local:554/live", "Camera 1"), "cam-lobby.local");
	}

	#[test]
	fn display_name_of_garbage_is_fallback() {
		assert_eq!(extract_display_name("definitely not a url", "Camera 4"), "Camera 4");
		assert_eq!(extract_display_name("", "Camera 4"), "Camera 4");
		assert_eq!(extract_display_name("rtsp://[::1", "Camera 4"), "Camera 4");
	}

	#[test]
	fn redaction_drops_password_only() {
		assert_eq!(redact_credentials("rtsp://alice:pw@10.0.0.5:554/s1"), "rtsp://alice@10.0.0.5:554/s1");
		assert_eq!(redact_credentials("rtsp://10.0.0.5/s1"), "rtsp://10.0.0.5/s1");
	}

	#[test]
	fn entries_get_positional_fallback_names() {
		let registry = CameraRegistry::with_urls("unused.txt", vec![
			"rtsp://bob@192.168.1.20/main".to_string(),
			"garbage".to_string(),
		]);
		assert_eq!(registry.get(0).map(|c| c.name.as_str()), Some("bob"));
		assert_eq!(registry.get(1).map(|c| c.name.as_str()), Some("Camera 2"));
	}

	#[test]
	fn blank_lines_are_ignored() {
		let contents = "rtsp://a\n\n   \nrtsp://b  \n";
		let urls = parse_camera_urls(contents.as_bytes()).unwrap();
		assert_eq!(urls, vec!["rtsp://a", "rtsp://b"]);
	}

	#[test]
	fn missing_file_loads_empty() {
		let registry = CameraRegistry::load(temp_camera_file());
		assert!(registry.is_empty());
	}

	#[tokio::test]
	async fn save_then_load_keeps_order() {
		let path = temp_camera_file();
		let registry = CameraRegistry::with_urls(&path, vec!["rtsp://a".to_string(), "rtsp://b".to_string()]);
		registry.save().await.unwrap();

		let reloaded = CameraRegistry::load(&path);
		assert_eq!(reloaded.urls(), vec!["rtsp://a", "rtsp://b"]);

		let _ = std::fs::remove_file(&path);
	}

	#[tokio::test]
	async fn save_to_unwritable_path_fails() {
		let path = std::env::temp_dir().join("camera-viewer-no-such-dir").join("nested").join("cameras.txt");
		let registry = CameraRegistry::with_urls(&path, vec!["rtsp://a".to_string()]);
		assert!(registry.save().await.is_err());
		// In-memory state is untouched.
		assert_eq!(registry.len(), 1);
	}

	#[test]
	fn edit_session_add_edit_remove() {
		let registry = CameraRegistry::with_urls("unused.txt", vec!["rtsp://a".to_string(), "rtsp://b".to_string()]);
		let mut edit = registry.begin_edit();

		assert!(edit.add("  rtsp://c  "));
		assert!(!edit.add("   "));
		assert!(edit.edit(0, "rtsp://a2"));
		assert!(!edit.edit(7, "rtsp://x"));
		assert!(!edit.edit(1, ""));
		assert_eq!(edit.remove(1), Some("rtsp://b".to_string()));
		assert_eq!(edit.remove(5), None);
		assert_eq!(edit.urls(), ["rtsp://a2", "rtsp://c"]);

		// The registry itself is untouched until the edit is applied.
		assert_eq!(registry.urls(), vec!["rtsp://a", "rtsp://b"]);
	}

	#[test]
	fn duplicate_urls_are_kept() {
		let mut registry = CameraRegistry::with_urls("unused.txt", Vec::new());
		registry.replace(vec!["rtsp://a".to_string(), "rtsp://a".to_string()]);
		assert_eq!(registry.len(), 2);
	}
}
