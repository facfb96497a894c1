use std::io;

use thiserror::Error;

use crate::common::CameraIndex;



#[derive(Debug, Error)]
pub enum Error {
	#[error("camera config I/O failed: {0}")]
	Io(#[from] io::Error),

	#[error("stream {url} failed: {message}")]
	Engine {
		url: String,
		message: String,
	},

	#[error("invalid stream URL {0}")]
	InvalidUrl(String),

	#[error("no camera at position {0}")]
	UnknownCamera(CameraIndex),

	#[error("camera at position {0} is not on screen")]
	NotVisible(CameraIndex),

	#[error("invalid settings: {0}")]
	Settings(String),
}

impl Error {
	pub fn engine(url: &str, message: impl ToString) -> Error {
		Error::Engine {
			url: url.to_string(),
			message: message.to_string(),
		}
	}
}

pub type Result<T> = std::result::Result<T, Error>;
