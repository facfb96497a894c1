//! Pull engine for RTSP cameras.
//!
//! Each source owns a small current-thread runtime and is driven from its
//! session's reader thread, so no network I/O ever happens on the UI thread.
//! Frames are the compressed video access units as they come off the wire.

use std::time::Duration;

use anyhow::{anyhow, Context};
use futures::StreamExt;
use retina::client::{Credentials, Demuxed, PlayOptions, Session, SetupOptions, TcpTransportOptions, Transport, UdpTransportOptions};
use retina::codec::CodecItem;
use tokio::runtime::{Builder, Runtime};
use url::Url;

use log::info;

use crate::common::Frame;
use crate::engine::{DecodeEngine, FrameSource};
use crate::error::{Error, Result};
use crate::registry::redact_credentials;
use crate::settings::{RtspTransport, ViewerSettings};

const TEARDOWN_GRACE: Duration = Duration::from_millis(200);


#[derive(Clone)]
#[derive(Debug)]
pub struct RtspEngine {
	transport: RtspTransport,
	connect_timeout: Duration,
	read_timeout: Duration,
}

impl RtspEngine {
	pub fn new(transport: RtspTransport, connect_timeout: Duration, read_timeout: Duration) -> RtspEngine {
		RtspEngine {
			transport,
			connect_timeout,
			read_timeout,
		}
	}

	pub fn from_settings(settings: &ViewerSettings) -> RtspEngine {
		RtspEngine::new(
			settings.rtsp_transport,
			Duration::from_millis(settings.connect_timeout_ms),
			Duration::from_millis(settings.read_timeout_ms),
		)
	}
}

impl DecodeEngine for RtspEngine {
	/// Only checks the URL. The connection is made by the first `pull`.
	fn open(&self, url: &str) -> Result<Box<dyn FrameSource>> {
		let label = redact_credentials(url);
		let parsed = Url::parse(url.trim()).map_err(|_| Error::InvalidUrl(label.clone()))?;
		match parsed.scheme() {
			"rtsp" | "rtsps" => {},
			_ => return Err(Error::InvalidUrl(label)),
		}

		let runtime = Builder::new_current_thread().enable_all().build()?;
		Ok(Box::new(RtspSource {
			url: parsed,
			label,
			engine: self.clone(),
			runtime,
			connection: None,
			seq: 0,
		}))
	}
}



struct Connection {
	demuxed: Demuxed,
	stream_index: usize,
}

struct RtspSource {
	url: Url,
	label: String,
	engine: RtspEngine,
	runtime: Runtime,
	connection: Option<Connection>,
	seq: u64,
}

impl FrameSource for RtspSource {
	fn pull(&mut self) -> Result<Option<Frame>> {
		let RtspSource { url, label, engine, runtime, connection, seq } = self;

		if connection.is_none() {
			let connect_timeout = engine.connect_timeout;
			let transport = engine.transport;
			let connected = runtime.block_on(async { tokio::time::timeout(connect_timeout, connect(url, transport)).await });
			match connected {
				Ok(Ok(established)) => {
					info!("Connected to {}", label);
					*connection = Some(established);
				},
				Ok(Err(err)) => return Err(Error::engine(label, format!("{:#}", err))),
				Err(_) => return Err(Error::engine(label, format!("no answer within {:?}", engine.connect_timeout))),
			}
		}

		let established = match connection.as_mut() {
			Some(established) => established,
			None => return Ok(None),
		};
		let read_timeout = engine.read_timeout;
		let next = runtime.block_on(async { tokio::time::timeout(read_timeout, next_video_frame(established)).await });
		match next {
			Ok(Ok(Some((data, keyframe)))) => {
				*seq += 1;
				Ok(Some(Frame::new(*seq, data, keyframe)))
			},
			Ok(Ok(None)) => {
				*connection = None;
				Ok(None)
			},
			Ok(Err(err)) => {
				*connection = None;
				Err(Error::engine(label, err))
			},
			Err(_) => {
				*connection = None;
				Err(Error::engine(label, format!("no frame within {:?}", engine.read_timeout)))
			}
		}
	}
}

impl Drop for RtspSource {
	fn drop(&mut self) {
		let connection = match self.connection.take() {
			Some(connection) => connection,
			None => return,
		};
		// Dropping the session spawns its TEARDOWN onto this runtime; drive it briefly.
		self.runtime.block_on(async move {
			drop(connection);
			tokio::time::sleep(TEARDOWN_GRACE).await;
		});
	}
}

fn to_transport(transport: RtspTransport) -> Transport {
	match transport {
		RtspTransport::Tcp => Transport::Tcp(TcpTransportOptions::default()),
		RtspTransport::Udp => Transport::Udp(UdpTransportOptions::default()),
	}
}

fn credentials_of(url: &Url) -> Option<Credentials> {
	if url.username().is_empty() {
		return None;
	}
	Some(Credentials {
		username: percent_decode(url.username()),
		password: percent_decode(url.password().unwrap_or("")),
	})
}

fn percent_decode(input: &str) -> String {
	let bytes = input.as_bytes();
	let mut decoded = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		if bytes[i] == b'%' && i + 2 < bytes.len() {
			let hex = &bytes[i + 1..i + 3];
			let byte = if hex.iter().all(u8::is_ascii_hexdigit) {
				std::str::from_utf8(hex).ok().and_then(|hex| u8::from_str_radix(hex, 16).ok())
			} else {
				None
			};
			if let Some(byte) = byte {
				decoded.push(byte);
				i += 3;
				continue;
			}
		}
		decoded.push(bytes[i]);
		i += 1;
	}
	String::from_utf8_lossy(&decoded).into_owned()
}

async fn connect(url: &Url, transport: RtspTransport) -> anyhow::Result<Connection> {
	let mut bare = url.clone();
	let creds = credentials_of(url);
	if bare.set_username("").is_err() || bare.set_password(None).is_err() {
		return Err(anyhow!("cannot strip credentials from RTSP URL"));
	}

	let options = retina::client::SessionOptions::default().creds(creds);
	let mut session = Session::describe(bare, options).await.context("RTSP DESCRIBE failed")?;

	let stream_index = session.streams()
		.iter()
		.position(|stream| stream.media() == "video")
		.ok_or_else(|| anyhow!("no video stream in RTSP presentation"))?;
	session.setup(stream_index, SetupOptions::default().transport(to_transport(transport)))
		.await
		.context("RTSP SETUP failed")?;

	let playing = session.play(PlayOptions::default()).await.context("RTSP PLAY failed")?;
	let demuxed = playing.demuxed().context("RTSP demux setup failed")?;
	Ok(Connection { demuxed, stream_index })
}

async fn next_video_frame(connection: &mut Connection) -> std::result::Result<Option<(Vec<u8>, bool)>, retina::Error> {
	while let Some(item) = connection.demuxed.next().await {
		if let CodecItem::VideoFrame(frame) = item? {
			if frame.stream_id() != connection.stream_index {
				continue;
			}
			let keyframe = frame.is_random_access_point();
			return Ok(Some((frame.into_data(), keyframe)));
		}
	}
	Ok(None)
}
