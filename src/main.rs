use std::io::BufRead;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use clap::{Arg, Command};
use tokio::sync::mpsc;
use tokio::time::MissedTickBehavior;

use log::{error, info};

use clustervms_camera_viewer::console::{self, Console, Outcome};
use clustervms_camera_viewer::registry::CameraRegistry;
use clustervms_camera_viewer::rtsp::RtspEngine;
use clustervms_camera_viewer::session::PullSessionFactory;
use clustervms_camera_viewer::settings::ViewerSettings;
use clustervms_camera_viewer::viewer::Viewer;



// The whole UI runs on one thread; only the per-camera readers run elsewhere.
#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
	env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

	let matches = Command::new("clustervms-camera-viewer")
		.version("0.0.4")
		.author("Alicrow")
		.about("Multi-camera RTSP viewer for ClusterVMS.")
		.arg(
			Arg::new("cameras")
				.short('c')
				.long("cameras")
				.help("File with one camera URL per line")
		)
		.arg(
			Arg::new("settings")
				.short('s')
				.long("settings")
				.help("JSON file with viewer settings")
		)
		.arg(
			Arg::new("page-size")
				.short('p')
				.long("page-size")
				.value_parser(clap::value_parser!(usize))
				.help("Cameras per page")
		)
		.get_matches();

	let mut settings = match matches.get_one::<String>("settings") {
		Some(path) => ViewerSettings::load(Path::new(path))?,
		None => {
			// Use defaults
			ViewerSettings::default()
		}
	};
	if let Some(cameras) = matches.get_one::<String>("cameras") {
		settings.cameras_file = PathBuf::from(cameras);
	}
	if let Some(page_size) = matches.get_one::<usize>("page-size") {
		settings.page_size = *page_size;
	}
	settings.validate()?;

	let registry = CameraRegistry::load(&settings.cameras_file);
	let engine = Arc::new(RtspEngine::from_settings(&settings));
	let factory = PullSessionFactory::new(engine, settings.pull_timing());
	let mut viewer = Viewer::new(registry, Box::new(factory), settings);
	viewer.open();

	run(&mut viewer).await;
	viewer.close();

	anyhow::Ok(())
}

// Stdin is read on its own thread so a pending read never holds up shutdown.
fn spawn_input_reader() -> mpsc::UnboundedReceiver<std::io::Result<String>> {
	let (tx, rx) = mpsc::unbounded_channel();
	thread::spawn(move || {
		for line in std::io::stdin().lock().lines() {
			if tx.send(line).is_err() {
				break;
			}
		}
	});
	rx
}

async fn run(viewer: &mut Viewer) {
	let mut console = Console::new();
	let mut lines = spawn_input_reader();
	let mut stdin_open = true;

	let mut ticker = tokio::time::interval(viewer.settings().poll_interval());
	ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
	let mut last_tiles = String::new();

	let ctrl_c = tokio::signal::ctrl_c();
	tokio::pin!(ctrl_c);

	println!("{}", console::page_label(viewer));

	loop {
		tokio::select! {
			_ = ticker.tick() => {
				let tiles = console::describe_tiles(viewer);
				if tiles != last_tiles {
					info!("{}", tiles);
					last_tiles = tiles;
				}
			},
			line = lines.recv(), if stdin_open => {
				let line = match line {
					Some(Ok(line)) => line,
					None => {
						info!("Input closed; press Ctrl-C to quit");
						stdin_open = false;
						continue;
					},
					Some(Err(err)) => {
						error!("Failed to read input; error was {}", err);
						stdin_open = false;
						continue;
					}
				};
				if line.trim().is_empty() {
					continue;
				}

				let command = match console::parse_command(&line) {
					Ok(command) => command,
					Err(err) => {
						println!("{}", err);
						continue;
					}
				};
				match console.handle(viewer, command).await {
					Ok(Outcome::Reply(reply)) => {
						if !reply.is_empty() {
							println!("{}", reply);
						}
					},
					Ok(Outcome::Quit) => break,
					Err(err) => println!("{}", err),
				}
			},
			_ = &mut ctrl_c => {
				info!("Interrupted");
				break;
			}
		}
	}
}
