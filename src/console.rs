//! Line-based input for the viewer. Each stdin line is one user event.
//! Cameras are numbered from 1 here, as they are on screen.

use anyhow::{anyhow, bail};

use crate::common::CameraIndex;
use crate::focus::EscapeAction;
use crate::pool::StartOutcome;
use crate::registry::RegistryEdit;
use crate::viewer::{FrameView, Viewer};



pub const HELP: &str = "\
next | prev            change page
full <n> | grid        enlarge camera n / back to the grid
fnext | fprev          next/previous camera while enlarged
true | esc             toggle true fullscreen / escape
audio <n>              give camera n the sound (again to mute)
reload <n>             restart camera n
status                 dump viewer state as JSON
edit                   start editing the camera list
  add <url> | set <n> <url> | rm <n> | list
  save | cancel        apply and write the list / discard edits
quit";

#[derive(Clone)]
#[derive(Debug)]
#[derive(PartialEq, Eq)]
pub enum ConsoleCommand {
	NextPage,
	PrevPage,
	Fullscreen(CameraIndex),
	Grid,
	FullscreenNext,
	FullscreenPrev,
	TrueFullscreen,
	Escape,
	Audio(CameraIndex),
	Reload(CameraIndex),
	Status,
	BeginEdit,
	Add(String),
	Set(usize, String),
	Remove(usize),
	List,
	Save,
	Cancel,
	Help,
	Quit,
}

fn parse_position(word: Option<&str>) -> anyhow::Result<usize> {
	let word = word.ok_or_else(|| anyhow!("missing camera number"))?;
	match word.parse::<usize>() {
		Ok(n) if n >= 1 => Ok(n - 1),
		_ => Err(anyhow!("bad camera number {:?}", word)),
	}
}

fn rest_of(line: &str, words: usize) -> anyhow::Result<String> {
	let rest = line.split_whitespace().skip(words).collect::<Vec<_>>().join(" ");
	if rest.is_empty() {
		bail!("missing URL");
	}
	Ok(rest)
}

pub fn parse_command(line: &str) -> anyhow::Result<ConsoleCommand> {
	let mut words = line.split_whitespace();
	let command = match words.next() {
		Some(word) => word.to_ascii_lowercase(),
		None => bail!("empty command"),
	};

	let parsed = match command.as_str() {
		"next" | "n" => ConsoleCommand::NextPage,
		"prev" | "p" => ConsoleCommand::PrevPage,
		"full" | "f" => ConsoleCommand::Fullscreen(parse_position(words.next())?),
		"grid" | "g" => ConsoleCommand::Grid,
		"fnext" => ConsoleCommand::FullscreenNext,
		"fprev" => ConsoleCommand::FullscreenPrev,
		"true" => ConsoleCommand::TrueFullscreen,
		"esc" => ConsoleCommand::Escape,
		"audio" | "a" => ConsoleCommand::Audio(parse_position(words.next())?),
		"reload" | "r" => ConsoleCommand::Reload(parse_position(words.next())?),
		"status" => ConsoleCommand::Status,
		"edit" => ConsoleCommand::BeginEdit,
		"add" => ConsoleCommand::Add(rest_of(line, 1)?),
		"set" => {
			let position = parse_position(words.next())?;
			ConsoleCommand::Set(position, rest_of(line, 2)?)
		},
		"rm" => ConsoleCommand::Remove(parse_position(words.next())?),
		"list" | "ls" => ConsoleCommand::List,
		"save" => ConsoleCommand::Save,
		"cancel" => ConsoleCommand::Cancel,
		"help" | "?" => ConsoleCommand::Help,
		"quit" | "q" | "exit" => ConsoleCommand::Quit,
		other => bail!("unknown command {:?}; try help", other),
	};
	Ok(parsed)
}



#[derive(Debug)]
#[derive(PartialEq, Eq)]
pub enum Outcome {
	Reply(String),
	Quit,
}

/// Holds the camera-list edit in progress, if any.
#[derive(Default)]
pub struct Console {
	edit: Option<RegistryEdit>,
}

impl Console {
	pub fn new() -> Console {
		Console::default()
	}

	pub fn is_editing(&self) -> bool {
		self.edit.is_some()
	}

	fn edit_mut(&mut self) -> anyhow::Result<&mut RegistryEdit> {
		self.edit.as_mut().ok_or_else(|| anyhow!("not editing; start with edit"))
	}

	fn list(&self, viewer: &Viewer) -> String {
		let urls = match &self.edit {
			Some(edit) => edit.urls().to_vec(),
			None => viewer.registry().urls(),
		};
		if urls.is_empty() {
			return "no cameras".to_string();
		}
		urls.iter()
			.enumerate()
			.map(|(index, url)| format!("{:>3}  {}", index + 1, url))
			.collect::<Vec<_>>()
			.join("\n")
	}

	pub async fn handle(&mut self, viewer: &mut Viewer, command: ConsoleCommand) -> anyhow::Result<Outcome> {
		let reply = match command {
			ConsoleCommand::NextPage => {
				viewer.next_page();
				page_label(viewer)
			},
			ConsoleCommand::PrevPage => {
				viewer.prev_page();
				page_label(viewer)
			},
			ConsoleCommand::Fullscreen(index) => {
				viewer.enter_fullscreen(index)?;
				format!("showing {}", camera_label(viewer, index))
			},
			ConsoleCommand::Grid => {
				viewer.exit_fullscreen();
				page_label(viewer)
			},
			ConsoleCommand::FullscreenNext => match viewer.fullscreen_next() {
				Some(index) => format!("showing {}", camera_label(viewer, index)),
				None => "nothing to switch to".to_string(),
			},
			ConsoleCommand::FullscreenPrev => match viewer.fullscreen_prev() {
				Some(index) => format!("showing {}", camera_label(viewer, index)),
				None => "nothing to switch to".to_string(),
			},
			ConsoleCommand::TrueFullscreen => {
				if viewer.toggle_true_fullscreen() {
					format!("true fullscreen {}", if viewer.focus().is_true_fullscreen() { "on" } else { "off" })
				} else {
					"enlarge a camera first".to_string()
				}
			},
			ConsoleCommand::Escape => match viewer.escape() {
				EscapeAction::LeftTrueFullscreen => "true fullscreen off".to_string(),
				EscapeAction::LeftFullscreen(_) => page_label(viewer),
				EscapeAction::Nothing => String::new(),
			},
			ConsoleCommand::Audio(index) => {
				if viewer.toggle_audio(index) {
					format!("audio from {}", camera_label(viewer, index))
				} else {
					match viewer.focus().audio_source() {
						Some(holder) => format!("{} has no signal; audio stays with {}", camera_label(viewer, index), camera_label(viewer, holder)),
						None if !viewer.pool().is_live(index) => format!("{} has no signal", camera_label(viewer, index)),
						None => "audio muted".to_string(),
					}
				}
			},
			ConsoleCommand::Reload(index) => match viewer.reload(index)? {
				StartOutcome::Failed => format!("{}: no signal", camera_label(viewer, index)),
				_ => format!("reloaded {}", camera_label(viewer, index)),
			},
			ConsoleCommand::Status => serde_json::to_string_pretty(&viewer.status())?,
			ConsoleCommand::BeginEdit => {
				self.edit = Some(viewer.begin_edit());
				self.list(viewer)
			},
			ConsoleCommand::Add(url) => {
				if !self.edit_mut()?.add(&url) {
					bail!("empty URL");
				}
				self.list(viewer)
			},
			ConsoleCommand::Set(position, url) => {
				if !self.edit_mut()?.edit(position, &url) {
					bail!("no camera {} to change", position + 1);
				}
				self.list(viewer)
			},
			ConsoleCommand::Remove(position) => {
				if self.edit_mut()?.remove(position).is_none() {
					bail!("no camera {} to remove", position + 1);
				}
				self.list(viewer)
			},
			ConsoleCommand::List => self.list(viewer),
			ConsoleCommand::Save => {
				let edit = self.edit.take().ok_or_else(|| anyhow!("not editing; start with edit"))?;
				match viewer.commit_edit(edit).await {
					Ok(_) => format!("saved {} cameras; {}", viewer.registry().len(), page_label(viewer)),
					// The new list stays in use for this run.
					Err(err) => format!("cameras applied but not saved: {}", err),
				}
			},
			ConsoleCommand::Cancel => {
				self.edit = None;
				"edits discarded".to_string()
			},
			ConsoleCommand::Help => HELP.to_string(),
			ConsoleCommand::Quit => return Ok(Outcome::Quit),
		};
		Ok(Outcome::Reply(reply))
	}
}

fn camera_label(viewer: &Viewer, index: CameraIndex) -> String {
	match viewer.registry().get(index) {
		Some(camera) => format!("{} ({})", index + 1, camera.name),
		None => format!("{}", index + 1),
	}
}

pub fn page_label(viewer: &Viewer) -> String {
	format!("page {} of {}", viewer.pages().current_page() + 1, viewer.pages().total_pages())
}

/// Short per-tile summary line, e.g. `1:lobby[ok] 2:door[--] 3:-`.
pub fn describe_tiles(viewer: &Viewer) -> String {
	viewer.visible_tiles()
		.iter()
		.map(|tile| {
			let state = match &tile.view {
				FrameView::Frame(_) | FrameView::Rendering => "ok",
				FrameView::NoSignal => "--",
				FrameView::Empty => return "-".to_string(),
			};
			let number = tile.index.map_or(0, |index| index + 1);
			let name = tile.name.as_deref().unwrap_or("");
			let audio = if tile.audio { "*" } else { "" };
			format!("{}:{}[{}]{}", number, name, state, audio)
		})
		.collect::<Vec<_>>()
		.join(" ")
}
