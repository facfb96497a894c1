use std::ops::Range;

use crate::common::CameraIndex;



/// Which cameras are on screen in grid view. Pages do not wrap around.
#[derive(Clone)]
#[derive(Debug)]
pub struct Paginator {
	page_size: usize,
	camera_count: usize,
	current_page: usize,
}

impl Paginator {
	/// A zero page size is treated as 1.
	pub fn new(page_size: usize, camera_count: usize) -> Paginator {
		let mut pages = Paginator {
			page_size: page_size.max(1),
			camera_count,
			current_page: 0,
		};
		pages.clamp();
		pages
	}

	pub fn page_size(&self) -> usize {
		self.page_size
	}

	pub fn camera_count(&self) -> usize {
		self.camera_count
	}

	pub fn current_page(&self) -> usize {
		self.current_page
	}

	/// Never less than 1, so an empty registry still has a page to show.
	pub fn total_pages(&self) -> usize {
		total_pages(self.camera_count, self.page_size)
	}

	pub fn has_next(&self) -> bool {
		self.current_page + 1 < self.total_pages()
	}

	pub fn has_prev(&self) -> bool {
		self.current_page > 0
	}

	/// Returns true if the page changed.
	pub fn next(&mut self) -> bool {
		if self.has_next() {
			self.current_page += 1;
			true
		} else {
			false
		}
	}

	pub fn prev(&mut self) -> bool {
		if self.has_prev() {
			self.current_page -= 1;
			true
		} else {
			false
		}
	}

	/// Records a new registry size and pulls the current page back into range.
	pub fn set_camera_count(&mut self, camera_count: usize) {
		self.camera_count = camera_count;
		self.clamp();
	}

	fn clamp(&mut self) {
		self.current_page = self.current_page.min(self.total_pages() - 1);
	}

	pub fn visible(&self) -> Range<CameraIndex> {
		let start = self.current_page.saturating_mul(self.page_size);
		let end = start.saturating_add(self.page_size).min(self.camera_count);
		start.min(end)..end
	}

	/// Grid cell of `index` on the current page.
	pub fn slot_of(&self, index: CameraIndex) -> Option<usize> {
		let visible = self.visible();
		if visible.contains(&index) {
			Some(index - visible.start)
		} else {
			None
		}
	}

	/// Camera shown in grid cell `slot`, if any.
	pub fn index_at(&self, slot: usize) -> Option<CameraIndex> {
		if slot >= self.page_size {
			return None;
		}
		let index = self.current_page.saturating_mul(self.page_size).saturating_add(slot);
		if index < self.camera_count {
			Some(index)
		} else {
			None
		}
	}
}

pub fn total_pages(camera_count: usize, page_size: usize) -> usize {
	let page_size = page_size.max(1);
	camera_count.div_ceil(page_size).max(1)
}

/// Next camera in single-camera view, wrapping to the first.
pub fn wrap_next(index: CameraIndex, camera_count: usize) -> CameraIndex {
	if camera_count == 0 {
		return index;
	}
	(index + 1) % camera_count
}

/// Previous camera in single-camera view, wrapping to the last.
pub fn wrap_prev(index: CameraIndex, camera_count: usize) -> CameraIndex {
	if camera_count == 0 {
		return index;
	}
	(index % camera_count + camera_count - 1) % camera_count
}
