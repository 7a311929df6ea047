// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 itsakeyfut
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Debug viewer text channel
//!
//! Development cartridges expose a 4 KiB buffer at 0x13FF0000. Software
//! writes text at offset 0x20 and then stores its length at offset 0x14,
//! which flushes the text to the log.

use crate::core::memory::layout::IS_VIEWER_SIZE;
use crate::core::memory::{read_be_word, write_be_word, MemoryHandler};

const IS_VIEWER_LENGTH: usize = 0x14;
const IS_VIEWER_TEXT: usize = 0x20;

/// Debug viewer
pub struct IsViewer {
    buffer: Box<[u8]>,

    /// Text not yet terminated by a newline
    pending: String,
}

impl IsViewer {
    pub fn new() -> Self {
        Self {
            buffer: vec![0u8; IS_VIEWER_SIZE].into_boxed_slice(),
            pending: String::new(),
        }
    }

    pub fn poweron(&mut self) {
        self.buffer.fill(0);
        self.pending.clear();
    }

    /// Text flushed so far without a terminating newline
    pub fn pending(&self) -> &str {
        &self.pending
    }

    fn flush(&mut self, length: usize) {
        let end = (IS_VIEWER_TEXT + length).min(IS_VIEWER_SIZE);
        let text = String::from_utf8_lossy(&self.buffer[IS_VIEWER_TEXT..end]).into_owned();
        self.pending.push_str(&text);

        while let Some(newline) = self.pending.find('\n') {
            let line: String = self.pending.drain(..=newline).collect();
            log::info!("IS-Viewer: {}", line.trim_end());
        }
    }
}

impl Default for IsViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHandler for IsViewer {
    fn read_word(&mut self, address: u32) -> u32 {
        read_be_word(&self.buffer, (address as usize) & (IS_VIEWER_SIZE - 4)).unwrap_or(0)
    }

    fn write_word(&mut self, address: u32, value: u32, mask: u32) {
        let offset = (address as usize) & (IS_VIEWER_SIZE - 4);
        if offset == IS_VIEWER_LENGTH {
            self.flush((value & mask) as usize);
            return;
        }
        write_be_word(&mut self.buffer, offset, value, mask);
    }

    fn name(&self) -> &str {
        "IS-Viewer"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: u32 = 0x13FF_0000;

    fn write_text(viewer: &mut IsViewer, text: &[u8]) {
        for (i, chunk) in text.chunks(4).enumerate() {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            viewer.write_word(
                BASE + IS_VIEWER_TEXT as u32 + (i as u32) * 4,
                u32::from_be_bytes(word),
                0xFFFF_FFFF,
            );
        }
        viewer.write_word(BASE + IS_VIEWER_LENGTH as u32, text.len() as u32, 0xFFFF_FFFF);
    }

    #[test]
    fn test_buffer_read_back() {
        let mut viewer = IsViewer::new();
        viewer.write_word(BASE + 0x20, 0x4142_4344, 0xFFFF_FFFF);
        assert_eq!(viewer.read_word(BASE + 0x20), 0x4142_4344);
    }

    #[test]
    fn test_partial_line_is_kept() {
        let mut viewer = IsViewer::new();

        write_text(&mut viewer, b"boot");
        assert_eq!(viewer.pending(), "boot");

        write_text(&mut viewer, b" ok\nnext");
        assert_eq!(viewer.pending(), "next");
    }

    #[test]
    fn test_length_clipped_to_buffer() {
        let mut viewer = IsViewer::new();
        viewer.write_word(BASE + IS_VIEWER_LENGTH as u32, 0xFFFF, 0xFFFF_FFFF);
        assert_eq!(viewer.pending().len(), IS_VIEWER_SIZE - IS_VIEWER_TEXT);
    }
}
