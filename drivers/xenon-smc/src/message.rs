// SPDX-License-Identifier: Apache-2.0
// Copyright 2025 KylinSoft Co., Ltd. <https://www.kylinos.cn/>
// See LICENSES for license details.

use core::fmt;

/// Size of every SMC message and reply.
pub const SMC_MESSAGE_LEN: usize = 16;

/// Command bit marking a message the controller never answers.
pub const NO_REPLY: u8 = 0x80;

/// One SMC message: a command byte followed by fifteen payload bytes.
#[derive(Clone, Copy, PartialEq, Eq, Default)]
pub struct SmcMessage([u8; SMC_MESSAGE_LEN]);

impl SmcMessage {
    /// Builds a message from its leading bytes; the rest is zero.
    pub const fn new(head: &[u8]) -> Self {
        let mut bytes = [0; SMC_MESSAGE_LEN];
        let mut i = 0;
        while i < head.len() && i < SMC_MESSAGE_LEN {
            bytes[i] = head[i];
            i += 1;
        }
        Self(bytes)
    }

    pub const fn from_bytes(bytes: [u8; SMC_MESSAGE_LEN]) -> Self {
        Self(bytes)
    }

    #[inline]
    pub const fn command(&self) -> u8 {
        self.0[0]
    }

    /// Whether the controller sends a reply to this command.
    #[inline]
    pub const fn expects_reply(&self) -> bool {
        self.command() & NO_REPLY == 0
    }

    pub fn as_bytes(&self) -> &[u8; SMC_MESSAGE_LEN] {
        &self.0
    }

    pub fn payload(&self) -> &[u8] {
        &self.0[1..]
    }

    pub fn payload_mut(&mut self) -> &mut [u8] {
        &mut self.0[1..]
    }

    /// The message as the four FIFO words, in bus byte order.
    pub fn words(&self) -> [u32; 4] {
        let mut words = [0; 4];
        for (word, chunk) in words.iter_mut().zip(self.0.chunks_exact(4)) {
            *word = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        }
        words
    }

    /// Inverse of [`SmcMessage::words`].
    pub fn from_words(words: [u32; 4]) -> Self {
        let mut bytes = [0; SMC_MESSAGE_LEN];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        Self(bytes)
    }
}

impl fmt::Debug for SmcMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SmcMessage[")?;
        for (i, b) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{b:02x}")?;
        }
        write!(f, "]")
    }
}
