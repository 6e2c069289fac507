//! Data Source response reassembly.
//!
//! The peer splits long responses across as many notifications as the
//! ATT MTU requires, with no fragment header.  Fragments are concatenated
//! into a fixed buffer and the codec decides when the message is whole.
//!
//! ```text
//!  start(frag 1) ──▶ poll() = None
//!  append(frag 2) ─▶ poll() = None
//!  append(frag N) ─▶ poll() = Some(response) ──▶ owner clears
//! ```

use heapless::Vec;

use crate::error::{CodecError, ReassemblyError};
use crate::protocol::CommandId;
use crate::protocol::parsers::{Response, parse_response};

/// Largest Data Source response accepted.
pub const MAX_RESPONSE_LEN: usize = 1024;

/// Accumulates the fragments of a single Data Source response.
pub struct Reassembly {
    command: Option<CommandId>,
    buffer: Vec<u8, MAX_RESPONSE_LEN>,
}

impl Default for Reassembly {
    fn default() -> Self {
        Self::new()
    }
}

impl Reassembly {
    pub const fn new() -> Self {
        Self {
            command: None,
            buffer: Vec::new(),
        }
    }

    pub fn is_active(&self) -> bool {
        self.command.is_some()
    }

    /// Command id recorded by [`start`](Self::start).
    pub fn command(&self) -> Option<CommandId> {
        self.command
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    /// Begin a new response with its first fragment.
    ///
    /// The first byte must be a command the peer answers on the Data Source,
    /// so stray bytes are never mistaken for the start of a message.
    pub fn start(&mut self, fragment: &[u8]) -> Result<(), ReassemblyError> {
        if self.is_active() {
            return Err(ReassemblyError::AlreadyActive);
        }
        let &first = fragment.first().ok_or(ReassemblyError::Empty)?;
        let command = CommandId::from_u8(first)
            .filter(|c| c.has_response())
            .ok_or(ReassemblyError::UnknownCommand(first))?;

        self.buffer
            .extend_from_slice(fragment)
            .map_err(|()| ReassemblyError::Overflow)?;
        self.command = Some(command);
        Ok(())
    }

    /// Add a continuation fragment.  On overflow the buffer is left as it
    /// was; nothing is written past its end.
    pub fn append(&mut self, fragment: &[u8]) -> Result<(), ReassemblyError> {
        if !self.is_active() {
            return Err(ReassemblyError::NotActive);
        }
        self.buffer
            .extend_from_slice(fragment)
            .map_err(|()| ReassemblyError::Overflow)
    }

    /// Test the current contents for completeness.
    ///
    /// `Ok(Some(_))` once the whole response is present, `Ok(None)` while
    /// more fragments are needed, `Err` if the contents can never form a
    /// valid response.
    pub fn poll(&self) -> Result<Option<Response<'_>>, CodecError> {
        Ok(parse_response(&self.buffer)?.filter(Response::is_complete))
    }

    /// Move the reassembled bytes out and reset.
    pub fn take(&mut self) -> Vec<u8, MAX_RESPONSE_LEN> {
        self.command = None;
        core::mem::take(&mut self.buffer)
    }

    pub fn clear(&mut self) {
        self.command = None;
        self.buffer.clear();
    }
}
