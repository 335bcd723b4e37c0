//! Upload sources
//!
//! A decoded upload is anything that can report the name the client claimed
//! and hand over its content as a byte stream.

use std::io::{self, Cursor, Read};

pub trait Upload {
    type Stream: Read;

    /// Name as sent by the client, unsanitized
    fn name(&self) -> &str;

    /// Consume the upload and open its content
    fn open_stream(self) -> io::Result<Self::Stream>;
}

/// Upload whose content is already held in memory
#[derive(Debug, Clone)]
pub struct BufferedUpload<T = Vec<u8>> {
    name: String,
    data: T,
}

impl<T: AsRef<[u8]>> BufferedUpload<T> {
    pub fn new(name: impl Into<String>, data: T) -> Self {
        Self {
            name: name.into(),
            data,
        }
    }
}

impl<T: AsRef<[u8]>> Upload for BufferedUpload<T> {
    type Stream = Cursor<T>;

    fn name(&self) -> &str {
        &self.name
    }

    fn open_stream(self) -> io::Result<Self::Stream> {
        Ok(Cursor::new(self.data))
    }
}
