//! multipart/form-data bodies for the builders.
//!
//! Parts are collected as owned data and encoded in one pass by ureq's
//! multipart `Form`, which writes them in the order they were added with
//! CRLF line endings and a random boundary. The encoded stream is drained
//! into memory so the request stays plain data.

use std::io::{self, Read};

use ureq::unversioned::multipart::{Form, Part};

/// Content type of a file part whose own content type does not parse.
const FALLBACK_CONTENT_TYPE: &str = "application/octet-stream";

/// A finished multipart/form-data body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedForm {
    pub boundary: String,
    pub body: Vec<u8>,
}

impl EncodedForm {
    /// Value for the request's `Content-Type` header.
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Text {
        name: String,
        value: String,
    },
    File {
        field: String,
        filename: String,
        content_type: String,
        data: Vec<u8>,
    },
}

/// Text fields and file parts waiting to be encoded.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    entries: Vec<Entry>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&mut self, name: &str, value: &str) -> &mut Self {
        self.entries.push(Entry::Text {
            name: name.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Add a file part. A `content_type` that is not a valid MIME type is
    /// sent as `application/octet-stream`.
    pub fn file(&mut self, field: &str, filename: &str, content_type: &str, data: Vec<u8>) -> &mut Self {
        self.entries.push(Entry::File {
            field: field.to_string(),
            filename: filename.to_string(),
            content_type: content_type.to_string(),
            data,
        });
        self
    }

    pub fn part_count(&self) -> usize {
        self.entries.len()
    }

    /// Encode every part added so far.
    ///
    /// A form without parts encodes to the closing delimiter alone.
    pub fn encode(&self) -> io::Result<EncodedForm> {
        let mut form = Form::new();
        let boundary = form.boundary().to_string();

        if self.entries.is_empty() {
            let body = format!("--{boundary}--\r\n").into_bytes();
            return Ok(EncodedForm { boundary, body });
        }

        for entry in &self.entries {
            form = match entry {
                Entry::Text { name, value } => form.text(name, value),
                Entry::File {
                    field,
                    filename,
                    content_type,
                    data,
                } => form.part(field, file_part(data, filename, content_type)?),
            };
        }

        let mut body = Vec::new();
        form.read_to_end(&mut body)?;
        Ok(EncodedForm { boundary, body })
    }
}

fn file_part<'a>(data: &'a [u8], filename: &str, content_type: &str) -> io::Result<Part<'a>> {
    let part = || Part::bytes(data).file_name(filename);
    part()
        .mime_str(content_type)
        .or_else(|_| {
            tracing::warn!(%content_type, %filename, "invalid content type, sending as octet-stream");
            part().mime_str(FALLBACK_CONTENT_TYPE)
        })
        .map_err(io::Error::other)
}
