//! Upload fixtures shared by the integration tests.

#![allow(dead_code)]

use axum::body::Bytes;
use syncbridge::models::job::{JobKind, SourceFile};

/// Description of an upload and how the engine should treat it.
pub struct UploadFixture {
    pub filename: &'static str,
    pub media_type: &'static str,
    pub bytes: &'static [u8],
    pub kind: JobKind,
    pub accepted: bool,
    pub description: &'static str,
}

impl UploadFixture {
    pub fn source(&self) -> SourceFile {
        SourceFile::new(self.filename, self.media_type, Bytes::from_static(self.bytes))
    }
}

const PNG_HEADER: &[u8] = b"\x89PNG\r\n\x1a\n\x00\x00\x00\rIHDR\x00\x00\x00\x01\x00\x00\x00\x01";
const JPEG_HEADER: &[u8] = b"\xff\xd8\xff\xe0\x00\x10JFIF\x00\x01";
const WAV_HEADER: &[u8] = b"RIFF$\x00\x00\x00WAVEfmt \x10\x00\x00\x00";
const MP3_HEADER: &[u8] = b"ID3\x04\x00\x00\x00\x00\x00\x00";
const TEXT: &[u8] = b"plain notes";

pub static UPLOADS: &[UploadFixture] = &[
    UploadFixture {
        filename: "a.png",
        media_type: "image/png",
        bytes: PNG_HEADER,
        kind: JobKind::Image,
        accepted: true,
        description: "PNG screenshot",
    },
    UploadFixture {
        filename: "Business Meeting Notes.jpg",
        media_type: "image/jpeg",
        bytes: JPEG_HEADER,
        kind: JobKind::Image,
        accepted: true,
        description: "JPEG photo of a whiteboard",
    },
    UploadFixture {
        filename: "Interview Recording.mp3",
        media_type: "audio/mpeg",
        bytes: MP3_HEADER,
        kind: JobKind::Audio,
        accepted: true,
        description: "MP3 interview",
    },
    UploadFixture {
        filename: "memo.wav",
        media_type: "audio/wav",
        bytes: WAV_HEADER,
        kind: JobKind::Audio,
        accepted: true,
        description: "WAV voice memo",
    },
    UploadFixture {
        filename: "a.txt",
        media_type: "text/plain",
        bytes: TEXT,
        kind: JobKind::Audio,
        accepted: false,
        description: "Text file submitted as audio",
    },
    UploadFixture {
        filename: "voice.wav",
        media_type: "audio/wav",
        bytes: WAV_HEADER,
        kind: JobKind::Image,
        accepted: false,
        description: "Audio file submitted as image",
    },
];

pub fn png() -> &'static UploadFixture {
    &UPLOADS[0]
}

pub fn mp3() -> &'static UploadFixture {
    &UPLOADS[2]
}

pub fn text_as_audio() -> &'static UploadFixture {
    &UPLOADS[4]
}
