//! Selected input files and media type classification

use serde::Serialize;

pub const PDF_MEDIA_TYPE: &str = "application/pdf";

/// Identity of a file in the selection list.
///
/// Two selections of the same bytes get different ids, so removal never
/// touches a duplicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FileId(pub u32);

/// A file as handed over by the picker, before it is given an id
#[derive(Debug, Clone)]
pub struct NewFile {
    pub name: String,
    pub media_type: String,
    pub bytes: Vec<u8>,
}

impl NewFile {
    pub fn new(name: impl Into<String>, media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            media_type: media_type.into(),
            bytes,
        }
    }
}

/// One user-chosen input. Never mutated after it enters the list.
#[derive(Debug, Clone)]
pub struct SelectedFile {
    id: FileId,
    name: String,
    media_type: String,
    bytes: Vec<u8>,
}

impl SelectedFile {
    pub(crate) fn new(id: FileId, file: NewFile) -> Self {
        Self {
            id,
            name: file.name,
            media_type: file.media_type,
            bytes: file.bytes,
        }
    }

    pub fn id(&self) -> FileId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn kind(&self) -> MediaKind {
        MediaKind::classify(&self.media_type)
    }
}

/// Raster formats the merged document can embed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImageKind {
    Png,
    Jpeg,
}

impl ImageKind {
    /// PNG stays PNG; every other image subtype is handled as JPEG.
    pub fn from_media_type(media_type: &str) -> Self {
        if media_type.eq_ignore_ascii_case("image/png") {
            ImageKind::Png
        } else {
            ImageKind::Jpeg
        }
    }

    pub fn media_type(self) -> &'static str {
        match self {
            ImageKind::Png => "image/png",
            ImageKind::Jpeg => "image/jpeg",
        }
    }
}

/// How the page source adapter treats a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaKind {
    Pdf,
    Image(ImageKind),
    Unsupported,
}

impl MediaKind {
    pub fn classify(media_type: &str) -> Self {
        if media_type == PDF_MEDIA_TYPE {
            MediaKind::Pdf
        } else if media_type.starts_with("image/") {
            MediaKind::Image(ImageKind::from_media_type(media_type))
        } else {
            MediaKind::Unsupported
        }
    }
}
