//! PDF Merge pipeline
//!
//! Concatenates the pages of every selected file, in selection order, into
//! one new document.

use crate::error::PdfMergeError;
use crate::file::SelectedFile;
use crate::options::NormalizeMode;
use crate::page_source::{load_pages, EmbeddedImage, ImportedDocument, SourcePages};
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use tracing::{debug, info, instrument};

/// Name of the image XObject inside an image page's resources
const IMAGE_RESOURCE: &[u8] = b"Im0";

/// Serialized output of one merge
#[derive(Debug, Clone)]
pub struct MergedBytes {
    pub bytes: Vec<u8>,
    pub page_count: u32,
}

/// Pages accumulated during one merge.
///
/// Owns a fresh document with an empty page tree; pages are appended in
/// call order and the tree is written out by [`MergedDocument::finish`].
pub struct MergedDocument {
    document: Document,
    pages_id: ObjectId,
    page_refs: Vec<ObjectId>,
}

impl Default for MergedDocument {
    fn default() -> Self {
        Self::new()
    }
}

impl MergedDocument {
    pub fn new() -> Self {
        let mut document = Document::with_version("1.7");
        let pages_id = document.new_object_id();

        let catalog_id = document.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        document.trailer.set("Root", Object::Reference(catalog_id));

        Self {
            document,
            pages_id,
            page_refs: Vec::new(),
        }
    }

    pub fn page_count(&self) -> usize {
        self.page_refs.len()
    }

    pub fn append(&mut self, pages: SourcePages) -> Result<(), PdfMergeError> {
        match pages {
            SourcePages::Document(imported) => self.append_document(imported),
            SourcePages::Image(image) => self.append_image(image)?,
            SourcePages::Empty => {}
        }
        Ok(())
    }

    /// Copy every page of a source document.
    ///
    /// All source objects are imported with their ids shifted past ours, then
    /// the pages are re-parented onto our page tree. Source objects nothing
    /// refers to any more (its catalog, its page tree) are pruned on save.
    pub fn append_document(&mut self, source: ImportedDocument) {
        let ImportedDocument { document, pages } = source;
        let id_offset = self.document.max_id;

        for (old_id, object) in document.objects.into_iter() {
            let new_id = (old_id.0 + id_offset, old_id.1);
            self.document
                .objects
                .insert(new_id, remap_object_refs(object, id_offset));
        }
        self.document.max_id = self.document.max_id.max(document.max_id + id_offset);

        for old_page_ref in pages {
            let new_page_ref = (old_page_ref.0 + id_offset, old_page_ref.1);
            if let Some(Object::Dictionary(page)) = self.document.objects.get_mut(&new_page_ref) {
                page.set("Parent", Object::Reference(self.pages_id));
            }
            self.page_refs.push(new_page_ref);
        }
    }

    /// Add one page exactly the size of the image, fully covered by it.
    pub fn append_image(&mut self, image: EmbeddedImage) -> Result<(), PdfMergeError> {
        let EmbeddedImage {
            width,
            height,
            image: mut stream,
            soft_mask,
        } = image;

        if let Some(mask) = soft_mask {
            let mask_id = self.document.add_object(mask);
            stream.dict.set("SMask", Object::Reference(mask_id));
        }
        let image_id = self.document.add_object(stream);

        let (w, h) = (width as i64, height as i64);
        let content = Content {
            operations: vec![
                Operation::new("q", vec![]),
                Operation::new(
                    "cm",
                    vec![
                        Object::Integer(w),
                        Object::Integer(0),
                        Object::Integer(0),
                        Object::Integer(h),
                        Object::Integer(0),
                        Object::Integer(0),
                    ],
                ),
                Operation::new("Do", vec![Object::Name(IMAGE_RESOURCE.to_vec())]),
                Operation::new("Q", vec![]),
            ],
        };
        let encoded = content
            .encode()
            .map_err(|e| PdfMergeError::SaveError(format!("page content: {}", e)))?;
        let content_id = self
            .document
            .add_object(Stream::new(Dictionary::new(), encoded));

        let resources = Dictionary::from_iter(vec![(
            "XObject",
            Object::Dictionary(Dictionary::from_iter(vec![(
                IMAGE_RESOURCE,
                Object::Reference(image_id),
            )])),
        )]);

        let page_id = self.document.add_object(Dictionary::from_iter(vec![
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(self.pages_id)),
            (
                "MediaBox",
                Object::Array(vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(w),
                    Object::Integer(h),
                ]),
            ),
            ("Resources", Object::Dictionary(resources)),
            ("Contents", Object::Reference(content_id)),
        ]));
        self.page_refs.push(page_id);
        Ok(())
    }

    /// Write the page tree, drop unreachable objects and serialize.
    pub fn finish(mut self) -> Result<MergedBytes, PdfMergeError> {
        let page_count = self.page_refs.len() as u32;
        let kids = self
            .page_refs
            .iter()
            .map(|&id| Object::Reference(id))
            .collect::<Vec<_>>();

        self.document.objects.insert(
            self.pages_id,
            Object::Dictionary(Dictionary::from_iter(vec![
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(kids)),
                ("Count", Object::Integer(page_count as i64)),
            ])),
        );

        let producer = format!("pdfmerge {}", env!("CARGO_PKG_VERSION"));
        let info_id = self.document.add_object(Dictionary::from_iter(vec![(
            "Producer",
            Object::string_literal(producer),
        )]));
        self.document.trailer.set("Info", Object::Reference(info_id));

        self.document.prune_objects();
        self.document.compress();

        let mut buffer = Vec::new();
        self.document
            .save_to(&mut buffer)
            .map_err(|e| PdfMergeError::SaveError(e.to_string()))?;

        Ok(MergedBytes {
            bytes: buffer,
            page_count,
        })
    }
}

/// Merge `files` in order into one PDF.
pub fn merge_files(
    files: &[SelectedFile],
    mode: NormalizeMode,
) -> Result<MergedBytes, PdfMergeError> {
    merge_files_with_progress(files, mode, |_, _, _| {})
}

/// Merge `files` in order, calling `on_progress(done, total, message)`
/// after each file.
///
/// Files are handled strictly one after another; the first failure aborts
/// the merge and nothing is returned.
#[instrument(skip_all, fields(files = files.len(), ?mode))]
pub fn merge_files_with_progress<F>(
    files: &[SelectedFile],
    mode: NormalizeMode,
    mut on_progress: F,
) -> Result<MergedBytes, PdfMergeError>
where
    F: FnMut(usize, usize, &str),
{
    if files.is_empty() {
        return Err(PdfMergeError::EmptySelection);
    }

    let total = files.len();
    let mut merged = MergedDocument::new();

    for (index, file) in files.iter().enumerate() {
        let pages = load_pages(file, mode)?;
        debug!(
            name = file.name(),
            media_type = file.media_type(),
            pages = pages.page_count(),
            "appending file"
        );
        merged.append(pages)?;
        on_progress(index + 1, total, file.name());
    }

    let output = merged.finish()?;
    info!(
        pages = output.page_count,
        bytes = output.bytes.len(),
        "merge complete"
    );
    Ok(output)
}

/// Recursively remap object references in an object
fn remap_object_refs(obj: Object, offset: u32) -> Object {
    match obj {
        Object::Reference(id) => Object::Reference((id.0 + offset, id.1)),
        Object::Array(arr) => Object::Array(
            arr.into_iter()
                .map(|o| remap_object_refs(o, offset))
                .collect(),
        ),
        Object::Dictionary(mut dict) => {
            for (_, value) in dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Dictionary(dict)
        }
        Object::Stream(mut stream) => {
            for (_, value) in stream.dict.iter_mut() {
                *value = remap_object_refs(value.clone(), offset);
            }
            Object::Stream(stream)
        }
        other => other,
    }
}
