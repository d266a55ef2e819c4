//! Test harness for directory-backed runs.
//!
//! The `TestHarness` owns a temp directory holding a record store, a media
//! directory and the cache database, and builds a `Config` pointing at them.

#![allow(dead_code)]

use std::path::{Path, PathBuf};

use lopdf::{dictionary, Document, Object, Stream};
use serde_json::Value;
use tempfile::TempDir;

use wordtally::config::Config;
use wordtally::{DocumentFormat, WordTally};

pub struct TestHarness {
    temp_dir: TempDir,
    pub records_dir: PathBuf,
    pub media_dir: PathBuf,
    pub cache_path: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let records_dir = base.join("records");
        let media_dir = base.join("media");
        std::fs::create_dir_all(&records_dir).expect("Failed to create records dir");
        std::fs::create_dir_all(&media_dir).expect("Failed to create media dir");

        Self {
            cache_path: base.join("cache").join("cache.db"),
            temp_dir,
            records_dir,
            media_dir,
        }
    }

    pub fn base(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn config(&self, format: DocumentFormat) -> Config {
        let mut config = Config::default();
        config.content.directory = Some(path_string(&self.records_dir));
        config.attachments.directory = Some(path_string(&self.media_dir));
        config.attachments.format = format;
        config.cache.path = Some(path_string(&self.cache_path));
        config
    }

    pub fn tally(&self, format: DocumentFormat) -> WordTally {
        WordTally::from_config(&self.config(format)).expect("Failed to build WordTally")
    }

    /// Writes `<records>/<id>.json`.
    pub fn write_record(&self, id: &str, record: Value) {
        std::fs::write(
            self.records_dir.join(format!("{}.json", id)),
            serde_json::to_string_pretty(&record).expect("Failed to serialize record"),
        )
        .expect("Failed to write record");
    }

    pub fn write_attachment(&self, relative: &str, content: &[u8]) -> PathBuf {
        let path = self.media_dir.join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("Failed to create media subdir");
        }
        std::fs::write(&path, content).expect("Failed to write attachment");
        path
    }

    pub fn write_manifest(&self, entries: Value) {
        std::fs::write(
            self.media_dir.join("attachments.json"),
            serde_json::to_string(&entries).expect("Failed to serialize manifest"),
        )
        .expect("Failed to write manifest");
    }
}

fn path_string(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Builds a PDF with one page per entry, each showing that line of text.
pub fn pdf_with_pages(pages: &[&str]) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.new_object_id();

    doc.objects.insert(
        font_id,
        Object::Dictionary(dictionary! {
            "Type" => "Font",
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        }),
    );

    let mut kids: Vec<Object> = Vec::new();
    for line in pages {
        let content_id = doc.add_object(Stream::new(
            dictionary! {},
            format!("BT /F1 12 Tf 50 700 Td ({}) Tj ET", line).into_bytes(),
        ));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            "Resources" => dictionary! { "Font" => dictionary! { "F1" => font_id } },
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );

    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes).expect("Failed to serialize PDF");
    bytes
}
