#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::Range;
use std::path::Path;

use image::{DynamicImage, GrayImage, Luma};
use lopdf::{dictionary, Document, Object, Stream};
use nomor_rename::{OcrEngine, OcrError, RasterError, Rasterizer};

/// Build a PDF with `pages` empty pages. Page `i` gets MediaBox width `600 + i`
/// so tests can tell pages apart after copying.
pub fn make_pdf(pages: usize) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let mut kids: Vec<Object> = Vec::new();
    for i in 0..pages {
        let content_id = doc.add_object(Stream::new(dictionary! {}, format!("% page {}\n", i).into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "MediaBox" => vec![0.into(), 0.into(), (600 + i as i64).into(), 800.into()],
            "Contents" => content_id,
        });
        kids.push(page_id.into());
    }
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => pages as i64,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let mut out = Vec::new();
    doc.save_to(&mut out).unwrap();
    out
}

/// MediaBox widths of every page, in page order.
pub fn page_widths(path: &Path) -> Vec<i64> {
    let doc = Document::load(path).unwrap();
    doc.get_pages()
        .values()
        .map(|id| {
            let page = doc.get_object(*id).unwrap().as_dict().unwrap();
            let mb = page.get(b"MediaBox").unwrap().as_array().unwrap();
            mb[2].as_i64().unwrap()
        })
        .collect()
}

/// A blank page whose every pixel carries `tag`, surviving any crop.
pub fn tagged_page(tag: u8) -> DynamicImage {
    DynamicImage::ImageLuma8(GrayImage::from_pixel(60, 80, Luma([tag])))
}

/// Rasterizer that answers from a table: file name -> tag per page.
/// Unknown files fail like a corrupt PDF would.
#[derive(Default)]
pub struct ScriptedRasterizer {
    pages: HashMap<String, Vec<u8>>,
    pub calls: RefCell<Vec<(String, usize)>>,
}

impl ScriptedRasterizer {
    pub fn with(mut self, file: &str, tags: &[u8]) -> Self {
        self.pages.insert(file.to_string(), tags.to_vec());
        self
    }
}

impl Rasterizer for ScriptedRasterizer {
    fn render(&self, pdf: &Path, pages: Range<usize>, _dpi: u32) -> Result<Vec<DynamicImage>, RasterError> {
        let name = pdf.file_name().unwrap().to_string_lossy().into_owned();
        let tags = self
            .pages
            .get(&name)
            .ok_or_else(|| RasterError::Render(format!("cannot render {}", name)))?;
        pages
            .map(|p| {
                self.calls.borrow_mut().push((name.clone(), p));
                tags.get(p).map(|t| tagged_page(*t)).ok_or(RasterError::MissingImage(p))
            })
            .collect()
    }
}

/// OCR engine that maps a page tag to text; unknown tags fail.
#[derive(Default)]
pub struct ScriptedOcr {
    texts: HashMap<u8, String>,
    pub langs: RefCell<Vec<String>>,
}

impl ScriptedOcr {
    pub fn with(mut self, tag: u8, text: &str) -> Self {
        self.texts.insert(tag, text.to_string());
        self
    }
}

impl OcrEngine for ScriptedOcr {
    fn recognize(&self, image: &DynamicImage, lang: &str) -> Result<String, OcrError> {
        self.langs.borrow_mut().push(lang.to_string());
        let tag = image.to_luma8().get_pixel(0, 0)[0];
        self.texts
            .get(&tag)
            .cloned()
            .ok_or_else(|| OcrError::Failed(1, format!("no text for tag {}", tag)))
    }
}
