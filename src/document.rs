use std::io::Write;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;

use crate::capture::{CapturedImage, ViewSet};
use crate::error::{CustomizerError, Result};

/// ISO A4 portrait, in millimetres.
pub const A4_WIDTH_MM: f32 = 210.0;
pub const A4_HEIGHT_MM: f32 = 297.0;

const POINTS_PER_MM: f32 = 72.0 / 25.4;
const JPEG_QUALITY: u8 = 90;

/// An image drawn at a rectangle given from the page's top-left corner, in
/// millimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct PlacedImage {
    pub image: CapturedImage,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    pub width_mm: f32,
    pub height_mm: f32,
    pub images: Vec<PlacedImage>,
}

impl Page {
    fn a4() -> Self {
        Self {
            width_mm: A4_WIDTH_MM,
            height_mm: A4_HEIGHT_MM,
            images: Vec::new(),
        }
    }

    /// True when nothing visible will be drawn on the page.
    pub fn is_blank(&self) -> bool {
        self.images.iter().all(|placed| placed.image.is_empty())
    }
}

/// A document always has at least one page; drawing goes to the last one.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pages: Vec<Page>,
}

impl Document {
    pub fn new() -> Self {
        Self {
            pages: vec![Page::a4()],
        }
    }

    pub fn add_page(&mut self) {
        self.pages.push(Page::a4());
    }

    /// Places `image` on the current page. Empty images are kept and simply
    /// draw nothing.
    pub fn add_image(&mut self, image: &CapturedImage, x: f32, y: f32, width: f32, height: f32) {
        if let Some(page) = self.pages.last_mut() {
            page.images.push(PlacedImage {
                image: image.clone(),
                x,
                y,
                width,
                height,
            });
        }
    }

    pub fn pages(&self) -> &[Page] {
        &self.pages
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn to_pdf_bytes(&self) -> Result<Vec<u8>> {
        let mut pdf = PdfWriter::default();
        let catalog = pdf.reserve();
        let pages_tree = pdf.reserve();

        let mut kids = Vec::with_capacity(self.pages.len());
        for page in &self.pages {
            kids.push(write_page(&mut pdf, page, pages_tree)?);
        }

        let kids = kids
            .iter()
            .map(|id| format!("{} 0 R", id))
            .collect::<Vec<_>>()
            .join(" ");
        pdf.set(
            pages_tree,
            format!(
                "<< /Type /Pages /Kids [{}] /Count {} >>",
                kids,
                self.pages.len()
            )
            .into_bytes(),
        );
        pdf.set(
            catalog,
            format!("<< /Type /Catalog /Pages {} 0 R >>", pages_tree).into_bytes(),
        );

        pdf.finish(catalog)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let bytes = self.to_pdf_bytes()?;
        std::fs::write(path.as_ref(), bytes)?;
        log::info!("Saved document to {}", path.as_ref().display());
        Ok(())
    }
}

impl Default for Document {
    fn default() -> Self {
        Self::new()
    }
}

/// One full-bleed page per view, in capture order. A separator page is added
/// before every view except the first, so six views give exactly six pages.
pub fn compose(views: &ViewSet) -> Document {
    let mut document = Document::new();

    for (index, (_, image)) in views.iter().enumerate() {
        if index > 0 {
            document.add_page();
        }
        document.add_image(image, 0.0, 0.0, A4_WIDTH_MM, A4_HEIGHT_MM);
    }

    document
}

/// Composes `views` and writes the document to `dir/document_name`.
///
/// An incomplete view set means capture never ran on an attached surface, so
/// nothing is written.
pub fn export(views: &ViewSet, dir: impl AsRef<Path>, document_name: &str) -> Result<PathBuf> {
    if !views.is_complete() {
        log::warn!("Refusing to export an incomplete view set");
        return Err(CustomizerError::RenderSurfaceNotReady);
    }

    let path = dir.as_ref().join(document_name);
    compose(views).save(&path)?;
    Ok(path)
}

fn write_page(pdf: &mut PdfWriter, page: &Page, parent: usize) -> Result<usize> {
    let page_height = page.height_mm * POINTS_PER_MM;
    let mut content = Vec::new();
    let mut resources = Vec::new();

    for placed in page.images.iter().filter(|placed| !placed.image.is_empty()) {
        let image_id = write_image(pdf, &placed.image)?;
        let name = format!("Im{}", image_id);

        // PDF user space starts at the bottom-left corner
        writeln!(
            content,
            "q {:.2} 0 0 {:.2} {:.2} {:.2} cm /{} Do Q",
            placed.width * POINTS_PER_MM,
            placed.height * POINTS_PER_MM,
            placed.x * POINTS_PER_MM,
            page_height - (placed.y + placed.height) * POINTS_PER_MM,
            name
        )?;
        resources.push(format!("/{} {} 0 R", name, image_id));
    }

    let contents = pdf.add(stream("", &content));
    let page_id = pdf.add(
        format!(
            "<< /Type /Page /Parent {} 0 R /MediaBox [0 0 {:.2} {:.2}] /Resources << /XObject << {} >> >> /Contents {} 0 R >>",
            parent,
            page.width_mm * POINTS_PER_MM,
            page_height,
            resources.join(" "),
            contents
        )
        .into_bytes(),
    );

    Ok(page_id)
}

/// Re-encodes the captured PNG as JPEG so it can be embedded with
/// `/DCTDecode` directly.
fn write_image(pdf: &mut PdfWriter, image: &CapturedImage) -> Result<usize> {
    let rgb = image::load_from_memory(image.bytes())?.to_rgb8();

    let mut jpeg = Vec::new();
    JpegEncoder::new_with_quality(&mut jpeg, JPEG_QUALITY).encode_image(&rgb)?;

    let dict = format!(
        "/Type /XObject /Subtype /Image /Width {} /Height {} /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /DCTDecode",
        rgb.width(),
        rgb.height()
    );
    Ok(pdf.add(stream(&dict, &jpeg)))
}

fn stream(dict: &str, data: &[u8]) -> Vec<u8> {
    let mut body = format!("<< {} /Length {} >>\nstream\n", dict, data.len()).into_bytes();
    body.extend_from_slice(data);
    body.extend_from_slice(b"\nendstream");
    body
}

/// Collects numbered objects and writes them with a cross-reference table.
#[derive(Default)]
struct PdfWriter {
    objects: Vec<Vec<u8>>,
}

impl PdfWriter {
    /// Allocates an object number to be filled in later with `set`.
    fn reserve(&mut self) -> usize {
        self.objects.push(Vec::new());
        self.objects.len()
    }

    fn set(&mut self, id: usize, body: Vec<u8>) {
        if let Some(slot) = self.objects.get_mut(id - 1) {
            *slot = body;
        }
    }

    fn add(&mut self, body: Vec<u8>) -> usize {
        self.objects.push(body);
        self.objects.len()
    }

    fn finish(self, root: usize) -> Result<Vec<u8>> {
        let mut out = Vec::new();
        out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

        let mut offsets = Vec::with_capacity(self.objects.len());
        for (index, body) in self.objects.iter().enumerate() {
            offsets.push(out.len());
            writeln!(out, "{} 0 obj", index + 1)?;
            out.extend_from_slice(body);
            out.extend_from_slice(b"\nendobj\n");
        }

        let xref = out.len();
        writeln!(out, "xref\n0 {}", self.objects.len() + 1)?;
        out.extend_from_slice(b"0000000000 65535 f \n");
        for offset in offsets {
            writeln!(out, "{:010} 00000 n ", offset)?;
        }
        write!(
            out,
            "trailer\n<< /Size {} /Root {} 0 R >>\nstartxref\n{}\n%%EOF\n",
            self.objects.len() + 1,
            root,
            xref
        )?;

        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::tests::RecordingSurface;
    use crate::capture::{capture_all, ViewPose};
    use crate::scene_graph::Scene;

    fn complete_views() -> ViewSet {
        let mut surface = RecordingSurface::attached();
        capture_all(&mut surface, &Scene::new(), &ViewPose::standard(5.0), 50.0).unwrap()
    }

    fn count(haystack: &[u8], needle: &[u8]) -> usize {
        haystack
            .windows(needle.len())
            .filter(|window| *window == needle)
            .count()
    }

    #[test]
    fn test_six_views_make_six_pages() {
        let document = compose(&complete_views());

        assert_eq!(document.page_count(), 6);
        for page in document.pages() {
            assert_eq!(page.images.len(), 1);
            let placed = &page.images[0];
            assert_eq!((placed.x, placed.y), (0.0, 0.0));
            assert_eq!((placed.width, placed.height), (A4_WIDTH_MM, A4_HEIGHT_MM));
            assert!(!page.is_blank());
        }
    }

    #[test]
    fn test_empty_views_still_make_six_blank_pages() {
        let document = compose(&ViewSet::empty());
        assert_eq!(document.page_count(), 6);
        assert!(document.pages().iter().all(Page::is_blank));

        let bytes = document.to_pdf_bytes().unwrap();
        assert_eq!(count(&bytes, b"/Subtype /Image"), 0);
        assert_eq!(count(&bytes, b"/Count 6"), 1);
    }

    #[test]
    fn test_pdf_structure() {
        let bytes = compose(&complete_views()).to_pdf_bytes().unwrap();

        assert!(bytes.starts_with(b"%PDF-1.4"));
        assert!(bytes.ends_with(b"%%EOF\n"));
        assert_eq!(count(&bytes, b"/Type /Page /Parent"), 6);
        assert_eq!(count(&bytes, b"/Subtype /Image"), 6);
        assert_eq!(count(&bytes, b"/MediaBox [0 0 595.28 841.89]"), 6);
        assert_eq!(count(&bytes, b"/Count 6"), 1);
    }

    #[test]
    fn test_export_refuses_incomplete_views() {
        let dir = tempfile::tempdir().unwrap();
        let result = export(&ViewSet::empty(), dir.path(), "custom-glasses.pdf");

        assert!(matches!(result, Err(CustomizerError::RenderSurfaceNotReady)));
        assert!(!dir.path().join("custom-glasses.pdf").exists());
    }

    #[test]
    fn test_export_writes_named_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = export(&complete_views(), dir.path(), "custom-glasses.pdf").unwrap();

        assert_eq!(path, dir.path().join("custom-glasses.pdf"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
