//! Single-page PDF encoder for `ReportDocument`.
//!
//! The output is a minimal PDF 1.4 file:
//! - one A4 page with the standard Helvetica font (WinAnsi text)
//! - the chart embedded as an 8-bit `DeviceRGB` image XObject
//! - image and page content streams zlib-compressed (`/FlateDecode`)
//! - an info dictionary with title, producer and creation date
//!
//! Layout coordinates arrive in millimetres from the top-left corner and are
//! converted to PDF points from the bottom-left corner here.

use std::fs;
use std::io::Write;
use std::path::Path;

use chrono::{DateTime, Local};
use flate2::Compression;
use flate2::write::ZlibEncoder;
use tracing::info;

use crate::error::WorkflowError;
use crate::report::{ReportDocument, ReportSection};

const PT_PER_MM: f64 = 72.0 / 25.4;
const IMAGE_NAME: &str = "Im1";
const FONT_NAME: &str = "F1";
const PRODUCER: &str = "fcmp";

/// Turns a composed report into file bytes.
pub trait ReportEncoder {
    fn encode(&self, doc: &ReportDocument) -> Result<Vec<u8>, WorkflowError>;
}

#[derive(Debug, Clone, Default)]
pub struct PdfReportEncoder {
    /// Fixed creation date (for reproducible output); `None` uses the local clock.
    pub creation_date: Option<DateTime<Local>>,
}

impl PdfReportEncoder {
    pub fn with_creation_date(date: DateTime<Local>) -> Self {
        Self {
            creation_date: Some(date),
        }
    }
}

impl ReportEncoder for PdfReportEncoder {
    fn encode(&self, doc: &ReportDocument) -> Result<Vec<u8>, WorkflowError> {
        let img = &doc.image;
        if img.rgb.len() != img.width as usize * img.height as usize * 3 {
            return Err(WorkflowError::Encode("image buffer does not match its dimensions".into()));
        }

        let page_w = doc.page_size.width_mm * PT_PER_MM;
        let page_h = doc.page_size.height_mm * PT_PER_MM;
        let content = deflate(&content_stream(doc, page_h))?;
        let pixels = deflate(&img.rgb)?;
        let created = self.creation_date.unwrap_or_else(Local::now);

        let mut w = PdfWriter::new();

        w.object(|b| b.extend_from_slice(b"<< /Type /Catalog /Pages 2 0 R >>"));
        w.object(|b| b.extend_from_slice(b"<< /Type /Pages /Kids [3 0 R] /Count 1 >>"));
        w.object(|b| {
            b.extend_from_slice(
                format!(
                    "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                     /Resources << /Font << /{FONT_NAME} 4 0 R >> /XObject << /{IMAGE_NAME} 5 0 R >> >> \
                     /Contents 6 0 R >>",
                    num(page_w),
                    num(page_h)
                )
                .as_bytes(),
            )
        });
        w.object(|b| {
            b.extend_from_slice(
                b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>",
            )
        });
        w.object(|b| {
            b.extend_from_slice(
                format!(
                    "<< /Type /XObject /Subtype /Image /Width {} /Height {} \
                     /ColorSpace /DeviceRGB /BitsPerComponent 8 /Filter /FlateDecode /Length {} >>\nstream\n",
                    img.width,
                    img.height,
                    pixels.len()
                )
                .as_bytes(),
            );
            b.extend_from_slice(&pixels);
            b.extend_from_slice(b"\nendstream");
        });
        w.object(|b| {
            b.extend_from_slice(format!("<< /Filter /FlateDecode /Length {} >>\nstream\n", content.len()).as_bytes());
            b.extend_from_slice(&content);
            b.extend_from_slice(b"\nendstream");
        });
        w.object(|b| {
            b.extend_from_slice(b"<< /Title ");
            b.extend_from_slice(&pdf_string(&doc.title));
            b.extend_from_slice(b" /Producer ");
            b.extend_from_slice(&pdf_string(PRODUCER));
            b.extend_from_slice(b" /CreationDate ");
            b.extend_from_slice(&pdf_string(&format!("D:{}", created.format("%Y%m%d%H%M%S"))));
            b.extend_from_slice(b" >>");
        });

        Ok(w.finish(1, 7))
    }
}

/// Encode `doc` and write it to `path`.
pub fn write_report(encoder: &dyn ReportEncoder, doc: &ReportDocument, path: &Path) -> Result<(), WorkflowError> {
    let bytes = encoder.encode(doc)?;
    fs::write(path, &bytes)
        .map_err(|e| WorkflowError::Encode(format!("failed to write '{}': {e}", path.display())))?;
    info!(path = %path.display(), bytes = bytes.len(), "report written");
    Ok(())
}

fn content_stream(doc: &ReportDocument, page_h: f64) -> Vec<u8> {
    let mut out = Vec::new();
    for section in &doc.sections {
        match section {
            ReportSection::Text {
                x_mm,
                y_mm,
                font_pt,
                text,
            } => {
                out.extend_from_slice(
                    format!(
                        "BT /{FONT_NAME} {} Tf {} {} Td ",
                        num(*font_pt),
                        num(x_mm * PT_PER_MM),
                        num(page_h - y_mm * PT_PER_MM)
                    )
                    .as_bytes(),
                );
                out.extend_from_slice(&pdf_string(text));
                out.extend_from_slice(b" Tj ET\n");
            }
            ReportSection::Image {
                x_mm,
                y_mm,
                width_mm,
                height_mm,
            } => {
                let w = width_mm * PT_PER_MM;
                let h = height_mm * PT_PER_MM;
                let x = x_mm * PT_PER_MM;
                let y = page_h - (y_mm + height_mm) * PT_PER_MM;
                out.extend_from_slice(
                    format!("q {} 0 0 {} {} {} cm /{IMAGE_NAME} Do Q\n", num(w), num(h), num(x), num(y))
                        .as_bytes(),
                );
            }
            ReportSection::Swatch {
                x_mm,
                y_mm,
                width_mm,
                height_mm,
                rgb: (r, g, b),
            } => {
                let channel = |c: u8| num(f64::from(c) / 255.0);
                out.extend_from_slice(
                    format!(
                        "q {} {} {} rg {} {} {} {} re f Q\n",
                        channel(*r),
                        channel(*g),
                        channel(*b),
                        num(x_mm * PT_PER_MM),
                        num(page_h - (y_mm + height_mm) * PT_PER_MM),
                        num(width_mm * PT_PER_MM),
                        num(height_mm * PT_PER_MM)
                    )
                    .as_bytes(),
                );
            }
        }
    }
    out
}

fn deflate(data: &[u8]) -> Result<Vec<u8>, WorkflowError> {
    let compress_err = |e: std::io::Error| WorkflowError::Encode(format!("stream compression failed: {e}"));
    let mut enc = ZlibEncoder::new(Vec::new(), Compression::default());
    enc.write_all(data).map_err(compress_err)?;
    enc.finish().map_err(compress_err)
}

/// PDF literal string in WinAnsi encoding.
///
/// Latin-1 characters map to the same byte (octal-escaped); anything outside it becomes `?`.
fn pdf_string(s: &str) -> Vec<u8> {
    let mut out = vec![b'('];
    for ch in s.chars() {
        match ch {
            '(' | ')' | '\\' => {
                out.push(b'\\');
                out.push(ch as u8);
            }
            ' '..='~' => out.push(ch as u8),
            '\u{a0}'..='\u{ff}' => out.extend_from_slice(format!("\\{:03o}", ch as u32).as_bytes()),
            _ => out.push(b'?'),
        }
    }
    out.push(b')');
    out
}

fn num(v: f64) -> String {
    let s = format!("{v:.2}");
    let s = s.trim_end_matches('0').trim_end_matches('.');
    if s.is_empty() || s == "-" { "0".to_string() } else { s.to_string() }
}

/// Sequential object writer that tracks byte offsets for the xref table.
struct PdfWriter {
    buf: Vec<u8>,
    offsets: Vec<usize>,
}

impl PdfWriter {
    fn new() -> Self {
        let mut buf = Vec::new();
        buf.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");
        Self {
            buf,
            offsets: Vec::new(),
        }
    }

    fn object(&mut self, body: impl FnOnce(&mut Vec<u8>)) {
        self.offsets.push(self.buf.len());
        let id = self.offsets.len();
        self.buf.extend_from_slice(format!("{id} 0 obj\n").as_bytes());
        body(&mut self.buf);
        self.buf.extend_from_slice(b"\nendobj\n");
    }

    fn finish(mut self, root: usize, info: usize) -> Vec<u8> {
        let xref_at = self.buf.len();
        let size = self.offsets.len() + 1;
        self.buf
            .extend_from_slice(format!("xref\n0 {size}\n0000000000 65535 f \n").as_bytes());
        for off in &self.offsets {
            self.buf.extend_from_slice(format!("{off:010} 00000 n \n").as_bytes());
        }
        self.buf.extend_from_slice(
            format!(
                "trailer\n<< /Size {size} /Root {root} 0 R /Info {info} 0 R >>\nstartxref\n{xref_at}\n%%EOF\n"
            )
            .as_bytes(),
        );
        self.buf
    }
}
