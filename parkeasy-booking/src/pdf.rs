//! Self-contained PDF receipt.
//!
//! Writes a PDF 1.4 file with the two built-in Helvetica faces in
//! WinAnsiEncoding, so no font embedding is needed. Long values wrap inside
//! the value column and the layout continues on a new page when the current
//! one is full. The QR code is drawn as filled vector squares from the module
//! matrix of the booking's confirmation payload.

use std::fmt::Write as _;
use std::io::Write as _;

use parkeasy_core::render::{DocumentRenderer, RenderResult, RenderedDocument};
use parkeasy_core::BookingReceipt;
use qrcode::{Color, QrCode};
use tracing::warn;

use crate::receipt::format_duration;

const PAGE_WIDTH: f32 = 612.0;
const PAGE_HEIGHT: f32 = 792.0;
const MARGIN: f32 = 72.0;
const TOP_MARGIN: f32 = 48.0;
const BOTTOM_MARGIN: f32 = 54.0;
const VALUE_COLUMN: f32 = 222.0;
const ROW_HEIGHT: f32 = 16.0;
const WRAP_LINE_HEIGHT: f32 = 12.0;
/// Helvetica 10pt fits roughly this many characters in the value column.
const VALUE_CHARS: usize = 58;
/// A single row never grows past half a page.
const MAX_ROW_LINES: usize = 28;
const QR_SIZE: f32 = 120.0;

pub struct PdfReceiptRenderer {
    brand: String,
    currency: String,
}

impl PdfReceiptRenderer {
    pub fn new(brand: impl Into<String>, currency: impl Into<String>) -> Self {
        Self { brand: brand.into(), currency: currency.into() }
    }
}

impl Default for PdfReceiptRenderer {
    fn default() -> Self {
        Self::new("ParkEasy", "INR")
    }
}

impl DocumentRenderer for PdfReceiptRenderer {
    fn render(&self, receipt: &BookingReceipt) -> RenderResult<RenderedDocument> {
        let mut page = Layout::new();

        page.text(MARGIN, 22.0, Font::Bold, &format!("{} Booking Receipt", self.brand));
        page.text(MARGIN, 14.0, Font::Bold, &format!("Confirmation: {}", receipt.confirmation_number));
        page.gap(10.0);

        page.section("Customer Details");
        page.row("Customer Name", &receipt.user_name);
        page.row("Email", &receipt.user_email);
        page.row("Phone", receipt.user_phone.as_deref().unwrap_or("Not provided"));

        page.section("Parking Facility");
        page.row("Parking Lot", &receipt.parking_lot_name);
        page.row("Address", &receipt.parking_lot_address);
        page.row("Contact", receipt.parking_lot_contact.as_deref().unwrap_or("Not provided"));

        page.section("Parking Slot & Vehicle");
        page.row("Slot Number", &receipt.slot.slot_number);
        page.row(
            "Slot Type",
            &receipt
                .slot
                .slot_type
                .map(|t| capitalize(t.as_str()))
                .unwrap_or_else(|| "Not specified".to_string()),
        );
        page.row(
            "Floor Level",
            &receipt
                .slot
                .floor_level
                .map(|f| f.to_string())
                .unwrap_or_else(|| "N/A".to_string()),
        );
        page.row("Vehicle", &receipt.vehicle.license_plate);
        page.row("Make", receipt.vehicle.make.as_deref().unwrap_or("N/A"));
        page.row("Model", receipt.vehicle.model.as_deref().unwrap_or("N/A"));
        page.row("Color", receipt.vehicle.color.as_deref().unwrap_or("N/A"));
        page.row(
            "Vehicle Type",
            &receipt
                .vehicle
                .vehicle_type
                .as_deref()
                .map(capitalize)
                .unwrap_or_else(|| "N/A".to_string()),
        );

        page.section("Booking Summary");
        page.row("Start Time", &receipt.start_time.format("%Y-%m-%d %H:%M").to_string());
        page.row("End Time", &receipt.end_time.format("%Y-%m-%d %H:%M").to_string());
        page.row("Duration", &format_duration(receipt.start_time, receipt.end_time));
        page.row("Booking Status", &capitalize(receipt.booking_status.as_str()));
        page.row("Payment Status", &capitalize(receipt.payment_status.as_str()));
        page.row(
            "Total Price",
            &format!("{} {}", self.currency, format_amount(receipt.total_price)),
        );
        page.row("Issued On", &receipt.created_at.format("%Y-%m-%d %H:%M").to_string());

        let has_code = receipt.qr_code.as_deref().is_some_and(|c| !c.is_empty());
        if let (true, Some(payload)) = (has_code, receipt.confirmation_code.as_deref()) {
            page.section("QR Code");
            page.text(MARGIN, 10.0, Font::Regular, "Present this QR code at the entry point.");
            match QrCode::new(payload.as_bytes()) {
                Ok(code) => page.qr(&code),
                Err(e) => {
                    warn!(booking_id = %receipt.booking_id, error = %e, "QR code could not be drawn");
                    page.text(MARGIN, 10.0, Font::Regular, "QR code unavailable");
                }
            }
        }

        page.gap(12.0);
        page.text(
            MARGIN,
            10.0,
            Font::Regular,
            &format!("Thank you for using {}. We appreciate your business!", self.brand),
        );

        let title = format!("Booking Receipt - {}", receipt.confirmation_number);
        let data = assemble(&page.finish(), &title, &self.brand)?;

        Ok(RenderedDocument {
            filename: format!("receipt_{}.pdf", receipt.booking_id),
            content_type: "application/pdf".to_string(),
            data,
        })
    }
}

#[derive(Clone, Copy)]
enum Font {
    Regular,
    Bold,
}

impl Font {
    fn resource(self) -> &'static str {
        match self {
            Font::Regular => "F1",
            Font::Bold => "F2",
        }
    }
}

/// Content streams laid out top-down, one per page.
struct Layout {
    done: Vec<String>,
    ops: String,
    cursor: f32,
}

impl Layout {
    fn new() -> Self {
        Self { done: Vec::new(), ops: String::new(), cursor: PAGE_HEIGHT - TOP_MARGIN }
    }

    /// Start a new page unless `height` still fits above the bottom margin.
    fn reserve(&mut self, height: f32) {
        if self.cursor - height < BOTTOM_MARGIN {
            self.done.push(std::mem::take(&mut self.ops));
            self.cursor = PAGE_HEIGHT - TOP_MARGIN;
        }
    }

    fn finish(mut self) -> Vec<String> {
        self.done.push(self.ops);
        self.done
    }

    fn gap(&mut self, height: f32) {
        self.cursor -= height;
    }

    fn text(&mut self, x: f32, size: f32, font: Font, text: &str) {
        self.reserve(size + 4.0);
        self.cursor -= size + 4.0;
        self.put_text(x, self.cursor, size, font, text);
    }

    fn put_text(&mut self, x: f32, y: f32, size: f32, font: Font, text: &str) {
        let _ = writeln!(
            self.ops,
            "BT /{} {} Tf {:.2} {:.2} Td ({}) Tj ET",
            font.resource(),
            size,
            x,
            y,
            escape(text)
        );
    }

    fn section(&mut self, title: &str) {
        self.gap(8.0);
        // keep the heading with its first row
        self.reserve(17.0 + 2.0 + ROW_HEIGHT);
        self.text(MARGIN, 13.0, Font::Bold, title);
        self.gap(2.0);
    }

    fn row(&mut self, label: &str, value: &str) {
        let mut lines = wrap(value, VALUE_CHARS);
        if lines.len() > MAX_ROW_LINES {
            lines.truncate(MAX_ROW_LINES);
            if let Some(last) = lines.last_mut() {
                last.push_str(" ...");
            }
        }
        let height = ROW_HEIGHT + (lines.len() - 1) as f32 * WRAP_LINE_HEIGHT;
        self.reserve(height);

        let mut baseline = self.cursor - ROW_HEIGHT + 4.0;
        self.put_text(MARGIN + 4.0, baseline, 10.0, Font::Bold, label);
        for line in &lines {
            self.put_text(VALUE_COLUMN, baseline, 10.0, Font::Regular, line);
            baseline -= WRAP_LINE_HEIGHT;
        }
        self.cursor -= height;
        let _ = writeln!(
            self.ops,
            "0.8 G 0.5 w {:.2} {:.2} m {:.2} {:.2} l S 0 G",
            MARGIN,
            self.cursor,
            PAGE_WIDTH - MARGIN,
            self.cursor
        );
    }

    fn qr(&mut self, code: &QrCode) {
        let width = code.width();
        if width == 0 {
            return;
        }
        self.reserve(QR_SIZE + 6.0);
        self.gap(6.0);
        let module = QR_SIZE / width as f32;
        let top = self.cursor;
        let _ = writeln!(self.ops, "0 g");
        for (index, color) in code.to_colors().iter().enumerate() {
            if *color != Color::Dark {
                continue;
            }
            let (col, row) = (index % width, index / width);
            let x = MARGIN + col as f32 * module;
            let y = top - (row as f32 + 1.0) * module;
            let _ = writeln!(self.ops, "{:.3} {:.3} {:.3} {:.3} re f", x, y, module, module);
        }
        self.cursor = top - QR_SIZE;
    }
}

/// Greedy word wrap to at most `width` characters per line; words longer
/// than a line are split. Always returns at least one line.
fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();
    for word in text.split_whitespace() {
        let mut word: Vec<char> = word.chars().collect();
        while word.len() > width {
            if !line.is_empty() {
                lines.push(std::mem::take(&mut line));
            }
            lines.push(word.drain(..width).collect());
        }
        let word: String = word.into_iter().collect();
        if word.is_empty() {
            continue;
        }
        let needed = match line.chars().count() {
            0 => word.chars().count(),
            n => n + 1 + word.chars().count(),
        };
        if needed > width {
            lines.push(std::mem::take(&mut line));
        }
        if !line.is_empty() {
            line.push(' ');
        }
        line.push_str(&word);
    }
    if !line.is_empty() || lines.is_empty() {
        lines.push(line);
    }
    lines
}

/// WinAnsiEncoding byte for characters outside ASCII.
fn win_ansi(c: char) -> Option<u8> {
    match c {
        '\u{a0}'..='\u{ff}' => u8::try_from(u32::from(c)).ok(),
        '€' => Some(0x80),
        '‘' => Some(0x91),
        '’' => Some(0x92),
        '“' => Some(0x93),
        '”' => Some(0x94),
        '•' => Some(0x95),
        '–' => Some(0x96),
        '—' => Some(0x97),
        _ => None,
    }
}

/// Literal string escaping. Characters in WinAnsiEncoding become octal
/// escapes, the rupee sign is spelled `Rs.`, anything else becomes `?`.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '\\' | '(' | ')' => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_ascii_graphic() || c == ' ' => out.push(c),
            c if c.is_control() => out.push(' '),
            '₹' => out.push_str("Rs."),
            c => match win_ansi(c) {
                Some(byte) => {
                    let _ = write!(out, "\\{:03o}", byte);
                }
                None => out.push('?'),
            },
        }
    }
    out
}

fn capitalize(text: &str) -> String {
    let mut chars = text.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `1234.5` -> `1,234.50`
fn format_amount(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (whole, fraction) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));
    let mut grouped = String::new();
    for (i, digit) in whole.chars().enumerate() {
        if i > 0 && (whole.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(digit);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, fraction)
}

fn assemble(pages: &[String], title: &str, producer: &str) -> std::io::Result<Vec<u8>> {
    // 1 catalog, 2 page tree, 3-4 fonts, 5 info, then a page and its content per page
    const FIRST_PAGE: usize = 6;
    let kids: Vec<String> =
        (0..pages.len()).map(|i| format!("{} 0 R", FIRST_PAGE + 2 * i)).collect();

    let mut objects: Vec<Vec<u8>> = vec![
        b"<< /Type /Catalog /Pages 2 0 R >>".to_vec(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), pages.len())
            .into_bytes(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica /Encoding /WinAnsiEncoding >>"
            .to_vec(),
        b"<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica-Bold /Encoding /WinAnsiEncoding >>"
            .to_vec(),
        format!("<< /Title ({}) /Producer ({}) >>", escape(title), escape(producer)).into_bytes(),
    ];
    for (i, content) in pages.iter().enumerate() {
        objects.push(
            format!(
                "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 {} {}] \
                 /Resources << /Font << /F1 3 0 R /F2 4 0 R >> >> /Contents {} 0 R >>",
                PAGE_WIDTH,
                PAGE_HEIGHT,
                FIRST_PAGE + 2 * i + 1
            )
            .into_bytes(),
        );
        let mut stream = format!("<< /Length {} >>\nstream\n", content.len()).into_bytes();
        stream.extend_from_slice(content.as_bytes());
        stream.extend_from_slice(b"\nendstream");
        objects.push(stream);
    }

    let mut out: Vec<u8> = Vec::new();
    out.extend_from_slice(b"%PDF-1.4\n%\xE2\xE3\xCF\xD3\n");

    let mut offsets = Vec::with_capacity(objects.len());
    for (i, object) in objects.iter().enumerate() {
        offsets.push(out.len());
        write!(out, "{} 0 obj\n", i + 1)?;
        out.extend_from_slice(object);
        out.extend_from_slice(b"\nendobj\n");
    }

    let xref_offset = out.len();
    write!(out, "xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1)?;
    for offset in &offsets {
        write!(out, "{:010} 00000 n \n", offset)?;
    }
    write!(
        out,
        "trailer\n<< /Size {} /Root 1 0 R /Info 5 0 R >>\nstartxref\n{}\n%%EOF\n",
        objects.len() + 1,
        xref_offset
    )?;
    Ok(out)
}
