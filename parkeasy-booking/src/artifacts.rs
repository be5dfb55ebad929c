use std::sync::Arc;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use parkeasy_core::render::{CodeEncoder, DocumentRenderer, RenderResult, RenderedDocument};
use parkeasy_core::BookingReceipt;
use qrcode::render::svg;
use qrcode::QrCode;
use tracing::warn;
use uuid::Uuid;

/// Payload carried by every booking QR code.
pub fn confirmation_payload(booking_id: Uuid, user_id: Uuid) -> String {
    format!("BOOKING:{}:{}", booking_id, user_id)
}

/// Encodes payloads as QR codes rendered to an SVG data URI.
pub struct QrCodeEncoder {
    min_dimension: u32,
}

impl QrCodeEncoder {
    pub fn new(min_dimension: u32) -> Self {
        Self { min_dimension }
    }
}

impl Default for QrCodeEncoder {
    fn default() -> Self {
        Self::new(200)
    }
}

impl CodeEncoder for QrCodeEncoder {
    fn encode(&self, payload: &str) -> RenderResult<String> {
        let code = QrCode::new(payload.as_bytes())?;
        let image = code
            .render::<svg::Color>()
            .min_dimensions(self.min_dimension, self.min_dimension)
            .build();
        Ok(format!("data:image/svg+xml;base64,{}", STANDARD.encode(image)))
    }
}

/// Produces the scannable code and the printable receipt for a booking.
/// Both degrade instead of failing: an empty code string, or no document.
pub struct ConfirmationArtifacts {
    encoder: Arc<dyn CodeEncoder>,
    renderer: Arc<dyn DocumentRenderer>,
}

impl ConfirmationArtifacts {
    pub fn new(encoder: Arc<dyn CodeEncoder>, renderer: Arc<dyn DocumentRenderer>) -> Self {
        Self { encoder, renderer }
    }

    pub fn scannable_code(&self, booking_id: Uuid, payload: &str) -> String {
        match self.encoder.encode(payload) {
            Ok(code) => code,
            Err(e) => {
                warn!(booking_id = %booking_id, error = %e, "QR code generation failed");
                String::new()
            }
        }
    }

    pub fn printable(&self, receipt: &BookingReceipt) -> Option<RenderedDocument> {
        match self.renderer.render(receipt) {
            Ok(document) => Some(document),
            Err(e) => {
                warn!(booking_id = %receipt.booking_id, error = %e, "Receipt document generation failed");
                None
            }
        }
    }
}
