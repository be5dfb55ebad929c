use crate::models::BookingReceipt;

pub type RenderResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

/// Turns a text payload into an embeddable image (a data URI).
pub trait CodeEncoder: Send + Sync {
    fn encode(&self, payload: &str) -> RenderResult<String>;
}

#[derive(Debug, Clone)]
pub struct RenderedDocument {
    pub filename: String,
    pub content_type: String,
    pub data: Vec<u8>,
}

/// Turns a receipt into a printable binary document.
pub trait DocumentRenderer: Send + Sync {
    fn render(&self, receipt: &BookingReceipt) -> RenderResult<RenderedDocument>;
}
