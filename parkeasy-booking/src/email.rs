use parkeasy_core::notify::{Attachment, Notification};
use parkeasy_core::render::RenderedDocument;
use parkeasy_core::{Booking, BookingReceipt, ParkingLot, User};

fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

fn detail_row(label: &str, value: &str) -> String {
    format!(
        r#"<div class="detail-row"><strong>{}:</strong> <span>{}</span></div>"#,
        label,
        escape_html(value)
    )
}

fn receipt_summary(receipt: &BookingReceipt) -> String {
    let mut vehicle = receipt.vehicle.license_plate.clone();
    let make_model: Vec<&str> = [receipt.vehicle.make.as_deref(), receipt.vehicle.model.as_deref()]
        .into_iter()
        .flatten()
        .filter(|s| !s.is_empty())
        .collect();
    if !make_model.is_empty() {
        vehicle = format!("{} ({})", vehicle, make_model.join(" "));
    }

    format!(
        r#"<div class="receipt-section"><h3>Receipt Summary</h3>{}{}{}{}</div>"#,
        detail_row("Confirmation", &receipt.confirmation_number),
        detail_row("Vehicle", &vehicle),
        detail_row("Slot", &receipt.slot.slot_number),
        detail_row(
            "Lot Contact",
            receipt.parking_lot_contact.as_deref().unwrap_or("Not provided")
        ),
    )
}

/// Confirmation message for a freshly created booking.
pub fn confirmation_email(
    booking: &Booking,
    user: &User,
    lot: &ParkingLot,
    receipt: Option<&BookingReceipt>,
    document: Option<RenderedDocument>,
    currency: &str,
) -> Notification {
    let qr_section = match booking.qr_code.as_deref().filter(|c| !c.is_empty()) {
        Some(src) => format!(
            r#"<div class="qr-code"><h3>Your QR Code</h3><p>Show this QR code at the parking entrance</p><img src="{}" alt="Booking QR Code"></div>"#,
            escape_html(src)
        ),
        None => String::new(),
    };

    let html_body = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<style>
body {{ font-family: Arial, sans-serif; line-height: 1.6; color: #333; }}
.container {{ max-width: 600px; margin: 0 auto; padding: 20px; }}
.header {{ background: #4f46e5; color: white; padding: 30px; text-align: center; border-radius: 10px 10px 0 0; }}
.content {{ background: #f9f9f9; padding: 30px; border-radius: 0 0 10px 10px; }}
.booking-details {{ background: white; padding: 20px; border-radius: 8px; margin: 20px 0; }}
.detail-row {{ padding: 10px 0; border-bottom: 1px solid #eee; }}
.receipt-section {{ background: #eef2ff; padding: 16px; border-radius: 8px; margin: 20px 0; }}
.qr-code {{ text-align: center; margin: 20px 0; }}
.qr-code img {{ max-width: 200px; }}
.footer {{ text-align: center; color: #666; margin-top: 20px; font-size: 12px; }}
</style>
</head>
<body>
<div class="container">
<div class="header"><h1>ParkEasy</h1><h2>Booking Confirmed!</h2></div>
<div class="content">
<p>Hi {name},</p>
<p>Your parking spot has been successfully booked!</p>
<div class="booking-details"><h3>Booking Details</h3>{id}{lot}{start}{end}{price}</div>
{receipt}
{qr}
<p>Thank you for choosing ParkEasy!</p>
<div class="footer"><p>This is an automated email. Please do not reply.</p></div>
</div>
</div>
</body>
</html>"#,
        name = escape_html(&user.full_name),
        id = detail_row("Booking ID", &booking.id.to_string()),
        lot = detail_row("Parking Lot", &lot.name),
        start = detail_row("Start Time", &booking.start_time.format("%Y-%m-%d %H:%M").to_string()),
        end = detail_row("End Time", &booking.end_time.format("%Y-%m-%d %H:%M").to_string()),
        price = detail_row("Total Price", &format!("{} {:.2}", currency, booking.total_price)),
        receipt = receipt.map(receipt_summary).unwrap_or_default(),
        qr = qr_section,
    );

    Notification {
        recipient: user.email.clone(),
        subject: format!("Booking Confirmation - {}", lot.name),
        html_body,
        attachment: document.map(|d| Attachment {
            filename: d.filename,
            content_type: d.content_type,
            data: d.data,
        }),
    }
}
