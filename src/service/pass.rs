use crate::error::app_error::AppError;
use crate::models::appointment::Appointment;
use base64::{Engine as _, engine::general_purpose};
use chrono::NaiveTime;
use qrcode::QrCode;

/// Fixed card dimensions in CSS pixels (15rem x 21rem at 16px/rem).
const PASS_WIDTH_PX: f64 = 240.0;
const PASS_HEIGHT_PX: f64 = 336.0;
/// 96 DPI: 1 px = 0.264583 mm. The exported document is sized to the card's
/// physical dimensions.
const MM_PER_PX: f64 = 0.264583;

/// A rendered pass ready for download.
#[derive(Debug, Clone)]
pub struct PassDocument {
    pub filename: String,
    pub svg: String,
}

fn xml_escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

/// Card lines are single-line; anything longer than the card is elided.
fn elide(value: &str, max_chars: usize) -> String {
    if value.chars().count() <= max_chars {
        value.to_string()
    } else {
        let truncated: String = value.chars().take(max_chars).collect();
        format!("{truncated}…")
    }
}

fn format_time_12h(time: NaiveTime) -> String {
    time.format("%I:%M %p").to_string()
}

/// Render the appointment pass as a self-contained SVG document.
///
/// Output is deterministic for identical appointment data: the layout is
/// fixed and nothing environment-dependent is embedded.
pub fn render_pass(appointment: &Appointment) -> Result<PassDocument, AppError> {
    let qr = QrCode::new(appointment.id.to_string().as_bytes())
        .map_err(|e| AppError::BadRequest(format!("Failed to generate QR code: {}", e)))?;
    let qr_svg = qr.render::<qrcode::render::svg::Color>().min_dimensions(96, 96).build();
    let qr_data_url = format!("data:image/svg+xml;base64,{}", general_purpose::STANDARD.encode(qr_svg.as_bytes()));

    let width_mm = PASS_WIDTH_PX * MM_PER_PX;
    let height_mm = PASS_HEIGHT_PX * MM_PER_PX;

    let name = xml_escape(&elide(&appointment.owner_name, 24));
    let purpose = xml_escape(&elide(&appointment.purpose, 32));
    let date = appointment.date.format("%d/%m/%Y").to_string();
    let time = format_time_12h(appointment.time);

    let svg = format!(
        r##"<svg xmlns="http://www.w3.org/2000/svg" width="{width_mm:.2}mm" height="{height_mm:.2}mm" viewBox="0 0 {width} {height}">
  <defs>
    <linearGradient id="card" x1="0" y1="0" x2="1" y2="1">
      <stop offset="0" stop-color="#4a90e2"/>
      <stop offset="1" stop-color="#50e3c2"/>
    </linearGradient>
  </defs>
  <rect width="{width}" height="{height}" rx="12" fill="url(#card)"/>
  <text x="120" y="36" text-anchor="middle" fill="#ffffff" font-family="Helvetica, Arial, sans-serif" font-size="16" font-weight="bold" letter-spacing="1">APPOINTMENT PASS</text>
  <text x="120" y="56" text-anchor="middle" fill="#ffffff" font-family="Helvetica, Arial, sans-serif" font-size="11">Welcome To Lycoris...</text>
  <image href="{qr_data_url}" x="72" y="68" width="96" height="96"/>
  <line x1="24" y1="180" x2="216" y2="180" stroke="rgba(255,255,255,0.5)" stroke-width="1"/>
  <text x="24" y="204" fill="#ffffff" font-family="Helvetica, Arial, sans-serif" font-size="12"><tspan font-weight="bold">Name:</tspan> {name}</text>
  <text x="24" y="226" fill="#ffffff" font-family="Helvetica, Arial, sans-serif" font-size="12"><tspan font-weight="bold">Date:</tspan> {date}</text>
  <text x="24" y="248" fill="#ffffff" font-family="Helvetica, Arial, sans-serif" font-size="12"><tspan font-weight="bold">Time:</tspan> {time}</text>
  <text x="24" y="270" fill="#ffffff" font-family="Helvetica, Arial, sans-serif" font-size="12"><tspan font-weight="bold">Purpose:</tspan> {purpose}</text>
  <line x1="24" y1="290" x2="216" y2="290" stroke="rgba(255,255,255,0.5)" stroke-width="1"/>
  <text x="120" y="314" text-anchor="middle" fill="#ffffff" font-family="Helvetica, Arial, sans-serif" font-size="9">ID: {id}</text>
</svg>
"##,
        width = PASS_WIDTH_PX as u32,
        height = PASS_HEIGHT_PX as u32,
        id = appointment.id,
    );

    Ok(PassDocument {
        filename: format!("Appointment_Pass_{}.svg", appointment.id),
        svg,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::appointment::AppointmentStatus;
    use chrono::{NaiveDate, TimeZone, Utc};
    use uuid::Uuid;

    fn appointment() -> Appointment {
        Appointment {
            id: Uuid::nil(),
            owner_id: Uuid::nil(),
            owner_name: "Ada Lovelace".to_string(),
            date: NaiveDate::from_ymd_opt(2025, 6, 1).expect("valid date"),
            time: NaiveTime::from_hms_opt(14, 30, 0).expect("valid time"),
            purpose: "Dental check-up".to_string(),
            status: AppointmentStatus::Scheduled,
            created_at: Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).single().expect("valid timestamp"),
        }
    }

    #[test]
    fn pass_is_sized_in_millimetres_at_96_dpi() {
        let document = render_pass(&appointment()).expect("rendered");
        // 240 px * 0.264583 = 63.50 mm, 336 px * 0.264583 = 88.90 mm
        assert!(document.svg.contains(r#"width="63.50mm""#));
        assert!(document.svg.contains(r#"height="88.90mm""#));
        assert!(document.svg.contains(r#"viewBox="0 0 240 336""#));
    }

    #[test]
    fn pass_formats_date_and_time_like_the_dashboards() {
        let document = render_pass(&appointment()).expect("rendered");
        assert!(document.svg.contains("01/06/2025"));
        assert!(document.svg.contains("02:30 PM"));
    }

    #[test]
    fn pass_is_deterministic_for_identical_input() {
        let first = render_pass(&appointment()).expect("rendered");
        let second = render_pass(&appointment()).expect("rendered");
        assert_eq!(first.svg, second.svg);
        assert_eq!(first.filename, second.filename);
    }

    #[test]
    fn pass_escapes_markup_in_free_text() {
        let mut appointment = appointment();
        appointment.purpose = "checkup <script> & co".to_string();
        let document = render_pass(&appointment).expect("rendered");
        assert!(!document.svg.contains("<script>"));
        assert!(document.svg.contains("&lt;script&gt;"));
    }

    #[test]
    fn filename_follows_the_download_convention() {
        let document = render_pass(&appointment()).expect("rendered");
        assert_eq!(document.filename, format!("Appointment_Pass_{}.svg", Uuid::nil()));
    }

    #[test]
    fn morning_times_render_with_am() {
        assert_eq!(format_time_12h(NaiveTime::from_hms_opt(9, 5, 0).expect("valid time")), "09:05 AM");
    }
}
