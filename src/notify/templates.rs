//! HTML bodies for outgoing mail.

use entity::appointment;

use super::{Email, InlineImage};

pub const QR_CONTENT_ID: &str = "checkin-qr";

fn layout(title: &str, color: &str, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
</head>
<body style="font-family: Arial, sans-serif; line-height: 1.6; color: #333;">
    <div style="max-width: 600px; margin: 0 auto; padding: 20px;">
        <h2 style="color: {color};">{title}</h2>
        {content}
        <p style="color: #666; font-size: 12px; margin-top: 40px;">
            ITSO ID Tracker. This is an automated message, please do not reply.
        </p>
    </div>
</body>
</html>"#
    )
}

fn schedule_line(appt: &appointment::Model) -> String {
    format!(
        "<p><strong>Date:</strong> {}<br><strong>Time:</strong> {} - {}<br><strong>Purpose:</strong> {}</p>",
        appt.appointment_date.format("%A, %B %-d, %Y"),
        appt.start_time,
        appt.end_time,
        appt.purpose.as_str()
    )
}

fn qr_block(qr_png: &Option<Vec<u8>>) -> &'static str {
    if qr_png.is_some() {
        r#"<p>Present this QR code at the ITSO office:</p>
        <p><img src="cid:checkin-qr" alt="Check-in QR code" width="240" height="240"></p>"#
    } else {
        ""
    }
}

fn attach(qr_png: Option<Vec<u8>>) -> Option<InlineImage> {
    qr_png.map(|png| InlineImage {
        content_id: QR_CONTENT_ID.to_string(),
        png,
    })
}

pub fn booking_confirmation(appt: &appointment::Model, qr_png: Option<Vec<u8>>) -> Email {
    let content = format!(
        "<p>Your ID appointment request has been received and is awaiting approval.</p>\n        {}\n        <p><strong>Reference:</strong> {}</p>\n        {}",
        schedule_line(appt),
        appt.id,
        qr_block(&qr_png),
    );
    Email {
        to: appt.contact_email.clone(),
        subject: "ITSO ID appointment received".to_string(),
        html_body: layout("Appointment received", "#2563eb", &content),
        inline_image: attach(qr_png),
    }
}

pub fn status_change(appt: &appointment::Model, qr_png: Option<Vec<u8>>) -> Email {
    let remarks = appt
        .admin_remarks
        .as_deref()
        .filter(|r| !r.trim().is_empty())
        .map(|r| format!("<p><strong>Remarks:</strong> {r}</p>"))
        .unwrap_or_default();
    let content = format!(
        "<p>The status of your ID appointment is now <strong>{}</strong>.</p>\n        {}\n        {}\n        {}",
        appt.status.as_str(),
        schedule_line(appt),
        remarks,
        qr_block(&qr_png),
    );
    Email {
        to: appt.contact_email.clone(),
        subject: format!("ITSO ID appointment: {}", appt.status.as_str()),
        html_body: layout("Appointment update", "#2563eb", &content),
        inline_image: attach(qr_png),
    }
}

pub fn password_reset(to: &str, reset_link: &str, expires_minutes: i64) -> Email {
    let content = format!(
        r#"<p>We received a request to reset your password. This link expires in {expires_minutes} minutes.</p>
        <p style="margin: 30px 0;">
            <a href="{reset_link}"
               style="display: inline-block; background-color: #dc2626; color: white; padding: 12px 24px; text-decoration: none; border-radius: 4px;">
                Reset Password
            </a>
        </p>
        <p style="color: #666; font-size: 14px;">If you didn't request this, you can ignore this email.</p>"#
    );
    Email {
        to: to.to_string(),
        subject: "Reset your ITSO ID Tracker password".to_string(),
        html_body: layout("Reset your password", "#dc2626", &content),
        inline_image: None,
    }
}
