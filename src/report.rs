use std::collections::BTreeSet;
use std::fmt::Write;

use anyhow::Context;

use crate::colors::ColorMap;
use crate::conflicts::format_days;
use crate::mailer::RECIPIENT_PLACEHOLDER;
use crate::models::{AttendanceStat, ScheduleTable};

pub const ATTACHMENT_NAME: &str = "calendario.csv";

const PAGE_TITLE: &str = "Calendario - Smart working";

pub fn escape_html(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Standalone page with the colored schedule, the conflict warning and attendance.
pub fn build_page(
    table: &ScheduleTable,
    month_column: Option<&str>,
    month_label: &str,
    conflicts: &BTreeSet<String>,
    stats: &[AttendanceStat],
) -> String {
    let day_columns = table.day_columns(month_column);
    let colors = ColorMap::build(table, &day_columns);

    let mut output = String::new();
    let _ = writeln!(output, "<!DOCTYPE html>");
    let _ = writeln!(output, "<html lang=\"it\">");
    let _ = writeln!(output, "<head>");
    let _ = writeln!(output, "<meta charset=\"UTF-8\">");
    let _ = writeln!(output, "<title>{PAGE_TITLE}</title>");
    let _ = writeln!(
        output,
        "<style>body {{ font-family: sans-serif; }} table {{ border-collapse: collapse; }} \
         td, th {{ border: 1px solid #ccc; padding: 4px 8px; }} \
         .warning {{ background: #fff3cd; padding: 8px; }}</style>"
    );
    let _ = writeln!(output, "</head>");
    let _ = writeln!(output, "<body>");
    let _ = writeln!(output, "<h1>{PAGE_TITLE}</h1>");
    let _ = writeln!(output, "<h2>{}</h2>", escape_html(month_label));

    let _ = writeln!(output, "<table>");
    let _ = writeln!(output, "<thead><tr>");
    for header in table.display_headers(month_column) {
        let _ = writeln!(output, "<th>{}</th>", escape_html(&header));
    }
    let _ = writeln!(output, "</tr></thead>");
    let _ = writeln!(output, "<tbody>");
    for row in &table.rows {
        let _ = write!(output, "<tr>");
        for column in 0..table.columns.len() {
            let value = table.cell(row, column);
            let style = if day_columns.contains(&column) {
                colors.style(value)
            } else {
                ""
            };
            if style.is_empty() {
                let _ = write!(output, "<td>{}</td>", escape_html(value));
            } else {
                let _ = write!(output, "<td style=\"{style}\">{}</td>", escape_html(value));
            }
        }
        let _ = writeln!(output, "</tr>");
    }
    let _ = writeln!(output, "</tbody>");
    let _ = writeln!(output, "</table>");

    if !conflicts.is_empty() {
        let _ = writeln!(
            output,
            "<p class=\"warning\">Attenzione! Nessuno a casa nei giorni: {}.</p>",
            escape_html(&format_days(conflicts))
        );
    }

    let _ = writeln!(output, "<h2>Presenze</h2>");
    if stats.is_empty() {
        let _ = writeln!(output, "<p>Nessuna presenza registrata.</p>");
    } else {
        let _ = writeln!(output, "<table>");
        let _ = writeln!(
            output,
            "<thead><tr><th>Persona</th><th>Casa</th><th>Ufficio</th><th>% Casa</th></tr></thead>"
        );
        let _ = writeln!(output, "<tbody>");
        for stat in stats {
            let _ = writeln!(
                output,
                "<tr><td>{}</td><td>{}</td><td>{}</td><td>{:.1}</td></tr>",
                escape_html(&stat.person),
                stat.home_days,
                stat.office_days,
                stat.home_percentage
            );
        }
        let _ = writeln!(output, "</tbody>");
        let _ = writeln!(output, "</table>");
    }

    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");
    output
}

/// Plain bordered table for the email body, no index column.
pub fn build_email_table(table: &ScheduleTable, month_column: Option<&str>) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "<table border=\"1\">");
    let _ = writeln!(output, "  <thead>");
    let _ = writeln!(output, "    <tr>");
    for header in table.display_headers(month_column) {
        let _ = writeln!(output, "      <th>{}</th>", escape_html(&header));
    }
    let _ = writeln!(output, "    </tr>");
    let _ = writeln!(output, "  </thead>");
    let _ = writeln!(output, "  <tbody>");
    for row in &table.rows {
        let _ = writeln!(output, "    <tr>");
        for column in 0..table.columns.len() {
            let _ = writeln!(
                output,
                "      <td>{}</td>",
                escape_html(table.cell(row, column))
            );
        }
        let _ = writeln!(output, "    </tr>");
    }
    let _ = writeln!(output, "  </tbody>");
    let _ = writeln!(output, "</table>");
    output
}

pub fn email_subject(month_label: &str) -> String {
    format!("Calendario {month_label} - Smart Working")
}

/// Email template; the recipient name is filled in per address by the dispatcher.
pub fn build_email_body(
    month_label: &str,
    conflicts: &BTreeSet<String>,
    table_html: &str,
) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "<html>");
    let _ = writeln!(
        output,
        "<body style=\"font-family: Tahoma, Geneva, sans-serif; font-size: 20px; line-height: 1.6; color: #333;\">"
    );
    let _ = writeln!(output, "<p>Gentile {RECIPIENT_PLACEHOLDER},</p>");
    let _ = writeln!(
        output,
        "<p>Di seguito puoi trovare il calendario di smart working aggiornato per il mese di <strong>{}</strong>.</p>",
        escape_html(month_label)
    );
    if !conflicts.is_empty() {
        let _ = writeln!(
            output,
            "<p><strong>Attenzione:</strong> Sono state rilevate delle sovrapposizioni nei giorni: {}.</p>",
            escape_html(&format_days(conflicts))
        );
    }
    let _ = writeln!(output, "<br>");
    let _ = write!(output, "{table_html}");
    let _ = writeln!(output, "<br>");
    let _ = writeln!(output, "<p>In allegato anche il relativo file CSV.</p>");
    let _ = writeln!(output, "<p>Grazie mille,</p>");
    let _ = writeln!(output, "</body>");
    let _ = writeln!(output, "</html>");
    output
}

/// CSV of the visible rows, header row first with person/month headers blanked.
pub fn build_csv(table: &ScheduleTable, month_column: Option<&str>) -> anyhow::Result<Vec<u8>> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(table.display_headers(month_column))?;
    for row in &table.rows {
        writer.write_record(row)?;
    }
    writer
        .into_inner()
        .map_err(|e| e.into_error())
        .context("failed to finish CSV attachment")
}
