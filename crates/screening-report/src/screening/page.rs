use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;

use super::service::GeneratedReport;
use crate::report::layout::detail_lines;
use crate::report::ReportBranding;

pub(crate) const LOGO_ROUTE: &str = "/logo";
pub(crate) const FORM_ROUTE: &str = "/reports";

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            other => escaped.push(other),
        }
    }
    escaped
}

fn form(identifier: &str) -> String {
    format!(
        r#"<form method="post" action="{action}">
<label for="identifier">Enter your Mat Number/Hospital Number</label>
<input id="identifier" name="identifier" type="text" value="{identifier}">
<button type="submit">Generate Report</button>
</form>"#,
        action = FORM_ROUTE,
        identifier = escape(identifier),
    )
}

fn shell(branding: &ReportBranding, main: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{institution}</title>
<style>
body {{ font-family: sans-serif; max-width: 40rem; margin: 2rem auto; }}
header {{ text-align: center; }}
.error {{ color: #a40000; }}
.success {{ color: #1d6b2f; }}
aside {{ font-size: 0.9rem; color: #555; }}
</style>
</head>
<body>
<header>
<img src="{logo}" alt="" width="140">
<h3>{institution}</h3>
<h4>{title} Generator</h4>
</header>
<hr>
{main}
<hr>
<aside>
<ol>
<li>Enter your mat number or hospital number (newly admitted students only).</li>
<li>Click <strong>Generate Report</strong>, check your details, then download the PDF.</li>
</ol>
<p>Forging of your screening report will result in two semesters expulsion from the university.
For any questions or assistance, please contact the University's Clinic.</p>
</aside>
</body>
</html>
"#,
        institution = escape(&branding.institution),
        title = escape(&branding.title),
        logo = LOGO_ROUTE,
        main = main,
    )
}

/// Landing page with the identifier form. `error` is shown inline above the
/// form and `identifier` refills the input after a failed attempt.
pub fn render_index(branding: &ReportBranding, error: Option<&str>, identifier: &str) -> String {
    let notice = error
        .map(|message| format!(r#"<p class="error" role="alert">{}</p>"#, escape(message)))
        .unwrap_or_default();

    shell(branding, &format!("{notice}\n{}", form(identifier)))
}

/// Confirmation page shown after a successful form submission: the student's
/// details plus a link that saves the already generated document.
pub fn render_result(branding: &ReportBranding, report: &GeneratedReport) -> String {
    let details: String = detail_lines(&report.record)
        .iter()
        .map(|line| format!("<li>{}</li>\n", escape(line)))
        .collect();

    let main = format!(
        r#"{form}
<hr>
<p class="success" role="status">Report generated successfully!</p>
<h4>Student Details</h4>
<ul>
{details}</ul>
<p><a href="data:{mime};base64,{data}" download="{file_name}">Download Report</a></p>"#,
        form = form(&report.record.identifier),
        details = details,
        mime = report.content_type,
        data = BASE64.encode(&report.bytes),
        file_name = escape(&report.file_name),
    );
    shell(branding, &main)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::StudentRecord;

    fn report() -> GeneratedReport {
        GeneratedReport {
            record: StudentRecord {
                identifier: "S1001".to_string(),
                full_name: "Jane <Doe>".to_string(),
                department: "CS".to_string(),
                result: "Negative".to_string(),
            },
            file_name: "S1001_report.pdf".to_string(),
            content_type: mime::APPLICATION_PDF,
            bytes: b"%PDF-1.3 test".to_vec(),
        }
    }

    #[test]
    fn page_carries_branding_and_form() {
        let html = render_index(&ReportBranding::default(), None, "");
        assert!(html.contains("Bells University of Technology, Ota"));
        assert!(html.contains(r#"action="/reports""#));
        assert!(html.contains(r#"name="identifier""#));
        assert!(!html.contains("role=\"alert\""));
    }

    #[test]
    fn inline_error_and_identifier_are_escaped() {
        let html = render_index(
            &ReportBranding::default(),
            Some("Matric number not found or medical test not completed."),
            "<script>\"x\"",
        );
        assert!(html.contains("Matric number not found"));
        assert!(html.contains("&lt;script&gt;&quot;x&quot;"));
        assert!(!html.contains("<script>"));
    }

    #[test]
    fn result_page_lists_details_and_embeds_the_document() {
        let report = report();
        let html = render_result(&ReportBranding::default(), &report);

        assert!(html.contains("Report generated successfully!"));
        assert!(html.contains("<li>Matric Number/Hospital Number: S1001</li>"));
        assert!(html.contains("<li>Full Name: Jane &lt;Doe&gt;</li>"));
        assert!(html.contains("<li>Substance abuse screening: Negative</li>"));
        assert!(html.contains(r#"download="S1001_report.pdf""#));

        let encoded = format!("data:application/pdf;base64,{}", BASE64.encode(&report.bytes));
        assert!(html.contains(&encoded));
        assert!(html.contains(r#"value="S1001""#));
    }
}
