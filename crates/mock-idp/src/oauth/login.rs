//! HTML login page for the authorization endpoint.

use super::authorize::SUBJECT_FIELD;

/// Render the login form.
///
/// Every received query parameter is echoed back as a hidden field so the
/// submission carries the original request. All values are HTML-escaped.
pub fn render_login_page(params: &[(String, String)]) -> String {
    let hidden_inputs: String = params
        .iter()
        .map(|(name, value)| {
            format!(
                "<input type=\"hidden\" name=\"{}\" value=\"{}\" />\n",
                html_escape(name),
                html_escape(value)
            )
        })
        .collect();

    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width,initial-scale=1">
<title>Mock Login</title>
</head>
<body>
<form method="post">
{hidden_inputs}<label for="{field}">sub</label>
<input type="text" name="{field}" id="{field}" maxlength="255" required />
<button type="submit">Submit</button>
</form>
</body>
</html>"#,
        hidden_inputs = hidden_inputs,
        field = SUBJECT_FIELD,
    )
}

/// Escape HTML special characters.
fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
