use crate::models::{FORM_FIELDS, HEADER};

pub const THANKS_PAGE: &str = r#"
    <h1 style="text-align:center; color:green;">&#9989; Thank you for your payment!</h1>
    <p style="text-align:center;">Your WhatsApp message will be delivered shortly.</p>
    <p style="text-align:center;"><a href="/">Go back to form</a></p>
"#;

pub const UPLOAD_OK: &str = r#"
    <h2>&#9989; File uploaded successfully!</h2>
    <p><a href="/">Go back to form</a></p>
"#;

const STYLE: &str = "
    body { font-family: Arial; padding: 20px; background: #f9f9f9; }
    h2 { text-align: center; }
    table { width: 100%; border-collapse: collapse; margin-top: 20px; }
    th, td { border: 1px solid #ccc; padding: 8px; text-align: left; }
    th { background-color: #f2f2f2; }
    tr:nth-child(even) { background-color: #f9f9f9; }
    a { display: inline-block; margin-top: 20px; text-decoration: none; }
    label { display: block; margin-top: 8px; }
";

pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
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

fn input_type(field: &str) -> &'static str {
    match field {
        "dob" | "admission_date" | "payment_date" | "due_date" => "date",
        "parent_email" => "email",
        "parent_mobile" => "tel",
        _ => "text",
    }
}

pub fn form_page(school_name: &str) -> String {
    let mut inputs = String::new();
    for (field, label) in FORM_FIELDS.iter().zip(HEADER) {
        inputs.push_str(&format!(
            "<label>{label}<br><input type=\"{}\" name=\"{field}\"></label>\n",
            input_type(field),
            label = escape(label),
        ));
    }
    format!(
        "<html>
<head><title>Fee Collection</title><style>{STYLE}</style></head>
<body>
<h2>{school} Fee Collection</h2>
<form method=\"post\" action=\"/upload_excel\" enctype=\"multipart/form-data\">
<label>Fee register (.xlsx)<br><input type=\"file\" name=\"excel_file\" accept=\".xlsx,.xlsm\"></label>
<button type=\"submit\">Upload</button>
</form>
<form method=\"post\" action=\"/\">
{inputs}<button type=\"submit\">Submit</button>
</form>
<a href=\"/view_excel\">View uploaded sheet</a>
</body>
</html>
",
        school = escape(school_name),
    )
}

/// Render store rows as a table, treating the first row as the header.
pub fn preview(rows: &[Vec<String>]) -> String {
    let mut table = String::from("<table class=\"table table-striped\">\n");
    if let Some((header, body)) = rows.split_first() {
        table.push_str("<thead><tr>");
        for cell in header {
            table.push_str(&format!("<th>{}</th>", escape(cell)));
        }
        table.push_str("</tr></thead>\n<tbody>\n");
        for row in body {
            table.push_str("<tr>");
            for i in 0..header.len().max(row.len()) {
                let cell = row.get(i).map(String::as_str).unwrap_or_default();
                table.push_str(&format!("<td>{}</td>", escape(cell)));
            }
            table.push_str("</tr>\n");
        }
        table.push_str("</tbody>\n");
    }
    table.push_str("</table>");

    format!(
        "<html>
<head><title>Excel Preview</title><style>{STYLE}</style></head>
<body>
<h2>Uploaded Excel Sheet Preview</h2>
{table}
<br><br><a href=\"/\">Back to Form</a>
</body>
</html>
"
    )
}
