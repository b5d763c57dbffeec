//! Small typed builder for self-contained receipt HTML.
//!
//! Text passed to the builder is always escaped; only `raw` and the style
//! sheet are emitted verbatim.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextDirection {
    Ltr,
    Rtl,
}

impl TextDirection {
    fn as_attr(self) -> &'static str {
        match self {
            Self::Ltr => "ltr",
            Self::Rtl => "rtl",
        }
    }
}

pub(crate) const BASE_CSS: &str = r#"body { font-family: "Segoe UI", Tahoma, "Noto Naskh Arabic", Arial, sans-serif; margin: 0; padding: 8px; background: #fff; color: #111; font-size: 11px; }
.line { display: flex; justify-content: space-between; gap: 8px; }
.line strong { font-size: 12px; }
.section { margin-top: 8px; border-top: 1px dashed #111; padding-top: 6px; }
.section h3 { margin: 0 0 4px 0; font-size: 11px; text-transform: uppercase; }
.note { color: #555; font-size: 9px; }
.alt { color: #444; font-size: 10px; }
.center { text-align: center; }
.badge { display: inline-block; border: 1px solid #111; border-radius: 999px; padding: 1px 8px; font-size: 10px; font-weight: bold; }
.qr { display: block; margin: 6px auto; }
"#;

pub fn esc(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

pub struct HtmlBuilder {
    title: String,
    lang: &'static str,
    dir: TextDirection,
    css: String,
    body: String,
}

impl HtmlBuilder {
    pub fn new(title: &str) -> Self {
        Self {
            title: title.to_string(),
            lang: "en",
            dir: TextDirection::Ltr,
            css: BASE_CSS.to_string(),
            body: String::with_capacity(2048),
        }
    }

    pub fn dir(mut self, dir: TextDirection) -> Self {
        self.dir = dir;
        self.lang = match dir {
            TextDirection::Ltr => "en",
            TextDirection::Rtl => "ar",
        };
        self
    }

    /// Extra CSS appended after the base sheet.
    pub fn style(mut self, css: &str) -> Self {
        self.css.push_str(css);
        self
    }

    pub fn raw(&mut self, html: &str) -> &mut Self {
        self.body.push_str(html);
        self
    }

    pub fn open_section(&mut self, class: &str, heading: Option<&str>) -> &mut Self {
        self.body.push_str(&format!("<div class=\"{}\">", esc(class)));
        if let Some(heading) = heading {
            self.body.push_str(&format!("<h3>{}</h3>", esc(heading)));
        }
        self
    }

    pub fn close_section(&mut self) -> &mut Self {
        self.body.push_str("</div>");
        self
    }

    pub fn line(&mut self, label: &str, value: &str) -> &mut Self {
        self.body.push_str(&format!(
            "<div class=\"line\"><span>{}</span><span>{}</span></div>",
            esc(label),
            esc(value)
        ));
        self
    }

    pub fn strong_line(&mut self, label: &str, value: &str) -> &mut Self {
        self.body.push_str(&format!(
            "<div class=\"line\"><strong>{}</strong><strong>{}</strong></div>",
            esc(label),
            esc(value)
        ));
        self
    }

    pub fn center(&mut self, text: &str) -> &mut Self {
        self.body
            .push_str(&format!("<div class=\"center\">{}</div>", esc(text)));
        self
    }

    pub fn center_strong(&mut self, text: &str) -> &mut Self {
        self.body.push_str(&format!(
            "<div class=\"center\"><strong>{}</strong></div>",
            esc(text)
        ));
        self
    }

    pub fn note(&mut self, text: &str) -> &mut Self {
        self.body
            .push_str(&format!("<div class=\"note\">{}</div>", esc(text)));
        self
    }

    pub fn alt(&mut self, text: &str) -> &mut Self {
        self.body
            .push_str(&format!("<div class=\"alt\">{}</div>", esc(text)));
        self
    }

    pub fn badge(&mut self, class: &str, text: &str) -> &mut Self {
        self.body.push_str(&format!(
            "<div class=\"center\"><span class=\"badge {}\">{}</span></div>",
            esc(class),
            esc(text)
        ));
        self
    }

    /// Inline image; `src` is expected to be a data URI.
    pub fn image(&mut self, class: &str, src: &str, alt: &str) -> &mut Self {
        self.body.push_str(&format!(
            "<img class=\"{}\" src=\"{}\" alt=\"{}\"/>",
            esc(class),
            esc(src),
            esc(alt)
        ));
        self
    }

    pub fn finish(self) -> String {
        format!(
            r#"<!DOCTYPE html>
<html lang="{}" dir="{}">
<head>
<meta charset="UTF-8"/>
<meta name="viewport" content="width=device-width, initial-scale=1.0"/>
<title>{}</title>
<style>
{}</style>
</head>
<body>{}</body>
</html>"#,
            self.lang,
            self.dir.as_attr(),
            esc(&self.title),
            self.css,
            self.body
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn esc_escapes_markup_and_quotes() {
        assert_eq!(
            esc(r#"<b>"Tom" & 'Jerry'</b>"#),
            "&lt;b&gt;&quot;Tom&quot; &amp; &#39;Jerry&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn builder_wraps_body_in_complete_document() {
        let mut doc = HtmlBuilder::new("Test <Doc>").dir(TextDirection::Rtl);
        doc.open_section("section", Some("Items"))
            .line("Latte", "15.00")
            .close_section();
        let html = doc.finish();
        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<html lang=\"ar\" dir=\"rtl\">"));
        assert!(html.contains("<title>Test &lt;Doc&gt;</title>"));
        assert!(html.contains("<h3>Items</h3>"));
        assert!(html.contains("<span>Latte</span><span>15.00</span>"));
        assert!(!html.contains("@import"));
    }
}
