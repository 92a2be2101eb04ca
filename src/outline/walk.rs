use super::node::{Element, MarkupNode};
use super::RenderResult;

const MAX_HEADING_LEVELS: usize = 6;
const HEADING_COLOR: &str = "#00875a";
const TABLE_MIN_WIDTH: &str = "100px";
const IMAGE_MAX_WIDTH: &str = "100%";
const TABLE_WRAP_CLASS: &str = "table-wrap";
/// Bold paragraphs shorter than this (in UTF-16 code units) read as labels and
/// get tight spacing.
const LABEL_MAX_CHARS: usize = 50;

const HEADER_CELL_STYLE: &str = "padding: 12px 8px; background: #f8f9fa; border: 1px solid #ddd; font-weight: bold; text-align: left;";
const BODY_CELL_STYLE: &str = "padding: 10px 8px; border: 1px solid #ddd; vertical-align: top;";

/// Per-document heading numbering, one counter per level 1..=6.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeadingCounters([u32; MAX_HEADING_LEVELS]);

impl HeadingCounters {
    /// Count a heading at `level` (1-based) and return its number, e.g. `1-2`.
    /// Deeper levels restart from zero.
    pub fn advance(&mut self, level: usize) -> String {
        self.0[level - 1] += 1;
        self.0[level..].fill(0);
        self.0[..level]
            .iter()
            .filter(|&&c| c > 0)
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("-")
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn heading_level(tag: &str) -> Option<usize> {
    let level: usize = tag.strip_prefix('h')?.parse().ok()?;
    (1..=MAX_HEADING_LEVELS).contains(&level).then_some(level)
}

pub fn render_node(node: &MarkupNode, depth: usize, counters: &mut HeadingCounters) -> RenderResult {
    let el = match node {
        MarkupNode::Text(text) => return render_text(text, depth),
        MarkupNode::Element(el) => el,
    };

    if let Some(level) = heading_level(&el.tag) {
        return render_heading(el, level, counters);
    }

    match el.tag.as_str() {
        "p" => render_paragraph(el, depth),
        "ul" | "ol" => render_list(el, depth),
        "div" if el.has_class(TABLE_WRAP_CLASS) => el
            .first_descendant("table")
            .map(|table| render_table(table, depth))
            .unwrap_or_default(),
        "table" => render_table(el, depth),
        "img" => render_image(el),
        _ => {
            let mut out = RenderResult::default();
            for child in &el.children {
                out.push(render_node(child, depth, counters));
            }
            out
        }
    }
}

fn render_text(raw: &str, depth: usize) -> RenderResult {
    let text = raw.trim();
    if text.is_empty() {
        return RenderResult::default();
    }
    RenderResult {
        html: text.to_string(),
        text: format!("{}{}\n", indent(depth), text),
    }
}

fn render_heading(el: &Element, level: usize, counters: &mut HeadingCounters) -> RenderResult {
    let content = el.text_content();
    let text = content.trim();
    // an empty heading leaves the numbering untouched
    if text.is_empty() {
        return RenderResult::default();
    }
    let number = counters.advance(level);
    RenderResult {
        html: format!(
            r#"<h{level} style="color: {HEADING_COLOR}; font-weight: bold; margin: 15px 0 10px 0;">{number}. {text}</h{level}>"#
        ),
        text: format!("\n{number}. {text}\n\n"),
    }
}

fn render_paragraph(el: &Element, depth: usize) -> RenderResult {
    let content = el.text_content();
    let text = content.trim();
    if text.is_empty() {
        return RenderResult::default();
    }
    let html = format!(
        r#"<p style="margin: 8px 0; line-height: 1.5;">{}</p>"#,
        el.inner_markup()
    );
    let is_bold = el.first_descendant("b").is_some() || el.first_descendant("strong").is_some();
    let text = if is_bold && text.encode_utf16().count() < LABEL_MAX_CHARS {
        format!("\n{}{}\n", indent(depth), text)
    } else {
        format!("{}{}\n\n", indent(depth), text)
    };
    RenderResult { html, text }
}

/// Ordinals follow the item's position among all direct `li` children, so an
/// empty item still uses up its number. Items of nested lists are printed one
/// level deeper with the owning item's prefix.
fn render_list(el: &Element, depth: usize) -> RenderResult {
    let ordered = el.tag == "ol";
    let pad = indent(depth);
    let mut html = format!(r#"<{} style="margin: 10px 0; padding-left: 20px;">"#, el.tag);
    let mut text = String::new();

    for (index, item) in el.child_elements(&["li"]).enumerate() {
        let content = item.text_content();
        let item_text = content.trim();
        if item_text.is_empty() {
            continue;
        }
        html.push_str(&format!(
            r#"<li style="margin: 5px 0; line-height: 1.4;">{}</li>"#,
            item.inner_markup()
        ));

        let prefix = if ordered {
            format!("{}. ", index + 1)
        } else {
            "• ".to_string()
        };
        text.push_str(&format!("{pad}{prefix}{item_text}\n"));

        for nested in item.descendants(&["ul", "ol"]) {
            for nested_item in nested.child_elements(&["li"]) {
                let nested_content = nested_item.text_content();
                let nested_text = nested_content.trim();
                if !nested_text.is_empty() {
                    text.push_str(&format!("  {pad}  {prefix}{nested_text}\n"));
                }
            }
        }
    }

    html.push_str(&format!("</{}>", el.tag));
    text.push('\n');
    RenderResult { html, text }
}

/// Every row is rendered, nested tables included. Cells in the first row are
/// always styled as headers.
fn render_table(el: &Element, depth: usize) -> RenderResult {
    let pad = indent(depth);
    let mut html = String::from(
        r#"<div class="table-container" style="overflow-x: auto; margin: 15px 0; border: 1px solid #ddd; border-radius: 6px;"><table style="min-width: 100%; border-collapse: collapse; font-size: 13px; background: white; white-space: nowrap;">"#,
    );
    let mut text = String::from("\n");

    for (row_index, row) in el.descendants(&["tr"]).into_iter().enumerate() {
        let cells = row.descendants(&["td", "th"]);
        if cells.is_empty() {
            continue;
        }

        html.push_str("<tr>");
        let mut row_text = pad.clone();
        for (cell_index, cell) in cells.into_iter().enumerate() {
            let is_header = cell.tag == "th" || row_index == 0;
            let (tag, style) = if is_header {
                ("th", HEADER_CELL_STYLE)
            } else {
                ("td", BODY_CELL_STYLE)
            };
            html.push_str(&format!(
                r#"<{tag} style="{style} min-width: {TABLE_MIN_WIDTH};">{}</{tag}>"#,
                cell.inner_markup()
            ));

            if cell_index > 0 {
                row_text.push_str(" | ");
            }
            let cell_text = cell.text_content();
            row_text.push_str(&cell_text.split_whitespace().collect::<Vec<_>>().join(" "));
        }
        html.push_str("</tr>");
        text.push_str(&row_text);
        text.push('\n');
    }

    html.push_str("</table></div>");
    text.push('\n');
    RenderResult { html, text }
}

fn render_image(el: &Element) -> RenderResult {
    let src = el.attr("src").unwrap_or_default();
    let alt = el.attr("alt").filter(|a| !a.is_empty()).unwrap_or("Image");
    RenderResult {
        html: format!(
            r#"<div style="margin: 10px 0;"><img src="{}" alt="{}" style="max-width: {IMAGE_MAX_WIDTH}; height: auto; border: 1px solid #ddd; border-radius: 4px;"/></div>"#,
            html_escape::encode_double_quoted_attribute(src),
            html_escape::encode_double_quoted_attribute(alt),
        ),
        text: format!("[Image: {alt}]\n"),
    }
}
