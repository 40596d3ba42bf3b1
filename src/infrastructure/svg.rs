//! In-memory SVG document used as the rendering surface.

use std::fmt::{self, Display, Write};

use crate::infrastructure::traits::Surface;

const SVG_NS: &str = "http://www.w3.org/2000/svg";

/// One SVG element with ordered attributes, optional text and children.
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    tag: String,
    attrs: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(tag: &str) -> Self {
        Self {
            tag: tag.to_string(),
            attrs: Vec::new(),
            text: None,
            children: Vec::new(),
        }
    }

    /// Set an attribute, replacing an earlier value of the same name.
    pub fn attr(mut self, name: &str, value: impl Display) -> Self {
        let value = value.to_string();
        match self.attrs.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.attrs.push((name.to_string(), value)),
        }
        self
    }

    pub fn text(mut self, text: impl Into<String>) -> Self {
        self.text = Some(text.into());
        self
    }

    pub fn child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn push(&mut self, child: Element) {
        self.children.push(child);
    }

    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn get_attr(&self, name: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    pub fn text_content(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn has_class(&self, class: &str) -> bool {
        self.get_attr("class")
            .map(|c| c.split_whitespace().any(|c| c == class))
            .unwrap_or(false)
    }

    /// First direct child with the given tag.
    pub fn find_child(&self, tag: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.tag == tag)
    }

    fn collect<'a>(&'a self, tag: &str, found: &mut Vec<&'a Element>) {
        if self.tag == tag {
            found.push(self);
        }
        for child in &self.children {
            child.collect(tag, found);
        }
    }

    fn write_svg(&self, out: &mut String, indent: usize) -> fmt::Result {
        let pad = "  ".repeat(indent);
        write!(out, "{}<{}", pad, self.tag)?;
        for (name, value) in &self.attrs {
            write!(out, r#" {}="{}""#, name, xml_escape(value))?;
        }
        match (&self.text, self.children.is_empty()) {
            (None, true) => writeln!(out, "/>"),
            (Some(text), true) => writeln!(out, ">{}</{}>", xml_escape(text), self.tag),
            (text, false) => {
                writeln!(out, ">")?;
                if let Some(text) = text {
                    writeln!(out, "{}  {}", pad, xml_escape(text))?;
                }
                for child in &self.children {
                    child.write_svg(out, indent + 1)?;
                }
                writeln!(out, "{}</{}>", pad, self.tag)
            }
        }
    }
}

/// SVG drawing held in memory until serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SvgCanvas {
    width: f64,
    height: f64,
    elements: Vec<Element>,
}

impl SvgCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn width(&self) -> f64 {
        self.width
    }

    pub fn height(&self) -> f64 {
        self.height
    }

    /// Top-level elements.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// All elements with the given tag, at any depth, in document order.
    pub fn select_all(&self, tag: &str) -> Vec<&Element> {
        let mut found = Vec::new();
        for element in &self.elements {
            element.collect(tag, &mut found);
        }
        found
    }

    /// Serialize to a standalone SVG document.
    pub fn to_svg(&self) -> String {
        let mut out = String::new();
        // Writing into a String cannot fail
        let _ = self.write_document(&mut out);
        out
    }

    fn write_document(&self, out: &mut String) -> fmt::Result {
        writeln!(
            out,
            r#"<svg xmlns="{}" width="{}" height="{}" viewBox="0 0 {} {}">"#,
            SVG_NS, self.width, self.height, self.width, self.height
        )?;
        for element in &self.elements {
            element.write_svg(out, 1)?;
        }
        writeln!(out, "</svg>")
    }
}

impl Surface for SvgCanvas {
    fn clear(&mut self) {
        self.elements.clear();
    }

    fn set_size(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
    }

    fn append(&mut self, element: Element) {
        self.elements.push(element);
    }
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
