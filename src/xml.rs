//! A small element tree written out as indented XML.

use crate::{Error, Result};
use quick_xml::{
    events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event},
    Writer,
};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Element {
    name: String,
    attributes: Vec<(String, String)>,
    text: Option<String>,
    children: Vec<Element>,
}

impl Element {
    pub fn new(name: &str) -> Self {
        Self {
            name: String::from(name),
            ..Default::default()
        }
    }

    /// An element holding only text.
    pub fn leaf(name: &str, text: &str) -> Self {
        Self::new(name).with_text(text)
    }

    pub fn with_attr(mut self, key: &str, value: &str) -> Self {
        self.set_attr(key, value);
        self
    }

    pub fn with_text(mut self, text: &str) -> Self {
        self.text = Some(String::from(text));
        self
    }

    pub fn with_child(mut self, child: Element) -> Self {
        self.children.push(child);
        self
    }

    pub fn set_attr(&mut self, key: &str, value: &str) {
        match self.attributes.iter_mut().find(|(k, _)| k == key) {
            Some(attr) => attr.1 = String::from(value),
            None => self
                .attributes
                .push((String::from(key), String::from(value))),
        }
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = Some(String::from(text));
    }

    /// Appends `child` and returns it for further filling.
    pub fn push(&mut self, child: Element) -> &mut Element {
        self.children.push(child);
        let last = self.children.len() - 1;
        &mut self.children[last]
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn text(&self) -> Option<&str> {
        self.text.as_deref()
    }

    pub fn children(&self) -> &[Element] {
        &self.children
    }

    pub fn child(&self, name: &str) -> Option<&Element> {
        self.children.iter().find(|c| c.name == name)
    }

    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a Element> + 'a {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Follows a `/`-separated chain of first children.
    pub fn at(&self, path: &str) -> Option<&Element> {
        path.split('/')
            .try_fold(self, |element, name| element.child(name))
    }

    /// UTF-8 document with a declaration and four-space indentation.
    pub fn to_xml(&self) -> Result<String> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 4);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(|e| Error::Xml(e.to_string()))?;
        self.write(&mut writer)?;
        let mut text =
            String::from_utf8(writer.into_inner()).map_err(|e| Error::Xml(e.to_string()))?;
        text.push('\n');
        Ok(text)
    }

    fn write(&self, writer: &mut Writer<Vec<u8>>) -> Result<()> {
        let mut start = BytesStart::new(self.name.as_str());
        for (key, value) in &self.attributes {
            start.push_attribute((key.as_str(), value.as_str()));
        }
        if self.text.is_none() && self.children.is_empty() {
            return writer
                .write_event(Event::Empty(start))
                .map_err(|e| Error::Xml(e.to_string()));
        }
        writer
            .write_event(Event::Start(start))
            .map_err(|e| Error::Xml(e.to_string()))?;
        if let Some(text) = &self.text {
            writer
                .write_event(Event::Text(BytesText::new(text)))
                .map_err(|e| Error::Xml(e.to_string()))?;
        }
        for child in &self.children {
            child.write(writer)?;
        }
        writer
            .write_event(Event::End(BytesEnd::new(self.name.as_str())))
            .map_err(|e| Error::Xml(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tree() {
        let mut root = Element::new("mapping");
        root.push(Element::new("domain"))
            .push(Element::new("target_node"))
            .push(Element::leaf("type", "crm:E22"));
        assert_eq!(
            root.at("domain/target_node/type").and_then(Element::text),
            Some("crm:E22")
        );
        assert!(root.at("domain/source_node").is_none());
    }

    #[test]
    fn test_to_xml() {
        let doc = Element::new("x3ml")
            .with_child(
                Element::new("namespaces")
                    .with_child(Element::new("namespace").with_attr("prefix", "crm")),
            )
            .with_child(Element::leaf("note", "a < b"));
        let xml = doc.to_xml().unwrap();
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<x3ml>\n"));
        assert!(xml.contains("\n    <namespaces>\n        <namespace prefix=\"crm\"/>\n"));
        assert!(xml.contains("<note>a &lt; b</note>"));
        assert!(xml.ends_with("</x3ml>\n"));
    }
}
