//! Generic XML element tree backed by quick-xml.
//!
//! Elements the engine does not interpret are carried as [`XmlNode`]s so a
//! read/modify/write cycle keeps them intact. Comments and processing
//! instructions are dropped on read.

use quick_xml::Reader;
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::PomError;

/// One XML element with its attributes, text content and child elements.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct XmlNode {
  pub name: String,
  pub attributes: Vec<(String, String)>,
  pub text: Option<String>,
  pub children: Vec<XmlNode>,
}

impl XmlNode {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      ..Default::default()
    }
  }

  /// A leaf element holding only text.
  pub fn leaf(name: impl Into<String>, text: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      text: Some(text.into()),
      ..Default::default()
    }
  }

  pub fn with_child(mut self, child: XmlNode) -> Self {
    self.children.push(child);
    self
  }

  /// Append a leaf child when `value` is present.
  pub fn push_leaf(&mut self, name: &str, value: Option<&str>) {
    if let Some(value) = value {
      self.children.push(XmlNode::leaf(name, value));
    }
  }

  pub fn child(&self, name: &str) -> Option<&XmlNode> {
    self.children.iter().find(|c| c.name == name)
  }

  pub fn child_text(&self, name: &str) -> Option<&str> {
    self.child(name).and_then(|c| c.text.as_deref())
  }

  pub fn attribute(&self, name: &str) -> Option<&str> {
    self.attributes.iter().find(|(k, _)| k == name).map(|(_, v)| v.as_str())
  }

  pub fn set_attribute(&mut self, name: &str, value: &str) {
    match self.attributes.iter_mut().find(|(k, _)| k == name) {
      Some((_, v)) => *v = value.to_string(),
      None => self.attributes.push((name.to_string(), value.to_string())),
    }
  }

  /// True when the element carries neither text nor children.
  pub fn is_empty(&self) -> bool {
    self.children.is_empty() && self.text.as_deref().is_none_or(|t| t.trim().is_empty())
  }

  /// Parse a document and return its root element.
  pub fn parse(xml: &str) -> Result<XmlNode, PomError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut stack: Vec<XmlNode> = Vec::new();
    let mut root: Option<XmlNode> = None;

    loop {
      let event = reader.read_event().map_err(|e| PomError::Xml {
        position: reader.error_position(),
        message: e.to_string(),
      })?;

      match event {
        Event::Start(start) => stack.push(node_from_start(&start)?),
        Event::Empty(start) => {
          let node = node_from_start(&start)?;
          attach(&mut stack, &mut root, node)?;
        }
        Event::End(_) => {
          let node = stack.pop().ok_or_else(|| PomError::Xml {
            position: reader.buffer_position(),
            message: "unbalanced end tag".to_string(),
          })?;
          attach(&mut stack, &mut root, node)?;
        }
        Event::Text(text) => {
          let text = text.unescape().map_err(|e| PomError::Xml {
            position: reader.buffer_position(),
            message: e.to_string(),
          })?;
          append_text(&mut stack, &text);
        }
        Event::CData(data) => {
          let text = String::from_utf8_lossy(&data.into_inner()).into_owned();
          append_text(&mut stack, &text);
        }
        Event::Eof => break,
        _ => {}
      }
    }

    if !stack.is_empty() {
      return Err(PomError::Xml {
        position: reader.buffer_position(),
        message: format!("unclosed element <{}>", stack[stack.len() - 1].name),
      });
    }

    root.ok_or(PomError::EmptyDocument)
  }

  /// Serialize this element as a complete, indented document.
  ///
  /// `comment` is written between the XML declaration and the root element.
  pub fn to_document(&self, comment: Option<&str>) -> Result<String, PomError> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    writer
      .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
      .map_err(serialize_err)?;
    if let Some(comment) = comment {
      writer
        .write_event(Event::Comment(BytesText::new(&format!(" {} ", comment))))
        .map_err(serialize_err)?;
    }
    write_node(&mut writer, self)?;

    let mut out = String::from_utf8(writer.into_inner()).map_err(serialize_err)?;
    out.push('\n');
    Ok(out)
  }
}

fn serialize_err(e: impl std::fmt::Display) -> PomError {
  PomError::Serialize(e.to_string())
}

fn node_from_start(start: &BytesStart<'_>) -> Result<XmlNode, PomError> {
  let name = String::from_utf8_lossy(start.name().as_ref()).into_owned();
  let mut node = XmlNode::new(name);
  for attr in start.attributes() {
    let attr = attr.map_err(|e| PomError::Xml {
      position: 0,
      message: e.to_string(),
    })?;
    let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
    let value = attr
      .unescape_value()
      .map_err(|e| PomError::Xml {
        position: 0,
        message: e.to_string(),
      })?
      .into_owned();
    node.attributes.push((key, value));
  }
  Ok(node)
}

fn attach(stack: &mut [XmlNode], root: &mut Option<XmlNode>, node: XmlNode) -> Result<(), PomError> {
  match stack.last_mut() {
    Some(parent) => {
      parent.children.push(node);
      Ok(())
    }
    None if root.is_none() => {
      *root = Some(node);
      Ok(())
    }
    None => Err(PomError::Xml {
      position: 0,
      message: format!("multiple root elements (found <{}>)", node.name),
    }),
  }
}

fn append_text(stack: &mut [XmlNode], text: &str) {
  if let Some(top) = stack.last_mut() {
    top.text.get_or_insert_with(String::new).push_str(text);
  }
}

fn write_node(writer: &mut Writer<Vec<u8>>, node: &XmlNode) -> Result<(), PomError> {
  let mut start = BytesStart::new(node.name.as_str());
  for (key, value) in &node.attributes {
    start.push_attribute((key.as_str(), value.as_str()));
  }

  if node.children.is_empty() && node.text.is_none() {
    writer.write_event(Event::Empty(start)).map_err(serialize_err)?;
    return Ok(());
  }

  writer.write_event(Event::Start(start)).map_err(serialize_err)?;
  if let Some(text) = &node.text {
    writer
      .write_event(Event::Text(BytesText::new(text)))
      .map_err(serialize_err)?;
  }
  for child in &node.children {
    write_node(writer, child)?;
  }
  writer
    .write_event(Event::End(BytesEnd::new(node.name.as_str())))
    .map_err(serialize_err)?;
  Ok(())
}
