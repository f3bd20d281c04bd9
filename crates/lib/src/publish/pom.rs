//! POM rendering.

use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};

use super::types::{PublicationDescriptor, PublishError};

const POM_NAMESPACE: &str = "http://maven.apache.org/POM/4.0.0";
const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";
const POM_SCHEMA_LOCATION: &str = "http://maven.apache.org/POM/4.0.0 https://maven.apache.org/xsd/maven-4.0.0.xsd";

struct PomWriter {
  writer: Writer<Vec<u8>>,
}

impl PomWriter {
  fn new() -> Self {
    Self {
      writer: Writer::new_with_indent(Vec::new(), b' ', 2),
    }
  }

  fn event(&mut self, event: Event<'_>) -> Result<(), PublishError> {
    self.writer.write_event(event).map_err(|e| PublishError::Xml(e.to_string()))
  }

  fn open(&mut self, tag: &str) -> Result<(), PublishError> {
    self.event(Event::Start(BytesStart::new(tag)))
  }

  fn close(&mut self, tag: &str) -> Result<(), PublishError> {
    self.event(Event::End(BytesEnd::new(tag)))
  }

  fn text(&mut self, tag: &str, value: &str) -> Result<(), PublishError> {
    self.open(tag)?;
    self.event(Event::Text(BytesText::new(value)))?;
    self.close(tag)
  }

  fn optional(&mut self, tag: &str, value: Option<&str>) -> Result<(), PublishError> {
    match value {
      Some(value) => self.text(tag, value),
      None => Ok(()),
    }
  }

  fn finish(self) -> Result<String, PublishError> {
    let mut bytes = self.writer.into_inner();
    bytes.push(b'\n');
    String::from_utf8(bytes).map_err(|e| PublishError::Xml(e.to_string()))
  }
}

/// Render a descriptor as a Maven POM document.
pub fn render_pom(descriptor: &PublicationDescriptor) -> Result<String, PublishError> {
  let meta = &descriptor.metadata;
  let mut pom = PomWriter::new();

  pom.event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
  pom.event(Event::Start(BytesStart::new("project").with_attributes([
    ("xmlns", POM_NAMESPACE),
    ("xmlns:xsi", XSI_NAMESPACE),
    ("xsi:schemaLocation", POM_SCHEMA_LOCATION),
  ])))?;

  pom.text("modelVersion", "4.0.0")?;
  pom.text("groupId", &descriptor.group_id)?;
  pom.text("artifactId", &descriptor.artifact_id)?;
  pom.text("version", &descriptor.version)?;
  pom.optional("name", meta.name.as_deref())?;
  pom.optional("description", meta.description.as_deref())?;
  pom.optional("url", meta.url.as_deref())?;

  if !meta.licenses.is_empty() {
    pom.open("licenses")?;
    for license in &meta.licenses {
      pom.open("license")?;
      pom.text("name", &license.name)?;
      pom.optional("url", license.url.as_deref())?;
      pom.close("license")?;
    }
    pom.close("licenses")?;
  }

  if !meta.developers.is_empty() {
    pom.open("developers")?;
    for dev in &meta.developers {
      pom.open("developer")?;
      pom.text("id", &dev.id)?;
      pom.optional("name", dev.name.as_deref())?;
      pom.optional("email", dev.email.as_deref())?;
      pom.close("developer")?;
    }
    pom.close("developers")?;
  }

  if let Some(scm) = &meta.scm {
    pom.open("scm")?;
    pom.optional("connection", scm.connection.as_deref())?;
    pom.optional("developerConnection", scm.developer_connection.as_deref())?;
    pom.optional("url", scm.url.as_deref())?;
    pom.close("scm")?;
  }

  if !meta.properties.is_empty() {
    pom.open("properties")?;
    for (name, value) in &meta.properties {
      pom.text(name, value)?;
    }
    pom.close("properties")?;
  }

  if !descriptor.dependencies.is_empty() {
    pom.open("dependencies")?;
    for dep in &descriptor.dependencies {
      pom.open("dependency")?;
      pom.text("groupId", &dep.group_id)?;
      pom.text("artifactId", &dep.artifact_id)?;
      pom.text("version", &dep.version)?;
      pom.text("scope", &dep.scope.to_string())?;
      pom.close("dependency")?;
    }
    pom.close("dependencies")?;
  }

  pom.close("project")?;
  pom.finish()
}
