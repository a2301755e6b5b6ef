//! Reader for LQMG XML configuration documents.
//!
//! ```xml
//! <lqmg defaultPackage="com.acme" defaultSchema="HR" defaultUseSchema="true">
//!   <entities>
//!     <entity name="EMPLOYEE" package="com.acme.hr"/>
//!     <namingRule regex="AUDIT_.*" package="com.acme.audit" useSchema="false"/>
//!   </entities>
//! </lqmg>
//! ```
//!
//! The root element name and namespace prefixes are not checked; the reader
//! works on local names only.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;

use crate::document::{Document, EntityDefinition, Entry, NamingRuleDefinition, Settings};
use crate::error::{ConfigError, Result};

const ENTITIES: &str = "entities";
const ENTITY: &str = "entity";
const NAMING_RULE: &str = "namingRule";

/// Parse a configuration document. `resource` is only used in error messages.
pub fn parse_document(resource: &str, bytes: &[u8]) -> Result<Document> {
    let text = std::str::from_utf8(bytes)
        .map_err(|e| ConfigError::malformed(resource, format!("invalid UTF-8: {}", e)))?;

    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut document: Option<Document> = None;
    let mut open: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(element)) => {
                let name = open_element(resource, &element, &open, &mut document)?;
                open.push(name);
            }
            Ok(Event::Empty(element)) => {
                open_element(resource, &element, &open, &mut document)?;
            }
            Ok(Event::End(_)) => {
                open.pop();
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => {
                return Err(ConfigError::malformed(
                    resource,
                    format!("XML error at byte {}: {}", reader.error_position(), e),
                ))
            }
        }
    }

    if let Some(unclosed) = open.last() {
        return Err(ConfigError::malformed(
            resource,
            format!("unexpected end of document inside <{}>", unclosed),
        ));
    }

    document.ok_or_else(|| ConfigError::malformed(resource, "document has no root element"))
}

/// Handle an opening (or empty) element and return its local name.
fn open_element(
    resource: &str,
    element: &BytesStart<'_>,
    open: &[String],
    document: &mut Option<Document>,
) -> Result<String> {
    let name = String::from_utf8_lossy(element.local_name().as_ref()).into_owned();
    let mut attributes = read_attributes(resource, element)?;

    match (open.len(), open.last().map(String::as_str)) {
        (0, _) => {
            if document.is_some() {
                return Err(ConfigError::malformed(
                    resource,
                    format!("second root element <{}>", name),
                ));
            }
            let defaults = Settings {
                package: attributes.remove("defaultPackage"),
                schema: attributes.remove("defaultSchema"),
                use_schema: parse_flag(resource, attributes.remove("defaultUseSchema"))?,
            };
            *document = Some(Document {
                defaults,
                entries: Vec::new(),
            });
        }
        (1, _) if name == ENTITIES => {}
        (2, Some(ENTITIES)) => {
            let entry = read_entry(resource, &name, attributes)?;
            if let Some(document) = document.as_mut() {
                document.entries.push(entry);
            }
        }
        _ => {
            return Err(ConfigError::malformed(
                resource,
                format!("unexpected element <{}>", name),
            ))
        }
    }

    Ok(name)
}

fn read_entry(
    resource: &str,
    element: &str,
    mut attributes: HashMap<String, String>,
) -> Result<Entry> {
    let settings = Settings {
        package: attributes.remove("package"),
        schema: attributes.remove("schema"),
        use_schema: parse_flag(resource, attributes.remove("useSchema"))?,
    };

    match element {
        ENTITY => {
            let name = required(resource, element, "name", &mut attributes)?;
            Ok(Entry::Entity(EntityDefinition { name, settings }))
        }
        NAMING_RULE => {
            let regex = required(resource, element, "regex", &mut attributes)?;
            Ok(Entry::NamingRule(NamingRuleDefinition { regex, settings }))
        }
        other => Err(ConfigError::malformed(
            resource,
            format!("unknown entry element <{}>", other),
        )),
    }
}

fn required(
    resource: &str,
    element: &str,
    attribute: &str,
    attributes: &mut HashMap<String, String>,
) -> Result<String> {
    attributes.remove(attribute).ok_or_else(|| {
        ConfigError::malformed(
            resource,
            format!("<{}> is missing the '{}' attribute", element, attribute),
        )
    })
}

fn read_attributes(resource: &str, element: &BytesStart<'_>) -> Result<HashMap<String, String>> {
    let mut attributes = HashMap::new();
    for attribute in element.attributes() {
        let attribute = attribute.map_err(|e| ConfigError::malformed(resource, e.to_string()))?;
        if attribute.key.as_namespace_binding().is_some() {
            continue;
        }
        let key = String::from_utf8_lossy(attribute.key.local_name().as_ref()).into_owned();
        let value = attribute
            .unescape_value()
            .map_err(|e| ConfigError::malformed(resource, e.to_string()))?
            .into_owned();
        attributes.insert(key, value);
    }
    Ok(attributes)
}

/// xsd:boolean lexical forms.
fn parse_flag(resource: &str, value: Option<String>) -> Result<Option<bool>> {
    match value.as_deref().map(str::trim) {
        None => Ok(None),
        Some("true") | Some("1") => Ok(Some(true)),
        Some("false") | Some("0") => Ok(Some(false)),
        Some(other) => Err(ConfigError::malformed(
            resource,
            format!("'{}' is not a boolean", other),
        )),
    }
}
