use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use super::DecodeError;
use crate::model::IsolationWindow;

const TARGET_MZ: &str = "MS:1000827";
const LOWER_OFFSET: &str = "MS:1000828";
const UPPER_OFFSET: &str = "MS:1000829";

/// Read the isolation window of a raw `precursorList`
///
/// The window is `[target - lower offset, target + upper offset]`; missing
/// offsets count as zero. Without a target m/z there is no window. Only the
/// first value of each cvParam is used.
pub fn decode_isolation_window(xml: &str) -> Result<Option<IsolationWindow>, DecodeError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut target = None;
    let mut lower = None;
    let mut upper = None;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e) | Event::Empty(e)) if e.name().as_ref() == b"cvParam" => {
                let Some(accession) = get_attribute(&e, "accession")? else {
                    continue;
                };
                let slot = match accession.as_str() {
                    TARGET_MZ => &mut target,
                    LOWER_OFFSET => &mut lower,
                    UPPER_OFFSET => &mut upper,
                    _ => continue,
                };
                if slot.is_none() {
                    *slot = get_attribute(&e, "value")?.and_then(|v| v.trim().parse::<f64>().ok());
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(DecodeError::InvalidXml(e.to_string())),
        }
    }

    Ok(target.map(|target| IsolationWindow {
        min_mz: target - lower.unwrap_or(0.0),
        max_mz: target + upper.unwrap_or(0.0),
    }))
}

fn get_attribute(e: &BytesStart, name: &str) -> Result<Option<String>, DecodeError> {
    for attr in e.attributes() {
        let attr = attr.map_err(|e| DecodeError::InvalidXml(e.to_string()))?;
        if attr.key.as_ref() == name.as_bytes() {
            let value = std::str::from_utf8(&attr.value)
                .map_err(|e| DecodeError::InvalidXml(e.to_string()))?;
            return Ok(Some(value.to_string()));
        }
    }
    Ok(None)
}
