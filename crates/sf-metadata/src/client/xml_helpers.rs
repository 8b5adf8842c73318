use busbar_sf_client::security::xml;

use crate::error::{Error, ErrorKind, Result};
use crate::list::MetadataComponent;
use crate::retrieve::{RetrieveMessage, RetrieveResult, RetrieveStatus};
use crate::types::SoapFault;

impl super::MetadataClient {
    /// Parse a SOAP fault from the response.
    pub(crate) fn parse_soap_fault(&self, xml: &str) -> Option<SoapFault> {
        if !xml.contains("faultcode") {
            return None;
        }

        let fault_code = self.extract_element(xml, "faultcode")?;
        let fault_string = self
            .extract_element(xml, "faultstring")
            .unwrap_or_else(|| "Unknown error".to_string());

        Some(SoapFault {
            fault_code,
            fault_string,
        })
    }

    /// Extract a simple element value from XML, unescaping entities.
    pub(crate) fn extract_element(&self, xml: &str, tag: &str) -> Option<String> {
        const PREFIXES: [&str; 4] = ["", "sf:", "met:", "tns:"];

        for prefix in PREFIXES {
            let start = format!("<{}{}>", prefix, tag);
            if let Some(start_idx) = xml.find(&start) {
                let search_from = &xml[start_idx + start.len()..];
                let end_idx = PREFIXES
                    .iter()
                    .filter_map(|p| search_from.find(&format!("</{}{}>", p, tag)))
                    .min();
                if let Some(end_idx) = end_idx {
                    return Some(xml::unescape(&search_from[..end_idx]));
                }
            }
        }
        None
    }

    /// Split out every `<tag>...</tag>` block, tags included.
    fn blocks<'a>(&self, xml: &'a str, tag: &str) -> Vec<&'a str> {
        let start_tag = format!("<{}>", tag);
        let end_tag = format!("</{}>", tag);
        let mut blocks = Vec::new();
        let mut search_from = xml;

        while let Some(start) = search_from.find(&start_tag) {
            let remaining = &search_from[start..];
            match remaining.find(&end_tag) {
                Some(end) => {
                    blocks.push(&remaining[..end + end_tag.len()]);
                    search_from = &remaining[end + end_tag.len()..];
                }
                None => break,
            }
        }
        blocks
    }

    /// Split `xml` into the text outside any `<tag>...</tag>` block of `tags`
    /// and the blocks themselves, tagged with their index in `tags`.
    ///
    /// One forward pass: retrieve responses carry thousands of blocks next to
    /// a zipFile of many megabytes.
    fn split_blocks<'a>(&self, xml: &'a str, tags: &[&str]) -> (String, Vec<(usize, &'a str)>) {
        let mut top = String::with_capacity(xml.len());
        let mut found = Vec::new();
        let mut rest = xml;

        while let Some(open) = rest.find('<') {
            let candidate = &rest[open..];
            let block = tags.iter().enumerate().find_map(|(index, tag)| {
                let body = candidate[1..].strip_prefix(tag)?.strip_prefix('>')?;
                let end_tag = format!("</{}>", tag);
                let end = body.find(&end_tag)?;
                Some((index, tag.len() + 2 + end + end_tag.len()))
            });

            match block {
                Some((index, len)) => {
                    top.push_str(&rest[..open]);
                    found.push((index, &candidate[..len]));
                    rest = &candidate[len..];
                }
                None => {
                    top.push_str(&rest[..=open]);
                    rest = &rest[open + 1..];
                }
            }
        }
        top.push_str(rest);

        (top, found)
    }

    /// Parse retrieve result from XML.
    pub(crate) fn parse_retrieve_result(&self, xml: &str) -> Result<RetrieveResult> {
        // fileProperties and messages carry their own <id>/<fileName> children
        let (top, blocks) = self.split_blocks(xml, &["fileProperties", "messages"]);
        let top = top.as_str();

        let id = self
            .extract_element(top, "id")
            .ok_or_else(|| Error::new(ErrorKind::InvalidResponse("Missing id".to_string())))?;

        let done = self
            .extract_element(top, "done")
            .map(|s| s == "true")
            .unwrap_or(false);

        let status = self
            .extract_element(top, "status")
            .and_then(|s| s.parse().ok())
            .unwrap_or(RetrieveStatus::Pending);

        let success = self
            .extract_element(top, "success")
            .map(|s| s == "true")
            .unwrap_or(false);

        let messages = blocks
            .into_iter()
            .filter(|(index, _)| *index == 1)
            .filter_map(|(_, block)| self.parse_retrieve_message(block))
            .collect();

        Ok(RetrieveResult {
            id,
            done,
            status,
            success,
            error_message: self.extract_element(top, "errorMessage"),
            error_status_code: self.extract_element(top, "errorStatusCode"),
            zip_file: self.extract_element(top, "zipFile"),
            messages,
        })
    }

    fn parse_retrieve_message(&self, block: &str) -> Option<RetrieveMessage> {
        Some(RetrieveMessage {
            file_name: self.extract_element(block, "fileName")?,
            problem: self.extract_element(block, "problem")?,
        })
    }

    /// Parse list metadata result.
    pub(crate) fn parse_list_metadata_result(
        &self,
        xml: &str,
        metadata_type: &str,
    ) -> Result<Vec<MetadataComponent>> {
        Ok(self
            .blocks(xml, "result")
            .into_iter()
            .filter_map(|block| {
                Some(MetadataComponent {
                    full_name: self.extract_element(block, "fullName")?,
                    file_name: self.extract_element(block, "fileName"),
                    id: self.extract_element(block, "id"),
                    namespace_prefix: self.extract_element(block, "namespacePrefix"),
                    metadata_type: self
                        .extract_element(block, "type")
                        .unwrap_or_else(|| metadata_type.to_string()),
                    last_modified_date: self.extract_element(block, "lastModifiedDate"),
                })
            })
            .collect())
    }
}
