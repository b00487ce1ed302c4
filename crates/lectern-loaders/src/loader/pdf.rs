use std::collections::BTreeMap;
use std::path::Path;

use crate::{DEFAULT_MAX_FILE_SIZE, Document, DocumentError, DocumentLoader, DocumentMetadata};

const PDF_CONTENT_TYPE: &str = "application/pdf";

/// Keys owned by [`DocumentMetadata`] itself; Info entries with these names are dropped.
const RESERVED_KEYS: [&str; 5] = [
    "source",
    "content_type",
    "page",
    "page_label",
    "total_pages",
];

/// Nesting limit when walking the `/PageLabels` number tree.
const MAX_TREE_DEPTH: usize = 16;

/// Loads a PDF eagerly into one [`Document`] per page, in page order.
pub struct PdfLoader {
    pub max_file_size: u64,
}

impl Default for PdfLoader {
    fn default() -> Self {
        Self {
            max_file_size: DEFAULT_MAX_FILE_SIZE,
        }
    }
}

impl DocumentLoader for PdfLoader {
    fn load(&self, path: &Path) -> Result<Vec<Document>, DocumentError> {
        let path = super::checked_source(path, self.max_file_size)?;
        let bytes = std::fs::read(&path)?;

        let pdf_err = |message: String| DocumentError::Pdf {
            path: path.clone(),
            message,
        };

        let pdf = lopdf::Document::load_mem(&bytes).map_err(|e| pdf_err(e.to_string()))?;
        let info = info_entries(&pdf);

        let pages = pdf_extract::extract_text_from_mem_by_pages(&bytes)
            .map_err(|e| pdf_err(e.to_string()))?;
        let total_pages = pages.len();
        let labels = page_labels(&pdf, total_pages);
        let source = path.display().to_string();

        tracing::debug!(source = %source, pages = total_pages, "parsed PDF");

        Ok(pages
            .into_iter()
            .zip(labels)
            .enumerate()
            .map(|(index, (content, label))| {
                let mut metadata = DocumentMetadata::new(source.clone(), PDF_CONTENT_TYPE);
                metadata.page = Some(index);
                metadata.page_label = Some(label);
                metadata.total_pages = Some(total_pages);
                metadata.extra.clone_from(&info);
                Document { content, metadata }
            })
            .collect())
    }

    fn supported_extensions(&self) -> &[&str] {
        &["pdf"]
    }
}

/// String entries of the trailer's Info dictionary, keys lower-cased.
fn info_entries(pdf: &lopdf::Document) -> BTreeMap<String, String> {
    let mut entries = BTreeMap::new();
    let dict = match pdf.trailer.get(b"Info") {
        Ok(lopdf::Object::Reference(id)) => pdf.get_dictionary(*id).ok(),
        Ok(lopdf::Object::Dictionary(dict)) => Some(dict),
        _ => None,
    };
    let Some(dict) = dict else {
        return entries;
    };

    for (key, value) in dict.iter() {
        let lopdf::Object::String(bytes, _) = value else {
            continue;
        };
        let key = String::from_utf8_lossy(key).to_lowercase();
        if RESERVED_KEYS.contains(&key.as_str()) {
            continue;
        }
        entries.insert(key, decode_pdf_string(bytes));
    }
    entries
}

/// One range of the `/PageLabels` number tree.
struct LabelStyle {
    start: usize,
    style: Option<Vec<u8>>,
    prefix: String,
    first: i64,
}

impl LabelStyle {
    fn label(&self, offset: usize) -> String {
        let n = self
            .first
            .saturating_add(i64::try_from(offset).unwrap_or(i64::MAX));
        let number = match self.style.as_deref() {
            Some(b"D") => n.to_string(),
            Some(b"R") => roman(n).to_uppercase(),
            Some(b"r") => roman(n),
            Some(b"A") => letters(n).to_uppercase(),
            Some(b"a") => letters(n),
            _ => String::new(),
        };
        format!("{}{number}", self.prefix)
    }
}

/// Printed label for each of `total` pages.
///
/// Pages not covered by the catalog's `/PageLabels` tree, or every page when
/// the tree is absent, are labelled with their 1-based number.
fn page_labels(pdf: &lopdf::Document, total: usize) -> Vec<String> {
    let mut ranges = Vec::new();
    if let Some(tree) = pdf.catalog().ok().and_then(|c| c.get(b"PageLabels").ok()) {
        collect_ranges(pdf, tree, 0, &mut ranges);
    }
    ranges.sort_by_key(|r| r.start);

    (0..total)
        .map(|index| match ranges.iter().rev().find(|r| r.start <= index) {
            Some(range) => range.label(index - range.start),
            None => (index + 1).to_string(),
        })
        .collect()
}

fn collect_ranges(
    pdf: &lopdf::Document,
    node: &lopdf::Object,
    depth: usize,
    out: &mut Vec<LabelStyle>,
) {
    if depth > MAX_TREE_DEPTH {
        return;
    }
    let Some(node) = resolve(pdf, node).and_then(|o| o.as_dict().ok()) else {
        return;
    };

    if let Some(nums) = node
        .get(b"Nums")
        .ok()
        .and_then(|o| resolve(pdf, o))
        .and_then(|o| o.as_array().ok())
    {
        for pair in nums.chunks_exact(2) {
            let lopdf::Object::Integer(start) = pair[0] else {
                continue;
            };
            let Ok(start) = usize::try_from(start) else {
                continue;
            };
            let Some(dict) = resolve(pdf, &pair[1]).and_then(|o| o.as_dict().ok()) else {
                continue;
            };
            out.push(label_style(start, dict));
        }
    }

    if let Some(kids) = node
        .get(b"Kids")
        .ok()
        .and_then(|o| resolve(pdf, o))
        .and_then(|o| o.as_array().ok())
    {
        for kid in kids {
            collect_ranges(pdf, kid, depth + 1, out);
        }
    }
}

fn label_style(start: usize, dict: &lopdf::Dictionary) -> LabelStyle {
    let style = match dict.get(b"S") {
        Ok(lopdf::Object::Name(name)) => Some(name.clone()),
        _ => None,
    };
    let prefix = match dict.get(b"P") {
        Ok(lopdf::Object::String(bytes, _)) => decode_pdf_string(bytes),
        _ => String::new(),
    };
    let first = match dict.get(b"St") {
        Ok(lopdf::Object::Integer(n)) if *n >= 1 => *n,
        _ => 1,
    };
    LabelStyle {
        start,
        style,
        prefix,
        first,
    }
}

fn resolve<'a>(pdf: &'a lopdf::Document, object: &'a lopdf::Object) -> Option<&'a lopdf::Object> {
    match object {
        lopdf::Object::Reference(id) => pdf.get_object(*id).ok(),
        other => Some(other),
    }
}

fn roman(mut n: i64) -> String {
    const NUMERALS: [(i64, &str); 13] = [
        (1000, "m"),
        (900, "cm"),
        (500, "d"),
        (400, "cd"),
        (100, "c"),
        (90, "xc"),
        (50, "l"),
        (40, "xl"),
        (10, "x"),
        (9, "ix"),
        (5, "v"),
        (4, "iv"),
        (1, "i"),
    ];
    let mut out = String::new();
    for (value, numeral) in NUMERALS {
        while n >= value {
            out.push_str(numeral);
            n -= value;
        }
    }
    out
}

/// `a`..`z`, then `aa`..`zz`, then `aaa`, as page-label letters count.
fn letters(n: i64) -> String {
    if n < 1 {
        return String::new();
    }
    let index = n - 1;
    let letter = char::from(b'a' + u8::try_from(index % 26).unwrap_or(0));
    let repeat = usize::try_from(index / 26 + 1).unwrap_or(1);
    std::iter::repeat_n(letter, repeat).collect()
}

/// PDF text strings are UTF-16BE when they carry a BOM, otherwise a Latin-1 superset.
fn decode_pdf_string(bytes: &[u8]) -> String {
    if let Some(rest) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = rest
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16_lossy(&units);
    }
    String::from_utf8(bytes.to_vec()).unwrap_or_else(|_| bytes.iter().map(|&b| b as char).collect())
}
