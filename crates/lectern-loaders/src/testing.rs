//! Fixture helpers: small, valid PDFs built in memory with `lopdf`.

use std::path::Path;

use lopdf::content::{Content, Operation};
use lopdf::{Object, Stream, dictionary};

/// One `/PageLabels` range: from `start_page` on, pages are labelled
/// `prefix` plus their number in `style` counted from `first`.
#[derive(Debug, Clone)]
pub struct LabelRange {
    pub start_page: usize,
    pub style: Option<&'static str>,
    pub prefix: String,
    pub first: i64,
}

/// Description of a fixture PDF: one text line per page plus Info entries.
#[derive(Debug, Clone, Default)]
pub struct PdfSpec {
    pub pages: Vec<String>,
    pub info: Vec<(String, String)>,
    pub labels: Vec<LabelRange>,
}

impl PdfSpec {
    #[must_use]
    pub fn pages(texts: &[&str]) -> Self {
        Self {
            pages: texts.iter().map(|t| (*t).to_owned()).collect(),
            ..Self::default()
        }
    }

    /// `n` pages whose text is `{prefix}page{i}`.
    #[must_use]
    pub fn numbered(prefix: &str, n: usize) -> Self {
        Self {
            pages: (0..n).map(|i| format!("{prefix}page{i}")).collect(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_info(mut self, key: &str, value: &str) -> Self {
        self.info.push((key.to_owned(), value.to_owned()));
        self
    }

    #[must_use]
    pub fn with_labels(
        mut self,
        start_page: usize,
        style: Option<&'static str>,
        prefix: &str,
        first: i64,
    ) -> Self {
        self.labels.push(LabelRange {
            start_page,
            style,
            prefix: prefix.to_owned(),
            first,
        });
        self
    }
}

/// Build the PDF described by `spec` and return its bytes.
///
/// # Errors
///
/// Returns an error if content encoding or serialization fails.
pub fn build_pdf(spec: &PdfSpec) -> Result<Vec<u8>, lopdf::Error> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::with_capacity(spec.pages.len());
    for text in &spec.pages {
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 24.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(text.as_str())]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode()?));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(Object::Reference(page_id));
    }

    let count = i64::try_from(kids.len()).unwrap_or(i64::MAX);
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let mut catalog = dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    };
    if !spec.labels.is_empty() {
        let mut nums = Vec::with_capacity(spec.labels.len() * 2);
        for range in &spec.labels {
            let mut label = dictionary! { "St" => range.first };
            if let Some(style) = range.style {
                label.set("S", Object::Name(style.as_bytes().to_vec()));
            }
            if !range.prefix.is_empty() {
                label.set("P", Object::string_literal(range.prefix.as_str()));
            }
            nums.push(Object::Integer(
                i64::try_from(range.start_page).unwrap_or(i64::MAX),
            ));
            nums.push(Object::Dictionary(label));
        }
        catalog.set("PageLabels", dictionary! { "Nums" => nums });
    }
    let catalog_id = doc.add_object(catalog);
    doc.trailer.set("Root", catalog_id);

    if !spec.info.is_empty() {
        let mut info = lopdf::Dictionary::new();
        for (key, value) in &spec.info {
            info.set(key.as_bytes().to_vec(), Object::string_literal(value.as_str()));
        }
        let info_id = doc.add_object(info);
        doc.trailer.set("Info", info_id);
    }

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)?;
    Ok(bytes)
}

/// Build the PDF described by `spec` and write it to `path`.
///
/// # Errors
///
/// Returns an error if building the PDF or writing the file fails.
pub fn write_pdf(path: &Path, spec: &PdfSpec) -> Result<(), lopdf::Error> {
    let bytes = build_pdf(spec)?;
    std::fs::write(path, bytes)?;
    Ok(())
}
