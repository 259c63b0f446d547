// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Fixtures shared by the unit tests.

use lopdf::{Document, Object, Stream, dictionary};

/// An uncompressed PDF with `page_count` pages, each showing "Page n".
/// Pages inherit MediaBox and Resources from the page tree root.
pub(crate) fn sample_pdf(page_count: u32) -> Vec<u8> {
    sample_pdf_with(page_count, "")
}

/// [`sample_pdf`] with `marker` embedded as a comment, so a scripted
/// renderer can recognise the file.
pub(crate) fn sample_pdf_with(page_count: u32, marker: &str) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids = Vec::new();
    for n in 1..=page_count {
        let content = format!("BT /F1 24 Tf 72 720 Td (Page {n}) Tj ET");
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.into_bytes()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
        });
        kids.push(Object::Reference(page_id));
    }

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => page_count as i64,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    if !marker.is_empty() {
        let info_id = doc.add_object(dictionary! {
            "Keywords" => Object::string_literal(marker),
        });
        doc.trailer.set("Info", info_id);
    }

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("serialise sample pdf");
    out
}

/// Bytes the PDF parser rejects but which carry `marker` and an encryption
/// dictionary, standing in for a strongly encrypted file.
pub(crate) fn sealed_pdf(marker: &str, body: &str) -> Vec<u8> {
    format!(
        "%PDF-1.7\n% {marker}\n1 0 obj << /Filter /Standard /V 5 /R 6 /Length 256 \
         /P -3904 /O (x) /U (y) >> endobj\n{body}\ntrailer << /Encrypt 1 0 R >>\n%%EOF\n"
    )
    .into_bytes()
}

/// Concatenated string operands of the text-showing operators on a page.
pub(crate) fn page_text(document: &Document, page_number: u32) -> String {
    let page_id = document.get_pages()[&page_number];
    let content = document
        .get_and_decode_page_content(page_id)
        .expect("decode page content");
    let mut out = String::new();
    for operation in content.operations {
        if matches!(operation.operator.as_str(), "Tj" | "TJ" | "'" | "\"") {
            for operand in &operation.operands {
                collect_strings(operand, &mut out);
            }
            out.push('\n');
        }
    }
    out
}

fn collect_strings(object: &Object, out: &mut String) {
    match object {
        Object::String(bytes, _) => out.extend(bytes.iter().map(|&b| char::from(b))),
        Object::Array(items) => items.iter().for_each(|item| collect_strings(item, out)),
        _ => {}
    }
}
