//! PDF fixtures built with lopdf.

#![allow(dead_code)]

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Document, Object, Stream, StringFormat};

/// A line of text drawn at `(x, y)` in 10pt Courier.
#[derive(Debug, Clone, Copy)]
pub struct Line<'a> {
    pub x: f32,
    pub y: f32,
    pub text: &'a str,
}

pub fn line(x: f32, y: f32, text: &str) -> Line<'_> {
    Line { x, y, text }
}

/// Lines stacked downward from the top of a letter page, 14pt apart.
pub fn column(x: f32, texts: &[&'static str]) -> Vec<Line<'static>> {
    texts
        .iter()
        .enumerate()
        .map(|(i, text)| line(x, 720.0 - 14.0 * i as f32, *text))
        .collect()
}

/// Build a PDF with one 612x792 page per entry.
pub fn build_pdf(pages: &[Vec<Line<'_>>]) -> Vec<u8> {
    let mut doc = build_document(pages);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// A one-page PDF with a hand-written content stream, in 10pt Courier as F1.
pub fn raw_page_pdf(content: &str, media_box: [i64; 4], crop_box: Option<[i64; 4]>) -> Vec<u8> {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let content_id = doc.add_object(Stream::new(dictionary! {}, content.as_bytes().to_vec()));
    let mut page = dictionary! {
        "Type" => "Page",
        "Parent" => pages_id,
        "Contents" => content_id,
        "Resources" => dictionary! {
            "Font" => dictionary! {
                "F1" => font_id,
            },
        },
        "MediaBox" => media_box.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
    };
    if let Some(crop) = crop_box {
        page.set(
            "CropBox",
            crop.iter().map(|&v| Object::Integer(v)).collect::<Vec<_>>(),
        );
    }
    let page_id = doc.add_object(page);
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => vec![Object::Reference(page_id)],
            "Count" => 1,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// A PDF whose trailer declares standard encryption.
pub fn encrypted_pdf() -> Vec<u8> {
    let mut doc = build_document(&[column(72.0, &["Document confidentiel"])]);
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => 1,
        "R" => 2,
        "Length" => 40,
        "P" => -44,
        "O" => Object::String(vec![0x4f; 32], StringFormat::Hexadecimal),
        "U" => Object::String(vec![0x55; 32], StringFormat::Hexadecimal),
    });
    doc.trailer.set("Encrypt", encrypt_id);
    doc.trailer.set(
        "ID",
        vec![
            Object::String(vec![0x01; 16], StringFormat::Hexadecimal),
            Object::String(vec![0x01; 16], StringFormat::Hexadecimal),
        ],
    );
    let mut buf = Vec::new();
    doc.save_to(&mut buf).unwrap();
    buf
}

/// Write `bytes` to `dir/name` and return the path.
pub fn write_pdf(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, bytes).unwrap();
    path
}

/// Two pages of single-column contract prose.
pub fn single_column_contract() -> Vec<u8> {
    build_pdf(&[
        column(
            72.0,
            &[
                "Le present contrat de bail commercial est conclu entre les parties.",
                "Le preneur verse au bailleur un loyer annuel payable par trimestre.",
                "Le bailleur garantit au preneur la jouissance paisible des locaux.",
            ],
        ),
        column(
            72.0,
            &["La resiliation du bail intervient par lettre recommandee avec preavis."],
        ),
    ])
}

/// One page with a short block on each side of the midline.
pub fn double_column_contract() -> Vec<u8> {
    let mut page = column(50.0, &["Le bailleur", "Monsieur Martin", "Paris"]);
    page.extend(column(350.0, &["Le preneur", "Madame Durand", "Lyon"]));
    build_pdf(&[page])
}

fn build_document(pages: &[Vec<Line<'_>>]) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! {
            "F1" => font_id,
        },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = Vec::new();
        for l in lines {
            operations.push(Operation::new("BT", vec![]));
            operations.push(Operation::new("Tf", vec!["F1".into(), 10.into()]));
            operations.push(Operation::new("Td", vec![Object::Real(l.x), Object::Real(l.y)]));
            operations.push(Operation::new("Tj", vec![Object::string_literal(l.text)]));
            operations.push(Operation::new("ET", vec![]));
        }
        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}
