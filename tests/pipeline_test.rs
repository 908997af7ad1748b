//! End-to-end tests: TOC text in, PDF with outline out.

use std::fs;
use std::path::{Path, PathBuf};

use lopdf::{dictionary, Document, Object};
use tempfile::TempDir;
use tocmark::writer::LopdfHandle;
use tocmark::{
    generate_bookmarks, generate_bookmarks_with_options, read_outline, Error, GenerateOptions,
    Tocmark, Warning,
};

/// Build a PDF with `page_count` empty A4 pages.
fn build_pdf(page_count: u32) -> Document {
    let mut doc = Document::with_version("1.5");
    let pages_id = doc.new_object_id();

    let kids: Vec<Object> = (0..page_count)
        .map(|_| {
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "MediaBox" => vec![
                    Object::Integer(0),
                    Object::Integer(0),
                    Object::Integer(595),
                    Object::Integer(842),
                ],
            });
            Object::Reference(page_id)
        })
        .collect();

    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => i64::from(page_count),
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);
    doc
}

/// Write a `page_count`-page PDF into `dir` and return its path.
fn write_pdf(dir: &TempDir, name: &str, page_count: u32) -> PathBuf {
    let path = dir.path().join(name);
    build_pdf(page_count).save(&path).unwrap();
    path
}

fn outline_entries(path: &Path) -> Vec<(u8, String, Option<u32>)> {
    read_outline(path).unwrap().flatten()
}

#[test]
fn test_chapter_and_section() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(&dir, "book.pdf", 10);
    let dest = dir.path().join("out.pdf");

    let result = generate_bookmarks(
        "Chapter 1 ......... 5\n  Section 1.1 ..... 6",
        &source,
        Some(&dest),
        0,
    )
    .unwrap();

    assert_eq!(result.entries, 2);
    assert_eq!(result.page_count, 10);
    assert_eq!(result.destination, dest);
    assert!(result.warnings.is_empty());
    assert_eq!(
        outline_entries(&dest),
        vec![
            (0, "Chapter 1".to_string(), Some(5)),
            (1, "Section 1.1".to_string(), Some(6)),
        ]
    );
}

#[test]
fn test_offset_within_range() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(&dir, "book.pdf", 4);
    let dest = dir.path().join("out.pdf");

    generate_bookmarks("Intro 1", &source, Some(&dest), 3).unwrap();
    assert_eq!(
        outline_entries(&dest),
        vec![(0, "Intro".to_string(), Some(4))]
    );
}

#[test]
fn test_offset_out_of_range_leaves_no_file() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(&dir, "book.pdf", 3);
    let dest = dir.path().join("out.pdf");

    let result = generate_bookmarks("Intro 1", &source, Some(&dest), 3);
    assert!(matches!(
        result,
        Err(Error::PageOutOfRange { ref title, page: 4, total: 3 }) if title == "Intro"
    ));
    assert!(!dest.exists());
}

#[test]
fn test_negative_offset_below_first_page() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(&dir, "book.pdf", 5);

    let result = generate_bookmarks("Preface 1\nBody 3", &source, None, -1);
    assert!(matches!(result, Err(Error::PageOutOfRange { page: 0, .. })));
    assert!(!tocmark::default_destination(&source).exists());
}

#[test]
fn test_default_destination_and_source_untouched() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(&dir, "manual.pdf", 6);
    let before = fs::read(&source).unwrap();

    let result = generate_bookmarks("Intro 1\nUsage 2", &source, None, 0).unwrap();

    assert_eq!(result.destination, dir.path().join("manual_含目录.pdf"));
    assert!(result.destination.is_file());
    assert_eq!(fs::read(&source).unwrap(), before);
    assert!(read_outline(&source).unwrap().is_empty());
}

#[test]
fn test_page_sequence_follows_input() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(&dir, "book.pdf", 40);
    let dest = dir.path().join("out.pdf");
    let toc = "\
1 Basics 1
1.1 Values 2
1.2 Types 5
1.2.1 Integers 6
2 Control Flow 10
2.1 Loops 12
3 Modules 20";

    let result = generate_bookmarks(toc, &source, Some(&dest), 4).unwrap();

    assert_eq!(result.tree.pages(), vec![5, 6, 9, 10, 14, 16, 24]);
    let pages: Vec<Option<u32>> = outline_entries(&dest).into_iter().map(|e| e.2).collect();
    assert_eq!(
        pages,
        vec![Some(5), Some(6), Some(9), Some(10), Some(14), Some(16), Some(24)]
    );
    let levels: Vec<u8> = outline_entries(&dest).into_iter().map(|e| e.0).collect();
    assert_eq!(levels, vec![0, 1, 1, 2, 0, 1, 0]);
}

#[test]
fn test_idempotent_on_fresh_copies() {
    let dir = TempDir::new().unwrap();
    let first = write_pdf(&dir, "a.pdf", 12);
    let second = write_pdf(&dir, "b.pdf", 12);
    let toc = "Part I\n  Chapter 1 .... 2\n  Chapter 2 .... 7\nAppendix .... 11";

    let a = generate_bookmarks(toc, &first, None, 0).unwrap();
    let b = generate_bookmarks(toc, &second, None, 0).unwrap();

    assert_eq!(
        outline_entries(&a.destination),
        outline_entries(&b.destination)
    );
    assert_eq!(
        outline_entries(&a.destination)[0],
        (0, "Part I".to_string(), Some(2))
    );
}

#[test]
fn test_unicode_titles() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(&dir, "book.pdf", 20);
    let dest = dir.path().join("out.pdf");

    generate_bookmarks(
        "第一章 总论 ……… １\n第一节 概述 ……… 3\n第二章 方法 ……… 9",
        &source,
        Some(&dest),
        2,
    )
    .unwrap();

    assert_eq!(
        outline_entries(&dest),
        vec![
            (0, "第一章 总论".to_string(), Some(3)),
            (1, "第一节 概述".to_string(), Some(5)),
            (0, "第二章 方法".to_string(), Some(11)),
        ]
    );
}

#[test]
fn test_existing_outline_is_replaced() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(&dir, "book.pdf", 8);
    let once = dir.path().join("once.pdf");
    let twice = dir.path().join("twice.pdf");

    generate_bookmarks("Old 1\nStaleHeading 2", &source, Some(&once), 0).unwrap();
    generate_bookmarks("New 3", &once, Some(&twice), 0).unwrap();

    assert_eq!(
        outline_entries(&twice),
        vec![(0, "New".to_string(), Some(3))]
    );

    // The replaced outline objects are not carried over.
    let contains = |path: &Path, needle: &[u8]| {
        fs::read(path).unwrap().windows(needle.len()).any(|w| w == needle)
    };
    assert!(contains(&once, b"StaleHeading"));
    assert!(!contains(&twice, b"StaleHeading"));
}

#[test]
fn test_warnings_are_reported() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(&dir, "book.pdf", 8);

    let toc = "Intro 1\n.....\nOrphan heading\nEnd 2";
    let result = generate_bookmarks(toc, &source, None, 0).unwrap();

    assert_eq!(result.entries, 2);
    assert_eq!(result.warnings.len(), 2);
    assert!(matches!(result.warnings[0], Warning::MalformedTocLine { line: 2, .. }));
    assert!(matches!(result.warnings[1], Warning::UnresolvedHeading { line: 3, .. }));
}

#[test]
fn test_open_items_count() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(&dir, "book.pdf", 8);
    let toc = "Chapter 1 1\n  1.1 Start 2\n  1.2 More 3";

    let collapsed = dir.path().join("collapsed.pdf");
    generate_bookmarks(toc, &source, Some(&collapsed), 0).unwrap();
    assert_eq!(first_item_count(&collapsed), -2);

    let expanded = dir.path().join("expanded.pdf");
    let options = GenerateOptions::new()
        .with_destination(&expanded)
        .with_open_items(true);
    generate_bookmarks_with_options(toc, &source, &options).unwrap();
    assert_eq!(first_item_count(&expanded), 2);
}

/// `/Count` of the first top-level outline item.
fn first_item_count(path: &Path) -> i64 {
    let doc = Document::load(path).unwrap();
    let outlines_id = doc
        .catalog()
        .unwrap()
        .get(b"Outlines")
        .unwrap()
        .as_reference()
        .unwrap();
    let first_id = doc
        .get_dictionary(outlines_id)
        .unwrap()
        .get(b"First")
        .unwrap()
        .as_reference()
        .unwrap();
    doc.get_dictionary(first_id)
        .unwrap()
        .get(b"Count")
        .unwrap()
        .as_i64()
        .unwrap()
}

#[test]
fn test_empty_toc() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(&dir, "book.pdf", 3);

    let result = generate_bookmarks(" \n\t\n", &source, None, 0);
    assert!(matches!(result, Err(Error::EmptyContent)));

    let result = generate_bookmarks("just a heading", &source, None, 0);
    assert!(matches!(result, Err(Error::EmptyContent)));
    assert!(!tocmark::default_destination(&source).exists());
}

#[test]
fn test_missing_source() {
    let dir = TempDir::new().unwrap();
    let result = generate_bookmarks("Intro 1", dir.path().join("missing.pdf"), None, 0);
    assert!(matches!(result, Err(Error::EmptySource(_))));

    let result = generate_bookmarks("Intro 1", "", None, 0);
    assert!(matches!(result, Err(Error::EmptySource(_))));
}

#[test]
fn test_unreadable_source() {
    let dir = TempDir::new().unwrap();
    let source = dir.path().join("fake.pdf");
    fs::write(&source, "this is not a pdf").unwrap();

    let result = generate_bookmarks("Intro 1", &source, None, 0);
    assert!(matches!(result, Err(Error::Unreadable(_))));
}

#[test]
fn test_encrypted_document_rejected() {
    let mut doc = build_pdf(2);
    let encrypt_id = doc.add_object(dictionary! {
        "Filter" => "Standard",
        "V" => Object::Integer(1),
        "R" => Object::Integer(2),
    });
    doc.trailer.set("Encrypt", encrypt_id);

    let result = LopdfHandle::from_document(doc);
    assert!(matches!(result, Err(Error::PasswordProtected)));
}

#[test]
fn test_builder_generate() {
    let dir = TempDir::new().unwrap();
    let source = write_pdf(&dir, "book.pdf", 10);
    let dest = dir.path().join("built.pdf");

    let result = Tocmark::new()
        .with_offset_str("+1")
        .unwrap()
        .with_destination(&dest)
        .generate("A 1\nB 2\nC 3", &source)
        .unwrap();

    assert_eq!(result.entries, 3);
    assert_eq!(
        outline_entries(&dest),
        vec![
            (0, "A".to_string(), Some(2)),
            (0, "B".to_string(), Some(3)),
            (0, "C".to_string(), Some(4)),
        ]
    );
}
