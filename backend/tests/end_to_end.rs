//! Full run over a Squarespace-shaped export: parse, categorize, export.

use std::fs;
use std::path::PathBuf;

use sweeper::{
    export_bundle, process_file, write_bundle, Category, ParseOptions, TicketQuantity,
    MERGED_FILE_NAME,
};

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/orders.csv")
}

#[test]
fn test_fixture_buckets() {
    let output = process_file(&fixture(), &ParseOptions::default()).unwrap();
    let result = &output.result;

    assert_eq!(output.csv_info.row_count, 5);
    assert!(output.csv_info.missing_columns.is_empty());

    assert_eq!(result.get(Category::Volunteer).len(), 3);
    assert_eq!(result.get(Category::Speaker).len(), 1);
    assert_eq!(result.get(Category::Guest).len(), 2);
    // Sam (1) + Pat (2)
    assert_eq!(result.get(Category::General).len(), 3);
    assert_eq!(result.len(), 9);

    let sam = &result.get(Category::General)[0];
    assert_eq!(sam.order_id, "100000000000000002");
    assert_eq!(sam.quantity, TicketQuantity::Whole(1));
    assert!(sam.is_refunded);

    let kim = &result.get(Category::Guest)[1];
    assert_eq!(kim.name, "Kim, Alex");
    assert_eq!(kim.financial_status, "paid");
    assert_eq!(kim.ticket_number, Some(2));

    let pat: Vec<_> = result.get(Category::General)[1..].iter().collect();
    assert!(pat.iter().all(|t| t.is_refunded && t.financial_status == "refund"));
}

#[test]
fn test_fixture_export_files() {
    let output = process_file(&fixture(), &ParseOptions::default()).unwrap();
    let dir = tempfile::tempdir().unwrap();

    let files = export_bundle(&output.result, true).unwrap();
    write_bundle(&files, dir.path()).unwrap();

    for category in Category::ALL {
        assert!(dir.path().join(category.file_name()).exists(), "{}", category);
    }

    let merged = fs::read_to_string(dir.path().join(MERGED_FILE_NAME)).unwrap();
    let lines: Vec<&str> = merged.lines().collect();
    assert_eq!(
        lines[0],
        "Name,Email,Order ID,Ticket Quantity,Ticket Number,Event Type,Price,Financial Status,Category"
    );
    assert_eq!(lines.len(), 1 + output.result.len());
    assert!(!merged.contains("VOL2024"));
    assert!(!merged.contains("Discount"));
    assert_eq!(merged.matches("REFUNDED").count(), 3);
    assert!(lines[1].starts_with("Sam Smith,sam@example.com,100000000000000002,1,,Gala Dinner,120.00,REFUNDED,General"));

    let volunteers = fs::read_to_string(dir.path().join("volunteer_attendees.csv")).unwrap();
    assert!(volunteers.contains("Jane Doe,jane@example.com,100000000000000001,1 (3/3),3,Workshop,50.00,"));
}
