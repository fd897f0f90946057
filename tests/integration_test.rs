use std::path::Path;

use performance_upload::browser::launch_browser;
use performance_upload::models::FieldMapTier;
use performance_upload::orchestrator::preflight;
use performance_upload::source::{CellValue, Grid, SettingsFile, XlsxGrid};
use performance_upload::{ChromeDriver, UiDriver, WorkflowError};
use rust_xlsxwriter::{Format, Workbook};

/// 写一个和 Upload.xlsx 结构相同的工作簿
fn write_upload_xlsx(path: &Path, with_header: bool) {
    let mut workbook = Workbook::new();
    let date_format = Format::new().set_num_format("yyyy-mm-dd");
    let sheet = workbook.add_worksheet();

    // A1: 2025-03-14（序列日期），A2: 活动代码
    sheet
        .write_number_with_format(0, 0, 45_730.0, &date_format)
        .unwrap();
    sheet.write_string(1, 0, "ACA CMO183").unwrap();

    if with_header {
        for (col, name) in ["Class", "StudentID", "Name", "Award"].iter().enumerate() {
            sheet.write_string(3, col as u16, *name).unwrap();
        }
    }

    let rows: [(&str, f64, &str, &str); 3] = [
        ("S3B", 20019.0, "Tan Mei Ling", "Champion"),
        ("S3B", 20019.0, "Tan Mei Ling", "Champion"),
        ("S1A", 10001.0, "Lee Wei", "Merit"),
    ];
    for (i, (class, id, name, award)) in rows.iter().enumerate() {
        let row = 4 + i as u32;
        sheet.write_string(row, 0, *class).unwrap();
        sheet.write_number(row, 1, *id).unwrap();
        sheet.write_string(row, 2, *name).unwrap();
        sheet.write_string(row, 3, *award).unwrap();
    }

    workbook.save(path).unwrap();
}

#[test]
fn test_preflight_from_xlsx() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Upload.xlsx");
    write_upload_xlsx(&path, true);

    let grid = XlsxGrid::open(&path).unwrap();
    let plan = preflight(&grid, None).unwrap();

    assert_eq!(plan.event.date, "2025-03-14");
    assert_eq!(plan.event.activity_code, "ACA CMO183");
    assert_eq!(plan.field_map.tier(), FieldMapTier::HeaderRow);
    assert_eq!(plan.work.class_count(), 2);
    assert_eq!(plan.work.total_students(), 2);
    assert_eq!(plan.work.duplicates, 1);

    let s3b = plan.work.get("S3B").unwrap();
    assert_eq!(s3b.items[0].student_id, "20019");
    assert_eq!(s3b.items[0].source_row, 5);
}

#[test]
fn test_settings_fallback_without_header_row() {
    let dir = tempfile::tempdir().unwrap();
    let xlsx = dir.path().join("Upload.xlsx");
    let json = dir.path().join("setting.json");
    write_upload_xlsx(&xlsx, false);
    std::fs::write(
        &json,
        r#"{"student_fields": ["Class", "StudentId", "Name", "Award"]}"#,
    )
    .unwrap();

    let grid = XlsxGrid::open(&xlsx).unwrap();
    let settings = SettingsFile::new(&json);
    let plan = preflight(&grid, Some(&settings)).unwrap();

    assert_eq!(plan.field_map.tier(), FieldMapTier::Settings);
    assert_eq!(plan.field_map.get("studentid"), Some(2));
    assert_eq!(plan.work.total_students(), 2);
}

#[test]
fn test_missing_event_header_fails_preflight() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Upload.xlsx");
    let mut workbook = Workbook::new();
    workbook
        .add_worksheet()
        .write_string(4, 1, "20019")
        .unwrap();
    workbook.save(&path).unwrap();

    let grid = XlsxGrid::open(&path).unwrap();
    let err = preflight(&grid, None).unwrap_err();

    assert!(matches!(err, WorkflowError::Preflight(_)));
}

#[test]
fn test_activity_label_survives_save() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("Upload.xlsx");
    write_upload_xlsx(&path, true);

    let mut grid = XlsxGrid::open(&path).unwrap();
    grid.set_cell(3, 2, CellValue::from("ACA CMO183 数学奥林匹克"));
    grid.save().unwrap();

    let reopened = XlsxGrid::open(&path).unwrap();
    assert_eq!(reopened.get_cell(3, 2).as_text(), "ACA CMO183 数学奥林匹克");
    assert_eq!(reopened.get_cell(5, 2).as_text(), "20019");
    assert_eq!(
        preflight(&reopened, None).unwrap().event.date,
        "2025-03-14"
    );
}

#[tokio::test]
#[ignore] // 需要本机 Chromium，手动运行：cargo test -- --ignored
async fn test_launch_browser_and_navigate() {
    let session = launch_browser(true).await.expect("启动浏览器失败");
    let driver = ChromeDriver::new(session);

    driver.navigate("about:blank").await.expect("导航失败");
    let location = driver.current_location().await.expect("读取地址失败");
    assert_eq!(location, "about:blank");

    driver.close().await.expect("关闭浏览器失败");
    driver.close().await.expect("重复关闭应当无副作用");
}
