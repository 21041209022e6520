//! End-to-end tests over FITS files written to disk.

mod common;

use common::{card, tan_wcs, FitsBuilder};
use fitsview::app::{App, InputMode};
use fitsview::catalog::{HduKind, HduShape};
use fitsview::config::ViewerConfig;
use fitsview::fits::CellValue;
use fitsview::image::transform::{MappedPixel, PixelMapper};
use fitsview::navigation::{ActiveView, Navigator};
use fitsview::session::Session;
use fitsview::table::PageRequest;
use fitsview::wcs::WorldCoordinate;
use fitsview::FitsViewError;

fn all_columns() -> Vec<String> {
    vec!["ID".into(), "FLUX".into(), "NAME".into()]
}

fn survey_file(rows: usize) -> tempfile::NamedTempFile {
    FitsBuilder::new()
        .empty_primary()
        .catalog_table("SOURCES", rows)
        .ascii_table(&[("Vega", 0.03), ("Deneb", 1.25)])
        .image_f32("SCI", 4, 3, &[0.0; 12], &tan_wcs(150.0, 2.0, 2.0, 1.0))
        .write()
}

#[test]
fn catalog_classifies_every_hdu() {
    let file = survey_file(10);
    let session = Session::open(file.path()).unwrap();
    let catalog = session.catalog();

    let kinds: Vec<HduKind> = catalog.list_hdus().iter().map(|h| h.kind).collect();
    assert_eq!(
        kinds,
        vec![HduKind::Other, HduKind::Table, HduKind::Table, HduKind::Image]
    );
    assert_eq!(catalog.table_indices(), vec![1, 2]);
    assert_eq!(catalog.image_indices(), vec![3]);

    let table = catalog.describe(1).unwrap();
    assert_eq!(table.name.as_deref(), Some("SOURCES"));
    assert_eq!(table.shape, HduShape::Table { rows: 10, columns: 3 });
    assert_eq!(table.column("FLUX").unwrap().unit.as_deref(), Some("Jy"));

    let image = catalog.describe(3).unwrap();
    assert_eq!(image.shape, HduShape::Array(vec![4, 3]));
    assert_eq!(image.image_size(), Some((4, 3)));

    assert!(matches!(
        catalog.describe(4),
        Err(FitsViewError::NotFound { index: 4, count: 4 })
    ));
}

#[test]
fn pages_cover_the_table_exactly() {
    let file = survey_file(1000);
    let session = Session::open(file.path()).unwrap();

    let first = session
        .get_page(&PageRequest::new(1, 0, 50, all_columns()))
        .unwrap();
    assert_eq!((first.start_row, first.len(), first.total_rows), (0, 50, 1000));
    assert_eq!(first.get(0, "ID"), Some(&CellValue::Int(0)));

    let last = session
        .get_page(&PageRequest::new(1, 19, 50, all_columns()))
        .unwrap();
    assert_eq!((last.start_row, last.len()), (950, 50));
    assert_eq!(last.get(49, "ID"), Some(&CellValue::Int(999)));

    let past = session
        .get_page(&PageRequest::new(1, 20, 50, all_columns()))
        .unwrap();
    assert!(past.is_empty());
    assert_eq!(past.total_rows, 1000);
}

#[test]
fn short_table_pages() {
    let file = survey_file(80);
    let session = Session::open(file.path()).unwrap();

    let second = session
        .get_page(&PageRequest::new(1, 1, 50, all_columns()))
        .unwrap();
    assert_eq!((second.start_row, second.len()), (50, 30));

    let far = session
        .get_page(&PageRequest::new(1, 5, 50, all_columns()))
        .unwrap();
    assert_eq!(far.len(), 0);
    assert_eq!(far.total_rows, 80);
}

#[test]
fn projection_matches_full_rows() {
    let file = survey_file(120);
    let session = Session::open(file.path()).unwrap();

    let full = session
        .get_page(&PageRequest::new(1, 1, 50, all_columns()))
        .unwrap();
    let request = PageRequest::new(1, 1, 50, vec!["NAME".into(), "FLUX".into()]);
    let projected = session.get_page(&request).unwrap();

    assert_eq!(projected.columns, vec!["NAME", "FLUX"]);
    for row in 0..full.len() {
        assert_eq!(projected.rows[row].len(), 2);
        assert_eq!(projected.get(row, "NAME"), full.get(row, "NAME"));
        assert_eq!(projected.get(row, "FLUX"), full.get(row, "FLUX"));
    }
    assert_eq!(projected.get(3, "NAME"), Some(&CellValue::Text("obj53".into())));
    assert_eq!(projected.get(3, "FLUX"), Some(&CellValue::Double(26.5)));

    // Same request, same answer
    assert_eq!(session.get_page(&request).unwrap(), projected);
}

#[test]
fn ascii_table_cells() {
    let file = survey_file(1);
    let session = Session::open(file.path()).unwrap();

    let page = session
        .get_page(&PageRequest::new(2, 0, 10, vec!["STAR".into(), "MAG".into()]))
        .unwrap();
    assert_eq!(page.len(), 2);
    assert_eq!(page.get(0, "STAR"), Some(&CellValue::Text("Vega".into())));
    assert_eq!(page.get(1, "MAG"), Some(&CellValue::Double(1.25)));
}

#[test]
fn page_requests_are_validated() {
    let file = survey_file(10);
    let session = Session::open(file.path()).unwrap();

    let err = session
        .get_page(&PageRequest::new(1, 0, 10, vec!["ID".into(), "MISSING".into()]))
        .unwrap_err();
    assert!(matches!(err, FitsViewError::UnknownColumn { ref name } if name == "MISSING"));

    let err = session
        .get_page(&PageRequest::new(3, 0, 10, vec![]))
        .unwrap_err();
    assert!(matches!(err, FitsViewError::UnsupportedHdu { index: 3, .. }));

    let err = session
        .get_page(&PageRequest::new(9, 0, 10, vec![]))
        .unwrap_err();
    assert!(matches!(err, FitsViewError::NotFound { index: 9, .. }));

    let err = session
        .get_page(&PageRequest::new(1, 0, 0, vec!["ID".into()]))
        .unwrap_err();
    assert!(matches!(err, FitsViewError::InvalidPageSize { size: 0, .. }));
}

#[test]
fn closed_session_rejects_reads() {
    let file = survey_file(10);
    let mut session = Session::open(file.path()).unwrap();
    session.close();
    session.close();

    assert!(!session.is_open());
    let err = session
        .get_page(&PageRequest::new(1, 0, 10, all_columns()))
        .unwrap_err();
    assert!(matches!(err, FitsViewError::FileClosed));
    assert!(matches!(session.load_image(3), Err(FitsViewError::FileClosed)));
}

#[test]
fn scaled_integer_image() {
    let file = FitsBuilder::new()
        .primary_image_i16(
            3,
            2,
            &[1, 2, -32768, 4, 5, 6],
            &[card("BSCALE", "2.0"), card("BZERO", "10.0"), card("BLANK", -32768)],
        )
        .write();
    let session = Session::open(file.path()).unwrap();

    let plane = session.load_image(0).unwrap();
    assert_eq!((plane.width(), plane.height()), (3, 2));
    assert_eq!(plane.value(0, 0), Some(12.0));
    assert!(plane.value(2, 0).unwrap().is_nan());
    assert_eq!(plane.value(2, 1), Some(22.0));
    assert_eq!((plane.min, plane.max), (12.0, 22.0));
}

#[test]
fn world_coordinates_from_tan_header() {
    let file = survey_file(1);
    let session = Session::open(file.path()).unwrap();
    let resolver = session.resolver(3).unwrap();
    assert!(resolver.has_solution());

    // CRPIX (2, 1) is 0-based pixel (1, 0)
    match resolver.resolve(1.0, 0.0) {
        WorldCoordinate::Available { ra, dec } => {
            assert!((ra - 150.0).abs() < 1e-9);
            assert!((dec - 2.0).abs() < 1e-9);
        },
        WorldCoordinate::Unavailable => panic!("reference pixel has no sky position"),
    }

    // RA grows to the left, Dec grows upward
    match (resolver.resolve(2.0, 0.0), resolver.resolve(1.0, 1.0)) {
        (
            WorldCoordinate::Available { ra: right, .. },
            WorldCoordinate::Available { dec: up, .. },
        ) => {
            assert!(right < 150.0);
            assert!((150.0 - right) * 3600.0 > 0.99);
            assert!(((up - 2.0) * 3600.0 - 1.0).abs() < 1e-6);
        },
        _ => panic!("neighbouring pixels have no sky position"),
    }

    assert!(resolver.readout(1.0, 0.0).starts_with("RA---TAN: 150.000000"));
}

#[test]
fn image_without_wcs_reports_pixels() {
    let file = FitsBuilder::new()
        .primary_image_i16(2, 2, &[1, 2, 3, 4], &[])
        .write();
    let session = Session::open(file.path()).unwrap();
    let resolver = session.resolver(0).unwrap();

    assert!(!resolver.has_solution());
    assert_eq!(resolver.resolve(0.0, 0.0), WorldCoordinate::Unavailable);
    assert_eq!(resolver.readout(1.0, 0.0), "Pixel X: 1.00  Pixel Y: 0.00");
}

#[test]
fn navigator_walks_real_catalog() {
    let file = survey_file(120);
    let session = Session::open(file.path()).unwrap();
    let mut nav = Navigator::new(session.catalog(), &ViewerConfig::default());

    assert_eq!(nav.active(), Some(ActiveView::Table));
    assert_eq!((nav.table_count(), nav.image_count()), (2, 1));
    assert_eq!(nav.page_count(), 3);

    assert!(nav.next_page());
    assert!(nav.next_page());
    assert!(nav.next_page());
    // Page 3 is empty, so no further advance
    assert!(!nav.next_page());
    assert_eq!(session.get_page(&nav.table_view().unwrap().request()).unwrap().len(), 0);

    assert!(nav.next_table());
    let view = nav.table_view().unwrap();
    assert_eq!((view.hdu, view.page), (2, 0));
    assert_eq!(view.columns, vec!["STAR", "MAG"]);

    assert!(nav.toggle_view());
    assert_eq!(nav.image_view().unwrap().hdu, 3);
}

#[test]
fn app_reports_pages_and_keeps_state_on_errors() {
    let file = survey_file(1000);
    let mut app = App::new(ViewerConfig::default());
    app.load_file(file.path().to_path_buf());

    assert!(app.error_message.is_none());
    assert_eq!(app.page.as_ref().unwrap().len(), 50);
    assert!(app.page_status().contains("Page 1 of 20"));

    app.next_page();
    assert_eq!(app.page.as_ref().unwrap().start_row, 50);
    assert!(app.status.contains("Page 2 of 20"));

    app.start_prompt(InputMode::JumpToPage);
    app.input.push_str("0");
    app.submit_input();
    assert!(app.status.starts_with("Invalid page"));
    assert_eq!(app.page.as_ref().unwrap().start_row, 50);

    app.start_prompt(InputMode::PageSize);
    app.input.push_str("5000");
    app.submit_input();
    assert!(app.status.starts_with("Invalid page size"));
    assert_eq!(app.page.as_ref().unwrap().len(), 50);

    app.start_prompt(InputMode::JumpToPage);
    app.input.push_str("20");
    app.submit_input();
    assert_eq!(app.page.as_ref().unwrap().start_row, 950);

    app.close();
    app.next_page();
    assert!(app.status.starts_with("Error"));
    assert_eq!(app.page.as_ref().unwrap().start_row, 950);
}

#[test]
fn app_image_cursor_readout() {
    let file = survey_file(1);
    let mut app = App::new(ViewerConfig {
        start_with_image: true,
        ..ViewerConfig::default()
    });
    app.load_file(file.path().to_path_buf());

    assert_eq!(
        app.navigator.as_ref().and_then(Navigator::active),
        Some(ActiveView::Image)
    );
    assert_eq!(app.image.as_ref().unwrap().plane.hdu, 3);

    let readout = app.cursor_readout().unwrap();
    assert!(readout.starts_with("RA---TAN: "));
    assert!(readout.ends_with("Value: 0"), "{}", readout);
}

#[test]
fn display_mapping_inverts_for_every_pixel() {
    for rotation in 0..4 {
        for &scale in &[1.0, 1.2, 1.44, 2.0, 3.0] {
            let mapper = PixelMapper::new(5, 3, rotation, scale);
            for y in 0..3 {
                for x in 0..5 {
                    let (dx, dy) = mapper.to_display(x, y).unwrap();
                    assert_eq!(
                        mapper.to_source(dx, dy),
                        MappedPixel::Inside { x, y },
                        "rotation {} scale {}",
                        rotation,
                        scale
                    );
                }
            }
        }
    }
}

#[test]
fn zoomed_out_display_pixels_map_back_to_themselves() {
    for rotation in 0..4 {
        for &scale in &[0.8, 0.64, 0.1] {
            let mapper = PixelMapper::new(5, 3, rotation, scale);
            let (dw, dh) = mapper.display_size();
            for dy in 0..dh {
                for dx in 0..dw {
                    let MappedPixel::Inside { x, y } = mapper.to_source(dx, dy) else {
                        panic!("({}, {}) is inside a {}x{} raster", dx, dy, dw, dh);
                    };
                    let (bx, by) = mapper.to_display(x, y).unwrap();
                    assert!(
                        bx.abs_diff(dx) <= 1 && by.abs_diff(dy) <= 1,
                        "rotation {} scale {}: ({}, {}) came back as ({}, {})",
                        rotation,
                        scale,
                        dx,
                        dy,
                        bx,
                        by
                    );
                }
            }
        }
    }
}
