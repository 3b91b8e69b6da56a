use std::fs;

use cloudmask::io::{find_world_file, load_raster, read_world_file};
use georef::{georeference, GeorefError, GeorefRequest, WGS84_WKT};
use image::{Rgb, RgbImage};

fn write_scene(dir: &std::path::Path) -> std::path::PathBuf {
    let input = dir.join("scene.png");
    RgbImage::from_pixel(200, 100, Rgb([40, 80, 120]))
        .save(&input)
        .expect("Should save image");
    input
}

#[test]
fn writes_image_world_file_and_projection() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let input = write_scene(dir.path());
    fs::write(
        dir.path().join("scene.txt"),
        "POLYGON((2.0 48.5, 2.4 48.6, 2.2 48.1, 2.0 48.5))",
    )
    .expect("Should write footprint");

    let output = georeference(&GeorefRequest::new(&input)).expect("Should georeference");

    assert_eq!(output.image, dir.path().join("scene.tif"));
    assert_eq!(output.gcps.len(), 4);
    assert_eq!(
        fs::read_to_string(&output.projection).expect("Should read prj"),
        WGS84_WKT
    );

    // the sidecar is found and agrees with the fit
    let sidecar = find_world_file(&output.image).expect("Should find world file");
    assert_eq!(sidecar, output.world_file);
    let transform = read_world_file(&sidecar).expect("Should read world file");
    let [x0, dx, _, y0, _, dy] = transform.coefficients();
    assert!((x0 - 2.0).abs() < 1e-9);
    assert!((y0 - 48.6).abs() < 1e-9);
    assert!((dx - 0.4 / 200.0).abs() < 1e-9);
    assert!((dy + 0.5 / 100.0).abs() < 1e-9);

    let raster = load_raster(&output.image).expect("Should decode output");
    assert_eq!((raster.width(), raster.height()), (200, 100));
}

#[test]
fn missing_footprint_writes_nothing() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let input = write_scene(dir.path());

    let result = georeference(&GeorefRequest::new(&input));
    assert!(matches!(result, Err(GeorefError::Io(_))));
    assert!(!dir.path().join("scene.tif").exists());
}

#[test]
fn explicit_paths_are_honoured() {
    let dir = tempfile::tempdir().expect("Should create temp dir");
    let input = write_scene(dir.path());
    let footprint = dir.path().join("footprint.wkt");
    fs::write(&footprint, "MULTIPOLYGON(((0 0, 10 0, 10 5, 0 0)))").expect("Should write");

    let request = GeorefRequest {
        input,
        footprint: Some(footprint),
        output: Some(dir.path().join("out").with_extension("png")),
    };
    let output = georeference(&request).expect("Should georeference");
    assert_eq!(output.world_file, dir.path().join("out.pgw"));
    let (dx, dy) = output.transform.pixel_size();
    assert!((dx - 0.05).abs() < 1e-9 && (dy + 0.05).abs() < 1e-9);
}
